//! Expands shorthand values into their components.

use crate::properties::can_override::layers;
use crate::properties::compactable::{descriptor_or_opaque, BreakUpError, Descriptor, Layout};
use crate::properties::validator::Validator;
use crate::properties::wrap::Property;

type Fragments = Vec<String>;

pub fn break_up(
    layout: Layout,
    descriptor: &Descriptor,
    property: &Property,
    validator: &Validator,
) -> Result<Vec<Property>, BreakUpError> {
    let fail = || BreakUpError::of(property);

    if property.value.is_empty() || property.value.iter().any(|fragment| validator.is_variable(fragment)) {
        return Err(fail());
    }

    if let [only] = property.value.as_slice() {
        if validator.is_global(only) {
            return Ok(descriptor
                .components
                .iter()
                .map(|name| Property::component_of(property, name, vec![only.clone()]))
                .collect());
        }
    }
    if property.value.iter().any(|fragment| validator.is_global(fragment)) {
        return Err(fail());
    }

    let values: Vec<Fragments> = match layout {
        Layout::FourValues => four_values(&property.value).ok_or_else(fail)?,
        Layout::BorderRadius => border_radius(&property.value).ok_or_else(fail)?,
        Layout::WidthStyleColor => width_style_color(descriptor, &property.value, validator).ok_or_else(fail)?,
        Layout::ListStyle => list_style(&property.value, validator).ok_or_else(fail)?,
        Layout::Background => multiplex(descriptor, &property.value, |layer, last| {
            background_layer(layer, last, validator)
        })
        .ok_or_else(fail)?,
        Layout::Transition => multiplex(descriptor, &property.value, |layer, _| {
            transition_layer(layer, validator)
        })
        .ok_or_else(fail)?,
        Layout::Animation => multiplex(descriptor, &property.value, |layer, _| {
            animation_layer(layer, validator)
        })
        .ok_or_else(fail)?,
    };

    Ok(descriptor
        .components
        .iter()
        .zip(values)
        .map(|(name, value)| Property::component_of(property, name, value))
        .collect())
}

/// Fills in each component's default where a layer left it unset.
fn defaults_for(descriptor: &Descriptor, slots: Vec<Option<Fragments>>) -> Vec<Fragments> {
    descriptor
        .components
        .iter()
        .zip(slots)
        .map(|(name, slot)| {
            slot.unwrap_or_else(|| {
                descriptor_or_opaque(name)
                    .default_fragments()
                    .unwrap_or_else(|| vec![list_style_type_default(name)])
            })
        })
        .collect()
}

fn list_style_type_default(name: &str) -> String {
    if name == "list-style-type" {
        "disc".to_string()
    } else {
        String::new()
    }
}

fn four_values(value: &[String]) -> Option<Vec<Fragments>> {
    if value.iter().any(|fragment| fragment == "," || fragment == "/") {
        return None;
    }
    expand_four(value).map(|sides| sides.into_iter().map(|side| vec![side]).collect())
}

/// `a b` becomes `a b a b`, and so on.
fn expand_four(value: &[String]) -> Option<Vec<String>> {
    let [top, right, bottom, left] = match value {
        [a] => [a, a, a, a],
        [a, b] => [a, b, a, b],
        [a, b, c] => [a, b, c, b],
        [a, b, c, d] => [a, b, c, d],
        _ => return None,
    };
    Some(vec![top.clone(), right.clone(), bottom.clone(), left.clone()])
}

fn border_radius(value: &[String]) -> Option<Vec<Fragments>> {
    if value.iter().any(|fragment| fragment == ",") {
        return None;
    }
    let mut halves = value.split(|fragment| fragment == "/");
    let horizontal = expand_four(halves.next()?)?;
    let vertical = match halves.next() {
        Some(half) => expand_four(half)?,
        None => horizontal.clone(),
    };
    if halves.next().is_some() {
        return None;
    }
    Some(
        horizontal
            .into_iter()
            .zip(vertical)
            .map(|(h, v)| if h == v { vec![h] } else { vec![h, v] })
            .collect(),
    )
}

fn width_style_color(descriptor: &Descriptor, value: &[String], validator: &Validator) -> Option<Vec<Fragments>> {
    if value.len() > 3 || value.iter().any(|fragment| fragment == "," || fragment == "/") {
        return None;
    }
    let (mut width, mut style, mut color) = (None, None, None);
    for fragment in value {
        if style.is_none() && validator.is_style_keyword(fragment) {
            style = Some(vec![fragment.clone()]);
        } else if width.is_none() && validator.is_width(fragment) {
            width = Some(vec![fragment.clone()]);
        } else if color.is_none() && validator.is_color(fragment) {
            color = Some(vec![fragment.clone()]);
        } else {
            return None;
        }
    }

    let slots = descriptor
        .components
        .iter()
        .map(|name| {
            if name.ends_with("-width") {
                width.clone()
            } else if name.ends_with("-style") {
                style.clone()
            } else {
                color.clone()
            }
        })
        .collect();
    Some(defaults_for(descriptor, slots))
}

fn list_style(value: &[String], validator: &Validator) -> Option<Vec<Fragments>> {
    if value.len() > 3 || value.iter().any(|fragment| fragment == "," || fragment == "/") {
        return None;
    }
    let (mut kind, mut position, mut image) = (None, None, None);
    let mut nones = 0;
    for fragment in value {
        if fragment.eq_ignore_ascii_case("none") {
            nones += 1;
        } else if image.is_none() && validator.is_image(fragment) {
            image = Some(fragment.clone());
        } else if position.is_none() && validator.is_list_style_position(fragment) {
            position = Some(fragment.clone());
        } else if kind.is_none() && validator.is_list_style_type(fragment) {
            kind = Some(fragment.clone());
        } else {
            return None;
        }
    }
    for _ in 0..nones {
        if kind.is_none() {
            kind = Some("none".to_string());
        } else if image.is_none() {
            image = Some("none".to_string());
        } else {
            return None;
        }
    }

    Some(vec![
        vec![kind.unwrap_or_else(|| "disc".to_string())],
        vec![position.unwrap_or_else(|| "outside".to_string())],
        vec![image.unwrap_or_else(|| "none".to_string())],
    ])
}

/// Breaks every comma separated layer and joins each component's layers back
/// with `,` fragments. Components missing from a layer get their default.
fn multiplex<F>(descriptor: &Descriptor, value: &[String], mut break_layer: F) -> Option<Vec<Fragments>>
where
    F: FnMut(&[String], bool) -> Option<Vec<Option<Fragments>>>,
{
    let all_layers = layers(value);
    let count = all_layers.len();
    let mut joined: Vec<Fragments> = vec![Vec::new(); descriptor.components.len()];

    for (index, layer) in all_layers.into_iter().enumerate() {
        if layer.is_empty() {
            return None;
        }
        let last = index + 1 == count;
        let values = defaults_for(descriptor, break_layer(layer, last)?);
        for (slot, (name, component_value)) in joined.iter_mut().zip(descriptor.components.iter().zip(values)) {
            if descriptor_or_opaque(name).multiplex {
                if !slot.is_empty() {
                    slot.push(",".to_string());
                }
                slot.extend(component_value);
            } else if last {
                *slot = component_value;
            }
        }
    }
    Some(joined)
}

/// Slots in component order: image, position, size, repeat, attachment,
/// origin, clip, color.
fn background_layer(layer: &[String], last: bool, validator: &Validator) -> Option<Vec<Option<Fragments>>> {
    let mut image = None;
    let mut position: Option<Fragments> = None;
    let mut size: Option<Fragments> = None;
    let mut repeat: Fragments = Vec::new();
    let mut attachment = None;
    let mut boxes: Fragments = Vec::new();
    let mut color = None;

    let mut index = layer.len();
    while index > 0 {
        index -= 1;
        let fragment = &layer[index];

        if validator.is_background_attachment(fragment) && attachment.is_none() {
            attachment = Some(vec![fragment.clone()]);
        } else if validator.is_background_repeat(fragment) && repeat.len() < 2 {
            repeat.insert(0, fragment.clone());
        } else if validator.is_background_box(fragment) && boxes.len() < 2 {
            boxes.insert(0, fragment.clone());
        } else if last && color.is_none() && validator.is_color(fragment) {
            color = Some(vec![fragment.clone()]);
        } else if image.is_none() && validator.is_image(fragment) {
            image = Some(vec![fragment.clone()]);
        } else if position.is_none() && is_position_or_size(fragment, validator) {
            let end = index + 1;
            let mut start = index;
            while start > 0 && (layer[start - 1] == "/" || is_position_or_size(&layer[start - 1], validator)) {
                start -= 1;
            }
            let run = &layer[start..end];
            let (position_part, size_part) = match run.iter().position(|fragment| fragment == "/") {
                Some(slash) => (&run[..slash], Some(&run[slash + 1..])),
                None => (run, None),
            };
            if position_part.is_empty()
                || position_part.len() > 4
                || position_part.iter().any(|part| !is_position(part, validator))
            {
                return None;
            }
            if let Some(size_part) = size_part {
                if size_part.is_empty()
                    || size_part.len() > 2
                    || size_part.iter().any(|part| part == "/" || !validator.is_background_size_part(part))
                {
                    return None;
                }
                size = Some(size_part.to_vec());
            }
            position = Some(position_part.to_vec());
            index = start;
        } else {
            return None;
        }
    }

    let (origin, clip) = match boxes.as_slice() {
        [] => (None, None),
        [both] => (Some(vec![both.clone()]), Some(vec![both.clone()])),
        [origin, clip] => (Some(vec![origin.clone()]), Some(vec![clip.clone()])),
        _ => return None,
    };
    let repeat = if repeat.is_empty() { None } else { Some(repeat) };

    Some(vec![image, position, size, repeat, attachment, origin, clip, color])
}

fn is_position(fragment: &str, validator: &Validator) -> bool {
    validator.is_background_position_part(fragment)
        && !["auto", "cover", "contain"]
            .iter()
            .any(|keyword| keyword.eq_ignore_ascii_case(fragment))
}

fn is_position_or_size(fragment: &str, validator: &Validator) -> bool {
    validator.is_background_position_part(fragment) || validator.is_background_size_part(fragment)
}

/// Slots: property, duration, timing function, delay.
fn transition_layer(layer: &[String], validator: &Validator) -> Option<Vec<Option<Fragments>>> {
    let mut times: Vec<String> = Vec::new();
    let (mut property, mut timing) = (None, None);
    for fragment in layer {
        if validator.is_time(fragment) && times.len() < 2 {
            times.push(fragment.clone());
        } else if timing.is_none() && validator.is_timing_function(fragment) {
            timing = Some(vec![fragment.clone()]);
        } else if property.is_none() && !validator.is_function(fragment) {
            property = Some(vec![fragment.clone()]);
        } else {
            return None;
        }
    }
    let mut times = times.into_iter().map(|time| vec![time]);
    Some(vec![property, times.next(), timing, times.next()])
}

/// Slots: name, duration, timing function, delay, iteration count,
/// direction, fill mode, play state.
fn animation_layer(layer: &[String], validator: &Validator) -> Option<Vec<Option<Fragments>>> {
    let mut times: Vec<String> = Vec::new();
    let (mut name, mut timing, mut count, mut direction, mut fill, mut state) = (None, None, None, None, None, None);
    for fragment in layer {
        let single = Some(vec![fragment.clone()]);
        if validator.is_time(fragment) && times.len() < 2 {
            times.push(fragment.clone());
        } else if timing.is_none() && validator.is_timing_function(fragment) {
            timing = single;
        } else if count.is_none() && validator.is_animation_iteration_count(fragment) {
            count = single;
        } else if direction.is_none() && validator.is_animation_direction(fragment) {
            direction = single;
        } else if state.is_none() && validator.is_animation_play_state(fragment) {
            state = single;
        } else if fill.is_none() && validator.is_animation_fill_mode(fragment) {
            fill = single;
        } else if name.is_none() && !validator.is_function(fragment) {
            name = single;
        } else {
            return None;
        }
    }
    let mut times = times.into_iter().map(|time| vec![time]);
    Some(vec![name, times.next(), timing, times.next(), count, direction, fill, state])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::CompatibilityProfile;
    use crate::properties::compactable::{descriptor, Compactable};
    use crate::tokenizer::split::split_value;
    use pretty_assertions::assert_eq;

    fn components(name: &str, value: &str) -> Result<Vec<(String, String)>, BreakUpError> {
        let profile = CompatibilityProfile::modern();
        let validator = Validator::new(&profile);
        let property = Property::new(name, split_value(value));
        let descriptor = descriptor(name).unwrap();
        Ok(descriptor
            .break_up(&property, &validator)?
            .into_iter()
            .map(|component| (component.name.clone(), component.value_string()))
            .collect())
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected.iter().map(|(n, v)| (n.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_four_values() {
        assert_eq!(
            components("margin", "1px 2px 3px").unwrap(),
            pairs(&[
                ("margin-top", "1px"),
                ("margin-right", "2px"),
                ("margin-bottom", "3px"),
                ("margin-left", "2px"),
            ])
        );
        assert!(components("margin", "1px 2px 3px 4px 5px").is_err());
        assert!(components("margin", "var(--gap)").is_err());
    }

    #[test]
    fn test_border_any_order() {
        assert_eq!(
            components("border", "red 1px").unwrap(),
            pairs(&[
                ("border-width", "1px"),
                ("border-style", "none"),
                ("border-color", "red"),
            ])
        );
        assert!(components("border", "1px solid red blue").is_err());
    }

    #[test]
    fn test_border_radius_halves() {
        assert_eq!(
            components("border-radius", "1px 2px/3px").unwrap(),
            pairs(&[
                ("border-top-left-radius", "1px 3px"),
                ("border-top-right-radius", "2px 3px"),
                ("border-bottom-right-radius", "1px 3px"),
                ("border-bottom-left-radius", "2px 3px"),
            ])
        );
    }

    #[test]
    fn test_background_layers() {
        let broken = components(
            "background",
            "url(a.png) no-repeat 0 0/10px,url(b.png) center fixed padding-box red",
        )
        .unwrap();
        assert_eq!(
            broken,
            pairs(&[
                ("background-image", "url(a.png),url(b.png)"),
                ("background-position", "0 0,center"),
                ("background-size", "10px,auto"),
                ("background-repeat", "no-repeat,repeat"),
                ("background-attachment", "scroll,fixed"),
                ("background-origin", "padding-box,padding-box"),
                ("background-clip", "border-box,padding-box"),
                ("background-color", "red"),
            ])
        );
        assert!(components("background", "red url(a.png),url(b.png)").is_err());
        assert!(components("background", "url(a.png) wobble").is_err());
    }

    #[test]
    fn test_list_style_none() {
        assert_eq!(
            components("list-style", "none inside").unwrap(),
            pairs(&[
                ("list-style-type", "none"),
                ("list-style-position", "inside"),
                ("list-style-image", "none"),
            ])
        );
    }

    #[test]
    fn test_inherit_spreads() {
        let broken = components("outline", "inherit").unwrap();
        assert!(broken.iter().all(|(_, value)| value == "inherit"));
    }

    #[test]
    fn test_transition() {
        assert_eq!(
            components("transition", "opacity .3s ease-in 1s").unwrap(),
            pairs(&[
                ("transition-property", "opacity"),
                ("transition-duration", ".3s"),
                ("transition-timing-function", "ease-in"),
                ("transition-delay", "1s"),
            ])
        );
    }
}
