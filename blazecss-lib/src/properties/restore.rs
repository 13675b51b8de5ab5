//! Reassembles shorthand values from their components.

use crate::properties::can_override::layers;
use crate::properties::compactable::{descriptor, descriptor_or_opaque, BreakUpError, Compactable, Descriptor, Layout};
use crate::properties::validator::Validator;
use crate::properties::wrap::Property;

pub fn restore(
    layout: Layout,
    descriptor: &Descriptor,
    property: &Property,
    validator: &Validator,
) -> Result<Vec<String>, BreakUpError> {
    let fail = || BreakUpError::of(property);
    if property.components.len() != descriptor.components.len() {
        return Err(fail());
    }

    let globals = property
        .components
        .iter()
        .filter(|component| matches!(component.value.as_slice(), [only] if validator.is_global(only)))
        .count();
    if globals > 0 {
        let first = &property.components[0].value;
        let uniform = globals == property.components.len()
            && property.components.iter().all(|component| &component.value == first);
        return if uniform { Ok(first.clone()) } else { Err(fail()) };
    }

    match layout {
        Layout::FourValues => {
            let sides = single_values(property).ok_or_else(fail)?;
            Ok(collapse_four(&sides))
        }
        Layout::BorderRadius => border_radius(property).ok_or_else(fail),
        Layout::WidthStyleColor => {
            let values = single_values(property).ok_or_else(fail)?;
            let restored: Vec<String> = property
                .components
                .iter()
                .zip(values)
                .filter(|(component, value)| !is_default(&component.name, std::slice::from_ref(value)))
                .map(|(_, value)| value)
                .collect();
            Ok(if restored.is_empty() { descriptor.empty_value() } else { restored })
        }
        Layout::ListStyle => {
            let values = single_values(property).ok_or_else(fail)?;
            let mut restored = vec![values[0].clone()];
            restored.extend(
                property.components[1..]
                    .iter()
                    .zip(values[1..].iter())
                    .filter(|(component, value)| !is_default(&component.name, std::slice::from_ref(*value)))
                    .map(|(_, value)| value.clone()),
            );
            Ok(restored)
        }
        Layout::Background => multiplex(descriptor, property, background_layer).ok_or_else(fail),
        Layout::Transition | Layout::Animation => {
            multiplex(descriptor, property, timed_layer).ok_or_else(fail)
        }
    }
}

/// Restores a broken up property, rebuilding nested shorthands first.
pub fn restore_property(property: &Property, validator: &Validator) -> Result<Vec<String>, BreakUpError> {
    let Some(descriptor) = descriptor(&property.name) else {
        return Ok(property.value.clone());
    };
    if property.components.is_empty() {
        return Ok(property.value.clone());
    }
    let mut rebuilt = property.clone();
    for component in rebuilt.components.iter_mut() {
        if !component.components.is_empty() {
            component.value = restore_property(component, validator)?;
        }
    }
    descriptor.restore(&rebuilt, validator)
}

fn is_default(name: &str, value: &[String]) -> bool {
    descriptor_or_opaque(name)
        .default_fragments()
        .is_some_and(|default| default == value)
}

/// Component values that are exactly one fragment each.
fn single_values(property: &Property) -> Option<Vec<String>> {
    property
        .components
        .iter()
        .map(|component| match component.value.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        })
        .collect()
}

/// Shortest top/right/bottom/left form.
pub fn collapse_four(sides: &[String]) -> Vec<String> {
    match sides {
        [top, right, bottom, left] => {
            if top == right && right == bottom && bottom == left {
                vec![top.clone()]
            } else if top == bottom && right == left {
                vec![top.clone(), right.clone()]
            } else if right == left {
                vec![top.clone(), right.clone(), bottom.clone()]
            } else {
                sides.to_vec()
            }
        }
        _ => sides.to_vec(),
    }
}

fn border_radius(property: &Property) -> Option<Vec<String>> {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for component in &property.components {
        match component.value.as_slice() {
            [both] => {
                horizontal.push(both.clone());
                vertical.push(both.clone());
            }
            [h, v] => {
                horizontal.push(h.clone());
                vertical.push(v.clone());
            }
            _ => return None,
        }
    }
    let mut restored = collapse_four(&horizontal);
    let vertical = collapse_four(&vertical);
    if vertical != restored {
        restored.push("/".to_string());
        restored.extend(vertical);
    }
    Some(restored)
}

/// Restores each layer from the matching layer of every component.
fn multiplex<F>(descriptor: &Descriptor, property: &Property, restore_layer: F) -> Option<Vec<String>>
where
    F: Fn(&Descriptor, &[(&str, &[String])], bool) -> Option<Vec<String>>,
{
    let split: Vec<(&str, Vec<&[String]>)> = property
        .components
        .iter()
        .map(|component| (component.name.as_str(), layers(&component.value)))
        .collect();

    let count = split
        .iter()
        .filter(|(name, _)| descriptor_or_opaque(name).multiplex)
        .map(|(_, component_layers)| component_layers.len())
        .max()?;
    if split
        .iter()
        .any(|(name, component_layers)| descriptor_or_opaque(name).multiplex && component_layers.len() != count)
    {
        return None;
    }

    let mut restored = Vec::new();
    for index in 0..count {
        let last = index + 1 == count;
        let layer: Vec<(&str, &[String])> = split
            .iter()
            .map(|(name, component_layers)| {
                let value = if descriptor_or_opaque(name).multiplex {
                    component_layers[index]
                } else {
                    component_layers[0]
                };
                (*name, value)
            })
            .collect();
        if index > 0 {
            restored.push(",".to_string());
        }
        restored.extend(restore_layer(descriptor, &layer, last)?);
    }
    Some(restored)
}

fn background_layer(descriptor: &Descriptor, layer: &[(&str, &[String])], last: bool) -> Option<Vec<String>> {
    let [(_, image), (_, position), (_, size), (_, repeat), (_, attachment), (origin_name, origin), (clip_name, clip), (_, color)] =
        layer
    else {
        return None;
    };

    let mut restored: Vec<String> = Vec::new();
    if !is_default("background-image", image) {
        restored.extend(image.iter().cloned());
    }

    let size_is_default = is_default("background-size", size) || size.iter().all(|part| part == "auto");
    if !size_is_default {
        restored.extend(position.iter().cloned());
        restored.push("/".to_string());
        restored.extend(size.iter().cloned());
    } else if !is_default("background-position", position) {
        restored.extend(position.iter().cloned());
    }

    if !is_default("background-repeat", repeat) {
        restored.extend(repeat.iter().cloned());
    }
    if !is_default("background-attachment", attachment) {
        restored.extend(attachment.iter().cloned());
    }

    if origin == clip {
        restored.extend(origin.iter().cloned());
    } else if !is_default(origin_name, origin) || !is_default(clip_name, clip) {
        restored.extend(origin.iter().cloned());
        restored.extend(clip.iter().cloned());
    }

    if last && !is_default("background-color", color) {
        restored.extend(color.iter().cloned());
    }

    if restored.is_empty() {
        restored = descriptor.empty_value();
    }
    Some(restored)
}

/// Transition and animation layers: defaults dropped, but a delay keeps its
/// duration in front of it.
fn timed_layer(descriptor: &Descriptor, layer: &[(&str, &[String])], _last: bool) -> Option<Vec<String>> {
    let delay_set = layer
        .iter()
        .any(|(name, value)| name.ends_with("-delay") && !is_default(name, value));

    let mut restored = Vec::new();
    for (name, value) in layer {
        let keep = !is_default(name, value) || (delay_set && name.ends_with("-duration"));
        if keep {
            restored.extend(value.iter().cloned());
        }
    }
    if restored.is_empty() {
        restored = descriptor.empty_value();
    }
    Some(restored)
}
