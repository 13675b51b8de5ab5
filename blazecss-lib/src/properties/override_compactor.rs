//! Folds declarations into earlier or later related shorthands.

use crate::context::OptimizeContext;
use crate::properties::can_override::layers;
use crate::properties::compactable::{descriptor_or_opaque, is_component_of, Compactable};
use crate::properties::optimizer::can_override_property;
use crate::properties::restore::restore_property;
use crate::properties::validator::Validator;
use crate::properties::wrap::Property;
use crate::tree::css_tree::value_to_string;

/// Scans pairs back to front. `right` always comes later in the body than `left`.
pub fn compact_overrides(properties: &mut [Property], context: &OptimizeContext) {
    let validator = &context.validator;
    let merging = context.profile().properties.merging;

    for i in (0..properties.len()).rev() {
        for j in (0..i).rev() {
            if !comparable(&properties[j]) || !comparable(&properties[i]) {
                continue;
            }
            if properties[j].hack != properties[i].hack {
                continue;
            }
            if has_global(&properties[i], validator) && !properties[i].shorthand {
                continue;
            }

            let left_name = properties[j].name.clone();
            let right_name = properties[i].name.clone();
            if left_name == right_name {
                continue;
            }
            let moves_right = properties[j].shorthand && is_component_of(&left_name, &right_name);
            if moves_right && blocked_between(properties, j, i) {
                continue;
            }

            let (head, tail) = properties.split_at_mut(i);
            let left = &mut head[j];
            let right = &mut tail[0];

            if right.shorthand && right.find_component(&left_name).is_some() {
                absorb_into_later(left, right, validator);
            } else if right.shorthand && left.shorthand && covers(right, left) {
                absorb_into_later(left, right, validator);
            } else if moves_right && !right.shorthand {
                merge_longhand(left, right, merging, context);
            } else if moves_right && right.shorthand {
                merge_shorthand(left, right, validator);
            }
        }
    }
}

fn comparable(property: &Property) -> bool {
    property.is_live() && !property.variable && property.block.is_none()
}

fn has_global(property: &Property, validator: &Validator) -> bool {
    property.value.iter().any(|fragment| validator.is_global(fragment))
}

fn has_function(property: &Property, validator: &Validator) -> bool {
    property.value.iter().any(|fragment| validator.is_function(fragment))
}

fn related(left: &str, right: &str) -> bool {
    left == right || is_component_of(left, right) || is_component_of(right, left)
}

/// Any live declaration between the pair that touches the right-hand one.
fn blocked_between(properties: &[Property], j: usize, i: usize) -> bool {
    let right = &properties[i].name;
    properties[j + 1..i]
        .iter()
        .any(|between| between.is_live() && related(&between.name, right))
}

/// Every component of `left`, deep or direct, is carried by `right`.
fn covers(right: &Property, left: &Property) -> bool {
    !left.components.is_empty()
        && left
            .components
            .iter()
            .all(|component| right.find_component(&component.name).is_some())
}

/// `left` is hidden by the later shorthand `right`.
fn absorb_into_later(left: &mut Property, right: &Property, validator: &Validator) {
    if left.important && !right.important {
        return;
    }
    if has_function(right, validator) && !has_function(left, validator) {
        return;
    }

    let overridden: Vec<&Property> = if left.shorthand && right.find_component(&left.name).is_none() {
        left.components.iter().collect()
    } else {
        vec![&*left]
    };
    let hidden = overridden.iter().all(|component| {
        right
            .find_component(&component.name)
            .is_some_and(|overriding| can_override_property(component, overriding, validator))
    });
    if hidden {
        log::trace!("`{}` hidden by `{}`", left.name, right.name);
        left.unused = true;
    }
}

/// Pulls the later longhand `right` into the earlier shorthand `left`.
fn merge_longhand(left: &mut Property, right: &mut Property, merging: bool, context: &OptimizeContext) {
    let validator = &context.validator;
    if right.important && !left.important {
        return;
    }
    if left.important && !right.important {
        right.unused = true;
        return;
    }
    if has_global(right, validator) || has_global(left, validator) {
        return;
    }
    if descriptor_or_opaque(&right.name)
        .non_mergeable_value
        .is_some_and(|value| matches!(right.value.as_slice(), [only] if only == value))
    {
        return;
    }
    if !background_merging_allowed(&right.name, context) {
        return;
    }
    if !merging && would_break_compatibility(left, validator) {
        return;
    }

    let Some(component) = left.find_component(&right.name) else {
        return;
    };
    let Some(value) = layered_value(component, right, validator) else {
        return;
    };

    let mut candidate = left.clone();
    if let Some(component) = find_component_mut(&mut candidate, &right.name) {
        component.value = value;
    }
    let Ok(restored) = restore_property(&candidate, validator) else {
        return;
    };
    if value_to_string(&restored).len() + left.name.len() + 1 > left.serialized_len() + right.serialized_len() + 1 {
        return;
    }

    log::trace!("merged `{}` into `{}`", right.name, left.name);
    candidate.value = restored;
    candidate.dirty = true;
    *left = candidate;
    right.unused = true;
}

/// Value `component` takes when `right` overrides it. A single-layer value
/// is copied into every layer of a multiplex component.
fn layered_value(component: &Property, right: &Property, validator: &Validator) -> Option<Vec<String>> {
    let left_layers = layers(&component.value);
    let right_layers = layers(&right.value);
    if left_layers.len() == right_layers.len() {
        return can_override_property(component, right, validator).then(|| right.value.clone());
    }

    let descriptor = descriptor_or_opaque(&right.name);
    if right_layers.len() != 1 || !descriptor.multiplex {
        return None;
    }
    if !left_layers
        .iter()
        .all(|layer| descriptor.can_override(layer, &right.value, validator))
    {
        return None;
    }

    let mut value = Vec::with_capacity(left_layers.len() * (right.value.len() + 1));
    for idx in 0..left_layers.len() {
        if idx > 0 {
            value.push(",".to_string());
        }
        value.extend(right.value.iter().cloned());
    }
    Some(value)
}

/// Pulls a later nested shorthand, `border-width` after `border`, into `left`.
fn merge_shorthand(left: &mut Property, right: &mut Property, validator: &Validator) {
    if right.important && !left.important {
        return;
    }
    let Some(component) = left.find_component(&right.name) else {
        return;
    };
    if !can_override_property(component, right, validator) {
        return;
    }
    if left.important && !right.important {
        right.unused = true;
        return;
    }
    let Ok(right_restored) = restore_property(right, validator) else {
        return;
    };
    if right_restored.len() > 1 {
        return;
    }

    let mut candidate = left.clone();
    if let Some(component) = find_component_mut(&mut candidate, &right.name) {
        component.value = right.value.clone();
        component.components = right.components.clone();
    }
    let Ok(restored) = restore_property(&candidate, validator) else {
        return;
    };

    log::trace!("merged `{}` into `{}`", right.name, left.name);
    candidate.value = restored;
    candidate.dirty = true;
    *left = candidate;
    right.unused = true;
}

fn find_component_mut<'p>(property: &'p mut Property, name: &str) -> Option<&'p mut Property> {
    for component in property.components.iter_mut() {
        if component.name == name {
            return Some(component);
        }
        if let Some(found) = find_component_mut(component, name) {
            return Some(found);
        }
    }
    None
}

fn background_merging_allowed(name: &str, context: &OptimizeContext) -> bool {
    let flags = &context.profile().properties;
    match name {
        "background-clip" => flags.background_clip_merging,
        "background-origin" => flags.background_origin_merging,
        "background-size" => flags.background_size_merging,
        _ => true,
    }
}

/// Whether some component value could not stand in for its own default in
/// browsers the profile targets.
fn would_break_compatibility(property: &Property, validator: &Validator) -> bool {
    property.components.iter().any(|component| {
        let descriptor = descriptor_or_opaque(&component.name);
        match descriptor.default_fragments() {
            Some(default) => !descriptor.can_override(&default, &component.value, validator),
            None => false,
        }
    })
}
