//! Synthesizes a shorthand from a complete set of longhands.

use crate::context::OptimizeContext;
use crate::properties::compactable::{descriptor, is_component_of, shorthands_of};
use crate::properties::restore::restore_property;
use crate::properties::wrap::Property;
use crate::tree::css_tree::value_to_string;

/// Repeats until no further shorthand can be built, so `border-top-width`
/// and friends may end up as `border-width` and then as `border`.
pub fn compact_shorthands(properties: &mut Vec<Property>, context: &OptimizeContext) {
    while compact_once(properties, context) {}
}

fn compact_once(properties: &mut Vec<Property>, context: &OptimizeContext) -> bool {
    let mut candidates: Vec<&'static str> = Vec::new();
    for property in properties.iter().filter(|property| eligible(property)) {
        for shorthand in shorthands_of(&property.name) {
            if !candidates.contains(&shorthand) {
                candidates.push(shorthand);
            }
        }
    }

    for shorthand in candidates {
        if let Some((at, replacement, covered)) = synthesize(properties, shorthand, context) {
            log::trace!("built `{}` from {} declarations", shorthand, covered.len());
            for index in covered {
                properties[index].unused = true;
            }
            properties.insert(at + 1, replacement);
            return true;
        }
    }
    false
}

fn eligible(property: &Property) -> bool {
    property.is_live() && property.hack.is_none() && property.block.is_none() && !property.variable
}

/// The replacement, the index it goes after and the indices it covers.
fn synthesize(
    properties: &[Property],
    shorthand: &str,
    context: &OptimizeContext,
) -> Option<(usize, Property, Vec<usize>)> {
    let descriptor = descriptor(shorthand)?;
    let validator = &context.validator;

    let mut covered = Vec::with_capacity(descriptor.components.len());
    for name in &descriptor.components {
        let mut matching = properties
            .iter()
            .enumerate()
            .filter(|(_, property)| property.is_live() && &property.name == name);
        let (index, property) = matching.next()?;
        if matching.next().is_some() || !eligible(property) {
            return None;
        }
        if property.value.iter().any(|fragment| validator.is_variable(fragment)) {
            return None;
        }
        covered.push(index);
    }

    let first = *covered.iter().min()?;
    let last = *covered.iter().max()?;
    let important = properties[covered[0]].important;
    if covered.iter().any(|&index| properties[index].important != important) {
        return None;
    }

    let blocked = properties[first..=last].iter().enumerate().any(|(offset, property)| {
        property.is_live()
            && !covered.contains(&(first + offset))
            && descriptor
                .components
                .iter()
                .any(|name| related(&property.name, name) || related(&property.name, shorthand))
    });
    if blocked {
        return None;
    }

    if shorthand == "background" && !background_flags_allow(properties, &covered, context) {
        return None;
    }

    let mut replacement = Property::new(shorthand, Vec::new());
    replacement.important = important;
    replacement.shorthand = true;
    replacement.dirty = true;
    replacement.position = properties[last].position;
    replacement.origin = properties[last].origin;
    replacement.components = covered.iter().map(|&index| properties[index].clone()).collect();
    replacement.value = restore_property(&replacement, validator).ok()?;
    replacement.multiplex = replacement.value.iter().any(|fragment| fragment == ",");

    let original_len: usize = covered.iter().map(|&index| properties[index].serialized_len() + 1).sum();
    if replacement.serialized_len() + 1 > original_len {
        return None;
    }
    log::trace!("`{}` restored as `{}`", shorthand, value_to_string(&replacement.value));

    Some((last, replacement, covered))
}

fn related(left: &str, right: &str) -> bool {
    left == right || is_component_of(left, right) || is_component_of(right, left)
}

fn background_flags_allow(properties: &[Property], covered: &[usize], context: &OptimizeContext) -> bool {
    let flags = &context.profile().properties;
    covered.iter().all(|&index| {
        let property = &properties[index];
        let allowed = match property.name.as_str() {
            "background-clip" => flags.background_clip_merging,
            "background-origin" => flags.background_origin_merging,
            "background-size" => flags.background_size_merging,
            _ => true,
        };
        allowed
            || descriptor(&property.name)
                .and_then(|descriptor| descriptor.default_fragments())
                .is_some_and(|default| default == property.value)
    })
}

#[cfg(test)]
mod tests {
    use crate::context::OptimizeContext;
    use crate::options::Options;
    use crate::properties::optimizer::optimize_body;
    use crate::tokenizer::split::split_value;
    use crate::tree::css_tree::{body_to_string, Declaration};
    use pretty_assertions::assert_eq;

    fn optimize(text: &str) -> String {
        let body: Vec<Declaration> = text
            .split(';')
            .map(|declaration| {
                let (name, value) = declaration.split_once(':').unwrap();
                Declaration::new(name, split_value(value))
            })
            .collect();
        let options = Options::default();
        let profile = options.compatibility.resolve().unwrap();
        let context = OptimizeContext::new(&options, &profile);
        body_to_string(&optimize_body(&body, &[], &context))
    }

    #[test]
    fn test_four_sides() {
        assert_eq!(
            optimize("margin-top:1px;margin-right:2px;margin-bottom:1px;margin-left:2px"),
            "margin:1px 2px"
        );
        assert_eq!(
            optimize("color:red;padding-top:0;padding-right:0;padding-bottom:0;padding-left:0"),
            "color:red;padding:0"
        );
    }

    #[test]
    fn test_incomplete_or_mixed_sets_kept() {
        assert_eq!(
            optimize("margin-top:1px;margin-right:2px;margin-bottom:1px"),
            "margin-top:1px;margin-right:2px;margin-bottom:1px"
        );
        assert_eq!(
            optimize("margin-top:1px!important;margin-right:0;margin-bottom:0;margin-left:0"),
            "margin-top:1px!important;margin-right:0;margin-bottom:0;margin-left:0"
        );
    }

    #[test]
    fn test_nested_shorthands() {
        assert_eq!(
            optimize("list-style-type:square;list-style-position:inside;list-style-image:none"),
            "list-style:square inside"
        );
    }

    #[test]
    fn test_related_in_between_blocks() {
        assert_eq!(
            optimize("margin-top:0;margin-right:0;margin:var(--m);margin-bottom:0;margin-left:0"),
            "margin-top:0;margin-right:0;margin:var(--m);margin-bottom:0;margin-left:0"
        );
    }
}
