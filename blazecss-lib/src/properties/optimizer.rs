//! Runs the shorthand algebra over one declaration body.

use crate::context::OptimizeContext;
use crate::properties::compactable::{descriptor, descriptor_or_opaque, Compactable};
use crate::properties::override_compactor::compact_overrides;
use crate::properties::restore::restore_property;
use crate::properties::shorthand_compactor::compact_shorthands;
use crate::properties::validator::Validator;
use crate::properties::wrap::{unwrap, wrap, Property};
use crate::tree::css_tree::{value_to_string, Declaration};

/// Optimizes a single body. `joins` lists positions where a second body was
/// appended, so that same-name neighbours across the seam may merge.
pub fn optimize_body(body: &[Declaration], joins: &[usize], context: &OptimizeContext) -> Vec<Declaration> {
    let mut properties = wrap(body, 0);
    optimize_properties(&mut properties, joins, true, context);
    unwrap(&properties)
}

/// `compact` allows moving declarations into shorthands; leave it off when
/// the properties come from several rules.
pub fn optimize_properties(
    properties: &mut Vec<Property>,
    joins: &[usize],
    compact: bool,
    context: &OptimizeContext,
) {
    let validator = &context.validator;
    populate_components(properties, validator);
    remove_duplicates(properties, joins, context.options.aggressive_merging, validator);

    if compact && context.options.shorthand_compacting {
        compact_overrides(properties, context);
        compact_shorthands(properties, context);
    }

    restore_shorthands(properties, validator);

    for property in properties.iter_mut() {
        if property.is_live() {
            if let Some(block) = property.block.take() {
                property.block = Some(optimize_body(&block, &[], context));
            }
        }
    }
}

/// Breaks up every understood shorthand. A value the algebra cannot read
/// leaves the property opaque.
pub fn populate_components(properties: &mut [Property], validator: &Validator) {
    for property in properties.iter_mut() {
        if property.is_live() {
            populate(property, validator);
        }
    }
}

fn populate(property: &mut Property, validator: &Validator) {
    property.multiplex = property.value.iter().any(|fragment| fragment == ",");
    if property.variable || property.block.is_some() {
        return;
    }
    let Some(descriptor) = descriptor(&property.name) else {
        return;
    };
    if !descriptor.is_shorthand() {
        return;
    }

    match descriptor.break_up(property, validator) {
        Ok(mut components) => {
            for component in components.iter_mut() {
                populate(component, validator);
            }
            property.components = components;
            property.shorthand = true;
        }
        Err(err) => {
            log::trace!("{}", err);
            property.components.clear();
            property.shorthand = false;
        }
    }
}

/// Whether `right` may replace `left`, comparing broken up shorthands
/// component by component.
pub fn can_override_property(left: &Property, right: &Property, validator: &Validator) -> bool {
    if left.name != right.name {
        return false;
    }
    if left.shorthand && right.shorthand && left.components.len() == right.components.len() {
        return left
            .components
            .iter()
            .zip(&right.components)
            .all(|(left, right)| can_override_property(left, right, validator));
    }
    descriptor_or_opaque(&right.name).can_override(&left.value, &right.value, validator)
}

fn same_declaration(left: &Property, right: &Property) -> bool {
    left.name == right.name
        && left.important == right.important
        && left.hack == right.hack
        && left.value == right.value
        && left.block == right.block
}

/// Drops same-name duplicates. Two different values written next to each
/// other are kept as a fallback pair unless they sit on a join.
fn remove_duplicates(properties: &mut [Property], joins: &[usize], aggressive: bool, validator: &Validator) {
    'restart: loop {
        let mut seen: Vec<(String, Vec<usize>)> = Vec::new();
        let mut last: Option<usize> = None;

        for position in 0..properties.len() {
            if properties[position].unused {
                continue;
            }
            let name = properties[position].name.clone();

            if let Some(previous) = last {
                if same_declaration(&properties[previous], &properties[position]) {
                    properties[position].unused = true;
                    continue;
                }
            }

            let last_name = last.map(|previous| properties[previous].name.as_str());
            let mergeable = joins.contains(&position) || (aggressive && last_name != Some(name.as_str()));
            let earlier = seen.iter().find(|(seen_name, _)| *seen_name == name).map(|(_, at)| at.clone());

            match earlier {
                Some(earlier) if mergeable => {
                    if override_one(properties, &earlier, position, validator) {
                        log::trace!("dropped an overridden `{}`", name);
                        continue 'restart;
                    }
                }
                _ => {
                    match seen.iter_mut().find(|(seen_name, _)| *seen_name == name) {
                        Some((_, at)) => at.push(position),
                        None => seen.push((name, vec![position])),
                    }
                    last = Some(position);
                }
            }
        }
        break;
    }
}

/// Tries `properties[position]` against earlier same-name entries, latest
/// first. Returns whether something was dropped.
fn override_one(properties: &mut [Property], earlier: &[usize], position: usize, validator: &Validator) -> bool {
    for &candidate in earlier.iter().rev() {
        let (left, right) = (&properties[candidate], &properties[position]);
        if left.unused {
            continue;
        }
        // Only a plain declaration, at least as important, hides a differently hacked one.
        if left.hack != right.hack && (right.hack.is_some() || (left.important && !right.important)) {
            continue;
        }
        if left.hack.is_none()
            && right.hack.is_none()
            && left.important == right.important
            && !can_override_property(left, right, validator)
        {
            continue;
        }

        if left.important && !right.important {
            properties[position].unused = true;
        } else {
            properties[candidate].unused = true;
        }
        return true;
    }
    false
}

/// Writes back every broken up shorthand whose value changed, or whose
/// restored form is not longer than the original.
fn restore_shorthands(properties: &mut [Property], validator: &Validator) {
    for property in properties.iter_mut() {
        if !property.is_live() || !property.shorthand {
            continue;
        }
        match restore_property(property, validator) {
            Ok(restored) => {
                if property.dirty || value_to_string(&restored).len() <= property.value_string().len() {
                    property.value = restored;
                }
            }
            Err(err) => log::trace!("kept `{}` as written: {}", property.name, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::CompatibilityProfile;
    use crate::options::Options;
    use crate::tokenizer::split::split_value;
    use crate::tree::css_tree::body_to_string;
    use pretty_assertions::assert_eq;

    fn body(text: &str) -> Vec<Declaration> {
        text.split(';')
            .filter(|declaration| !declaration.is_empty())
            .map(|declaration| {
                let (name, value) = declaration.split_once(':').unwrap();
                Declaration::new(name, split_value(value))
            })
            .collect()
    }

    fn optimize_with(options: &Options, text: &str) -> String {
        let profile = options.compatibility.resolve().unwrap();
        let context = OptimizeContext::new(options, &profile);
        body_to_string(&optimize_body(&body(text), &[], &context))
    }

    fn optimize(text: &str) -> String {
        optimize_with(&Options::default(), text)
    }

    #[test]
    fn test_same_value_duplicates() {
        assert_eq!(optimize("color:red;color:red"), "color:red");
        assert_eq!(optimize("color:red;display:block;color:red"), "display:block;color:red");
    }

    #[test]
    fn test_adjacent_fallbacks_kept() {
        assert_eq!(
            optimize("display:inline-block;display:-moz-inline-box"),
            "display:inline-block;display:-moz-inline-box"
        );
        assert_eq!(optimize("color:red;color:rgba(0,0,0,.5)"), "color:red;color:rgba(0,0,0,.5)");
    }

    #[test]
    fn test_aggressive_override() {
        assert_eq!(optimize("color:red;display:block;color:blue"), "display:block;color:blue");
        let options = Options {
            aggressive_merging: false,
            ..Options::default()
        };
        assert_eq!(
            optimize_with(&options, "color:red;display:block;color:blue"),
            "color:red;display:block;color:blue"
        );
    }

    #[test]
    fn test_important_wins() {
        assert_eq!(optimize("color:red!important;display:block;color:blue"), "color:red!important;display:block");
    }

    #[test]
    fn test_plain_value_hides_hacked_one() {
        let profile = CompatibilityProfile::modern();
        let options = Options::default();
        let context = OptimizeContext::new(&options, &profile);
        let merged = optimize_body(&body("color:red\\9;color:blue"), &[1], &context);
        assert_eq!(body_to_string(&merged), "color:blue");

        let merged = optimize_body(&body("color:blue;color:red\\9"), &[1], &context);
        assert_eq!(body_to_string(&merged), "color:blue;color:red\\9");

        let merged = optimize_body(&body("color:red\\9!important;color:blue"), &[1], &context);
        assert_eq!(body_to_string(&merged), "color:red\\9!important;color:blue");
    }

    #[test]
    fn test_join_lifts_fallback_rule() {
        let profile = CompatibilityProfile::modern();
        let options = Options::default();
        let context = OptimizeContext::new(&options, &profile);
        let merged = optimize_body(&body("width:1px;width:2px"), &[1], &context);
        assert_eq!(body_to_string(&merged), "width:2px");
    }

    #[test]
    fn test_shorthand_normalized() {
        assert_eq!(optimize("margin:1px 1px 1px 1px"), "margin:1px");
        assert_eq!(optimize("border:medium none red"), "border:red");
        assert_eq!(optimize("background:url(a.png) repeat 0 0"), "background:url(a.png)");
    }

    #[test]
    fn test_unreadable_shorthand_untouched() {
        assert_eq!(optimize("margin:1px 2px 3px 4px 5px"), "margin:1px 2px 3px 4px 5px");
        assert_eq!(optimize("margin:var(--m) 1px"), "margin:var(--m) 1px");
    }
}
