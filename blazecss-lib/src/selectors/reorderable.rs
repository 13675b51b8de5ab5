//! Whether two sets of declarations may swap places without changing the cascade.

use crate::selectors::extractor::ExtractedProperty;
use crate::tree::css_tree::Selector;
use once_cell::sync::Lazy;
use regex::Regex;

static FLEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"align-items|box-align|box-pack|flex|justify").expect("valid flex pattern"));
static BORDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^border-(top|right|bottom|left|color|style|width|radius)").expect("valid border pattern")
});
static PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-(?:moz|webkit|ms|o)-").expect("valid prefix pattern"));

/// Every pair across the two sets must be reorderable.
pub fn can_reorder(left: &[ExtractedProperty], right: &[ExtractedProperty]) -> bool {
    right
        .iter()
        .rev()
        .all(|right| left.iter().rev().all(|left| can_reorder_single(left, right)))
}

pub fn can_reorder_single(left: &ExtractedProperty, right: &ExtractedProperty) -> bool {
    let (left_name, right_name) = (left.name.as_str(), right.name.as_str());
    let (left_root, right_root) = (left.root.as_str(), right.root.as_str());

    if (left_name == "font" && right_name == "line-height") || (right_name == "font" && left_name == "line-height") {
        return false;
    }
    if FLEX.is_match(left_name) && FLEX.is_match(right_name) {
        return false;
    }
    if left_root == right_root
        && unprefixed(left_name) == unprefixed(right_name)
        && (is_prefixed(left_name) != is_prefixed(right_name))
    {
        return false;
    }
    if left_root == "border"
        && BORDER.is_match(right_root)
        && (left_name == "border"
            || left_name == right_root
            || (left.value != right.value && same_border_component(left_name, right_name)))
    {
        return false;
    }
    if right_root == "border"
        && BORDER.is_match(left_root)
        && (right_name == "border"
            || right_name == left_root
            || (left.value != right.value && same_border_component(left_name, right_name)))
    {
        return false;
    }
    if left_root == "border"
        && right_root == "border"
        && left_name != right_name
        && ((is_side_border(left_name) && is_style_border(right_name))
            || (is_style_border(left_name) && is_side_border(right_name)))
    {
        return false;
    }
    if left_root != right_root {
        return true;
    }
    if left_name == right_name && (left.value == right.value || with_different_prefix(&left.value, &right.value)) {
        return true;
    }
    if left_name != right_name && left_name != left_root && right_name != right_root {
        return true;
    }
    if left_name != right_name && left.value == right.value {
        return true;
    }
    if left.in_simple_selector
        && right.in_simple_selector
        && !inheritable(left_root)
        && !inheritable(right_root)
        && selectors_do_not_overlap(&left.selectors, &right.selectors)
    {
        return true;
    }
    false
}

fn is_prefixed(name: &str) -> bool {
    PREFIX.is_match(name)
}

fn unprefixed(name: &str) -> std::borrow::Cow<'_, str> {
    PREFIX.replace(name, "")
}

fn same_border_component(left: &str, right: &str) -> bool {
    left.rsplit('-').next() == right.rsplit('-').next()
}

fn is_side_border(name: &str) -> bool {
    matches!(name, "border-top" | "border-right" | "border-bottom" | "border-left")
}

fn is_style_border(name: &str) -> bool {
    matches!(name, "border-color" | "border-style" | "border-width")
}

fn with_different_prefix(left: &str, right: &str) -> bool {
    match (PREFIX.find(left), PREFIX.find(right)) {
        (Some(left), Some(right)) => left.as_str() != right.as_str(),
        _ => false,
    }
}

fn inheritable(root: &str) -> bool {
    matches!(root, "font" | "line-height" | "list-style")
}

fn selectors_do_not_overlap(left: &[Selector], right: &[Selector]) -> bool {
    left.iter().all(|selector| !right.contains(selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::extractor::find_name_root;

    fn property(name: &str, value: &str, selector: &str) -> ExtractedProperty {
        ExtractedProperty {
            name: name.to_string(),
            value: value.to_string(),
            root: find_name_root(name),
            selectors: vec![Selector::new(selector)],
            in_simple_selector: !selector.contains(['.', '#', ' ', ':', '>', '+', '~', '[']),
        }
    }

    #[test]
    fn test_unrelated_properties_reorder() {
        assert!(can_reorder_single(&property("color", "red", ".a"), &property("margin", "0", ".b")));
    }

    #[test]
    fn test_interacting_properties() {
        assert!(!can_reorder_single(&property("font", "12px serif", ".a"), &property("line-height", "1", ".b")));
        assert!(!can_reorder_single(&property("flex-grow", "1", ".a"), &property("flex", "1", ".b")));
        assert!(!can_reorder_single(
            &property("-webkit-transition", "none", ".a"),
            &property("transition", "none", ".b")
        ));
        assert!(!can_reorder_single(&property("border", "0", ".a"), &property("border-top-color", "red", ".b")));
        assert!(!can_reorder_single(&property("border-top", "0", ".a"), &property("border-color", "red", ".b")));
    }

    #[test]
    fn test_same_root() {
        assert!(can_reorder_single(&property("margin-top", "0", ".a"), &property("margin-left", "1px", ".b")));
        assert!(!can_reorder_single(&property("margin", "0", ".a"), &property("margin-top", "1px", ".b")));
        assert!(can_reorder_single(&property("margin", "0", ".a"), &property("margin-top", "0", ".b")));
        assert!(!can_reorder_single(&property("color", "red", ".a"), &property("color", "blue", ".b")));
    }

    #[test]
    fn test_disjoint_type_selectors() {
        assert!(can_reorder_single(&property("margin", "0", "div"), &property("margin", "1px", "p")));
        assert!(!can_reorder_single(&property("margin", "0", "div"), &property("margin", "1px", "div")));
        assert!(!can_reorder_single(&property("font", "a", "div"), &property("font", "b", "p")));
    }
}
