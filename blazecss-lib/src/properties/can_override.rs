//! Whether a later value can replace an earlier one without losing a fallback.

use crate::properties::compactable::{KeywordSet, OverrideRule};
use crate::properties::validator::{vendor_prefix, Validator};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z\-]*$").expect("valid identifier pattern"));

/// Tests every layer of `left` against every layer of `right`.
pub fn every_combination(rule: OverrideRule, left: &[String], right: &[String], validator: &Validator) -> bool {
    if left == right {
        return true;
    }
    let left_layers = layers(left);
    let right_layers = layers(right);
    left_layers.iter().all(|left_layer| {
        right_layers
            .iter()
            .all(|right_layer| can_override(rule, left_layer, right_layer, validator))
    })
}

/// Splits a value on its `,` fragments.
pub fn layers(value: &[String]) -> Vec<&[String]> {
    value.split(|fragment| fragment == ",").collect()
}

pub fn can_override(rule: OverrideRule, left: &[String], right: &[String], validator: &Validator) -> bool {
    if left == right {
        return true;
    }
    match rule {
        OverrideRule::Always => true,
        OverrideRule::SameValue | OverrideRule::Components => false,
        OverrideRule::Color => single(left, right).is_some_and(|(l, r)| color(l, r, validator)),
        OverrideRule::Unit => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(l, r)| unit(l, r, validator))
        }
        OverrideRule::Time => right.iter().all(|r| validator.is_time(r)),
        OverrideRule::Image => single(left, right).is_some_and(|(l, r)| image(l, r, validator)),
        OverrideRule::BackgroundPosition => right.iter().all(|r| {
            validator.is_background_position_part(r) && !validator.is_variable(r)
        }),
        OverrideRule::BackgroundSize => right.iter().all(|r| {
            validator.is_background_size_part(r) && !validator.is_variable(r)
        }),
        OverrideRule::Keyword(set) => single(left, right).is_some_and(|(_, r)| keyword(set, r, validator)),
        OverrideRule::Identifier => single(left, right).is_some_and(|(l, r)| {
            IDENTIFIER.is_match(l) && IDENTIFIER.is_match(r) && vendor_prefix(l).is_none() && vendor_prefix(r).is_none()
        }),
    }
}

fn single<'v>(left: &'v [String], right: &'v [String]) -> Option<(&'v str, &'v str)> {
    match (left, right) {
        ([l], [r]) => Some((l.as_str(), r.as_str())),
        _ => None,
    }
}

fn color(left: &str, right: &str, validator: &Validator) -> bool {
    if validator.is_variable(left) || validator.is_variable(right) {
        return false;
    }
    let opacity = validator.profile().colors.opacity;
    if !opacity && (validator.is_rgba_or_hsla(left) || validator.is_rgba_or_hsla(right)) {
        return false;
    }
    if validator.is_named_color(right) || validator.is_hex_color(right) {
        return true;
    }
    if validator.is_named_color(left) || validator.is_hex_color(left) {
        return false;
    }
    validator.is_color_function(right) && validator.are_same_function(left, right)
}

fn unit(left: &str, right: &str, validator: &Validator) -> bool {
    if left == right {
        return true;
    }
    if validator.is_variable(left) || validator.is_variable(right) {
        return false;
    }
    if validator.is_unit_without_function(right) {
        return true;
    }
    if validator.is_unit_without_function(left) {
        return false;
    }
    if validator.is_function(left)
        && validator.is_function(right)
        && !validator.is_vendor_function(left)
        && !validator.is_vendor_function(right)
    {
        return true;
    }
    validator.are_same_function(left, right)
}

fn image(left: &str, right: &str, validator: &Validator) -> bool {
    if validator.is_url(right) || right.eq_ignore_ascii_case("none") || validator.is_global(right) {
        return true;
    }
    if validator.is_vendor_function(right) || !validator.is_gradient(right) {
        return false;
    }
    validator.is_gradient(left) && validator.are_same_function(left, right)
}

fn keyword(set: KeywordSet, right: &str, validator: &Validator) -> bool {
    match set {
        KeywordSet::Attachment => validator.is_background_attachment(right),
        KeywordSet::Repeat => validator.is_background_repeat(right),
        KeywordSet::BoxModel => validator.is_background_box(right),
        KeywordSet::Style => validator.is_style_keyword(right),
        KeywordSet::ListStyleType => validator.is_list_style_type(right),
        KeywordSet::ListStylePosition => validator.is_list_style_position(right),
        KeywordSet::Timing => validator.is_timing_function(right),
        KeywordSet::IterationCount => validator.is_animation_iteration_count(right),
        KeywordSet::Direction => validator.is_animation_direction(right),
        KeywordSet::FillMode => validator.is_animation_fill_mode(right),
        KeywordSet::PlayState => validator.is_animation_play_state(right),
    }
}
