//! Value predicates used by every optimizer pass.
//!
//! All checks are total: malformed input answers `false`.

use crate::compatibility::CompatibilityProfile;
use crate::properties::colors;
use crate::text::escape_store::{EscapeHandle, EscapeKind};
use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[A-Za-z][\w\-]*\(.*\)$").expect("valid function pattern"));
static VENDOR_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-(?:webkit|moz|ms|o)-[\w\-]*\(.*\)$").expect("valid vendor function pattern")
});
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?([a-zA-Z%]*)$").expect("valid unit pattern")
});
static MATH_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:calc|min|max|clamp)\(.*\)$").expect("valid math function pattern"));
static TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)m?s$").expect("valid time pattern"));

const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert"];
const ATTACHMENTS: &[&str] = &["scroll", "fixed", "local"];
const REPEATS: &[&str] = &["repeat", "no-repeat", "repeat-x", "repeat-y", "space", "round"];
const BOXES: &[&str] = &["border-box", "padding-box", "content-box"];
const POSITION_KEYWORDS: &[&str] = &["left", "right", "top", "bottom", "center"];
const SIZE_KEYWORDS: &[&str] = &["auto", "cover", "contain"];
const STYLES: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
    "auto",
];
const WIDTHS: &[&str] = &["thin", "medium", "thick"];
const LIST_STYLE_TYPES: &[&str] = &[
    "armenian",
    "circle",
    "cjk-ideographic",
    "decimal",
    "decimal-leading-zero",
    "disc",
    "georgian",
    "hebrew",
    "hiragana",
    "hiragana-iroha",
    "katakana",
    "katakana-iroha",
    "lower-alpha",
    "lower-greek",
    "lower-latin",
    "lower-roman",
    "none",
    "square",
    "upper-alpha",
    "upper-latin",
    "upper-roman",
];
const LIST_STYLE_POSITIONS: &[&str] = &["inside", "outside"];
const TIMING_FUNCTIONS: &[&str] = &[
    "ease",
    "ease-in",
    "ease-out",
    "ease-in-out",
    "linear",
    "step-start",
    "step-end",
];
const ANIMATION_DIRECTIONS: &[&str] = &["normal", "reverse", "alternate", "alternate-reverse"];
const ANIMATION_FILL_MODES: &[&str] = &["none", "forwards", "backwards", "both"];
const ANIMATION_PLAY_STATES: &[&str] = &["running", "paused"];

/// Units that are never lengths but still numbers with a suffix.
const OTHER_UNITS: &[&str] = &["deg", "rad", "grad", "turn", "s", "ms", "dpi", "dppx", "fr"];

/// Predicate set bound to one compatibility profile.
pub struct Validator<'a> {
    profile: &'a CompatibilityProfile,
    units: Vec<&'static str>,
}

impl<'a> Validator<'a> {
    pub fn new(profile: &'a CompatibilityProfile) -> Self {
        Validator {
            profile,
            units: profile.allowed_units(),
        }
    }

    pub fn profile(&self) -> &CompatibilityProfile {
        self.profile
    }

    pub fn is_global(&self, value: &str) -> bool {
        contains_keyword(GLOBAL_KEYWORDS, value)
    }

    pub fn is_hex_color(&self, value: &str) -> bool {
        colors::is_hex(value)
    }

    pub fn is_named_color(&self, value: &str) -> bool {
        colors::is_named(value)
            || value.eq_ignore_ascii_case("transparent")
            || value.eq_ignore_ascii_case("currentcolor")
    }

    pub fn is_rgba_or_hsla(&self, value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        (lower.starts_with("rgba(") || lower.starts_with("hsla(")) && lower.ends_with(')')
    }

    pub fn is_color_function(&self, value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        ["rgb(", "rgba(", "hsl(", "hsla("]
            .iter()
            .any(|prefix| lower.starts_with(prefix))
            && lower.ends_with(')')
    }

    pub fn is_color(&self, value: &str) -> bool {
        self.is_hex_color(value) || self.is_named_color(value) || self.is_color_function(value)
    }

    /// A number with an optional unit this profile understands, or a global keyword.
    pub fn is_unit_without_function(&self, value: &str) -> bool {
        if value.eq_ignore_ascii_case("auto") || self.is_global(value) {
            return true;
        }
        match NUMBER_WITH_UNIT.captures(value) {
            Some(caps) => {
                let unit = caps[1].to_ascii_lowercase();
                unit.is_empty() || self.units.contains(&unit.as_str())
            }
            None => false,
        }
    }

    /// A plain unit value or a math function such as `calc()`.
    pub fn is_unit(&self, value: &str) -> bool {
        self.is_unit_without_function(value) || MATH_FUNCTION.is_match(value)
    }

    /// Whether any unit carried by `value` is one this profile understands.
    pub fn is_compatible_unit(&self, value: &str) -> bool {
        match NUMBER_WITH_UNIT.captures(value) {
            Some(caps) => {
                let unit = caps[1].to_ascii_lowercase();
                unit.is_empty()
                    || self.units.contains(&unit.as_str())
                    || OTHER_UNITS.contains(&unit.as_str())
            }
            None => true,
        }
    }

    pub fn is_function(&self, value: &str) -> bool {
        FUNCTION.is_match(value)
    }

    pub fn is_vendor_function(&self, value: &str) -> bool {
        VENDOR_FUNCTION.is_match(value)
    }

    pub fn is_url(&self, value: &str) -> bool {
        match EscapeHandle::parse(value) {
            Some(handle) => handle.kind == EscapeKind::Url,
            None => value.len() > 4 && starts_with_ignore_case(value, "url("),
        }
    }

    pub fn is_variable(&self, value: &str) -> bool {
        value.len() > 4 && starts_with_ignore_case(value, "var(")
    }

    pub fn is_gradient(&self, value: &str) -> bool {
        let lower = value.to_ascii_lowercase();
        let unprefixed = strip_vendor(&lower);
        unprefixed.contains("gradient(") && self.is_function(value)
    }

    pub fn is_image(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("none")
            || self.is_url(value)
            || self.is_gradient(value)
            || self.is_global(value)
            || strip_vendor(&value.to_ascii_lowercase()).starts_with("image-set(")
    }

    pub fn is_background_attachment(&self, value: &str) -> bool {
        contains_keyword(ATTACHMENTS, value) || self.is_global(value)
    }

    pub fn is_background_repeat(&self, value: &str) -> bool {
        contains_keyword(REPEATS, value) || self.is_global(value)
    }

    pub fn is_background_box(&self, value: &str) -> bool {
        contains_keyword(BOXES, value) || self.is_global(value)
    }

    pub fn is_background_position_part(&self, value: &str) -> bool {
        contains_keyword(POSITION_KEYWORDS, value) || self.is_unit(value)
    }

    pub fn is_background_size_part(&self, value: &str) -> bool {
        contains_keyword(SIZE_KEYWORDS, value) || self.is_unit(value)
    }

    pub fn is_style_keyword(&self, value: &str) -> bool {
        contains_keyword(STYLES, value) || self.is_global(value)
    }

    pub fn is_width(&self, value: &str) -> bool {
        contains_keyword(WIDTHS, value) || self.is_unit(value)
    }

    pub fn is_list_style_type(&self, value: &str) -> bool {
        contains_keyword(LIST_STYLE_TYPES, value) || self.is_global(value)
    }

    pub fn is_list_style_position(&self, value: &str) -> bool {
        contains_keyword(LIST_STYLE_POSITIONS, value) || self.is_global(value)
    }

    pub fn is_time(&self, value: &str) -> bool {
        TIME.is_match(value)
    }

    pub fn is_timing_function(&self, value: &str) -> bool {
        contains_keyword(TIMING_FUNCTIONS, value) || {
            let lower = value.to_ascii_lowercase();
            (lower.starts_with("cubic-bezier(") || lower.starts_with("steps(")) && lower.ends_with(')')
        }
    }

    pub fn is_animation_iteration_count(&self, value: &str) -> bool {
        value.eq_ignore_ascii_case("infinite")
            || (NUMBER_WITH_UNIT
                .captures(value)
                .is_some_and(|caps| caps[1].is_empty()))
    }

    pub fn is_animation_direction(&self, value: &str) -> bool {
        contains_keyword(ANIMATION_DIRECTIONS, value)
    }

    pub fn is_animation_fill_mode(&self, value: &str) -> bool {
        contains_keyword(ANIMATION_FILL_MODES, value)
    }

    pub fn is_animation_play_state(&self, value: &str) -> bool {
        contains_keyword(ANIMATION_PLAY_STATES, value)
    }

    /// Both values are calls of the same function, e.g. two `calc()`s.
    pub fn are_same_function(&self, left: &str, right: &str) -> bool {
        if !self.is_function(left) || !self.is_function(right) {
            return false;
        }
        match (left.find('('), right.find('(')) {
            (Some(l), Some(r)) => left[..l].eq_ignore_ascii_case(&right[..r]),
            _ => false,
        }
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn contains_keyword(keywords: &[&str], value: &str) -> bool {
    keywords.iter().any(|keyword| keyword.eq_ignore_ascii_case(value))
}

/// `-webkit-linear-gradient(` becomes `linear-gradient(`.
pub fn strip_vendor(value: &str) -> &str {
    for prefix in ["-webkit-", "-moz-", "-ms-", "-o-"] {
        if let Some(rest) = value.strip_prefix(prefix) {
            return rest;
        }
    }
    value
}

/// The vendor prefix of a name or value, if any.
pub fn vendor_prefix(value: &str) -> Option<&'static str> {
    ["-webkit-", "-moz-", "-ms-", "-o-"]
        .into_iter()
        .find(|prefix| value.to_ascii_lowercase().starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors() {
        let profile = CompatibilityProfile::modern();
        let validator = Validator::new(&profile);
        assert!(validator.is_color("#fff"));
        assert!(validator.is_color("Red"));
        assert!(validator.is_color("rgba(0,0,0,.5)"));
        assert!(!validator.is_color("solid"));
        assert!(!validator.is_color("#ggg"));
        assert!(!validator.is_color(""));
    }

    #[test]
    fn test_units_follow_profile() {
        let modern = CompatibilityProfile::modern();
        let ie8 = CompatibilityProfile::ie8();
        assert!(Validator::new(&modern).is_unit("1.5rem"));
        assert!(!Validator::new(&ie8).is_unit("1.5rem"));
        assert!(Validator::new(&ie8).is_unit("-.5em"));
        assert!(Validator::new(&ie8).is_unit("calc(1px + 2em)"));
        assert!(!Validator::new(&ie8).is_unit("-webkit-calc(1px + 2em)"));
        assert!(!Validator::new(&ie8).is_unit("1.2.3px"));
    }

    #[test]
    fn test_keyword_groups() {
        let profile = CompatibilityProfile::modern();
        let validator = Validator::new(&profile);
        assert!(validator.is_background_repeat("no-repeat"));
        assert!(validator.is_background_box("content-box"));
        assert!(validator.is_background_position_part("center"));
        assert!(validator.is_background_size_part("cover"));
        assert!(validator.is_style_keyword("dashed"));
        assert!(validator.is_width("thin"));
        assert!(validator.is_list_style_type("upper-roman"));
        assert!(validator.is_image("-webkit-linear-gradient(top,red,blue)"));
        assert!(validator.is_image("__ESCAPED_URL_3(0)__"));
    }

    #[test]
    fn test_same_function() {
        let profile = CompatibilityProfile::modern();
        let validator = Validator::new(&profile);
        assert!(validator.are_same_function("calc(1px)", "CALC(2em)"));
        assert!(!validator.are_same_function("calc(1px)", "min(2em)"));
        assert!(!validator.are_same_function("calc(1px", "calc(2em)"));
    }
}
