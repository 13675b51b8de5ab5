//! Per-declaration value minification, without any shorthand awareness.

use crate::properties::colors::{shorten_color, shorten_inner_colors};
use crate::properties::restore::collapse_four;
use crate::properties::validator::{strip_vendor, Validator};
use crate::properties::wrap::{unwrap, wrap, Hack, Property};
use crate::text::escape_store::contains_placeholder;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[\s(,/*+])([+-]?)(\d*\.?\d+)([a-zA-Z%]*)").expect("valid number pattern")
});
static SPACE_AROUND_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").expect("valid comma pattern"));
static SPACE_AFTER_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s+").expect("valid paren pattern"));
static SPACE_BEFORE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\)").expect("valid paren pattern"));
static LEGACY_FILTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"progid:DXImageTransform\.Microsoft\.(Alpha|Chroma)(\W)").expect("valid filter pattern")
});
static FILTER_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\S)").expect("valid filter comma pattern"));
static FILTER_EQUALS: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?= ?").expect("valid filter equals pattern"));

const LENGTH_UNITS: &[&str] = &[
    "px", "em", "ex", "ch", "rem", "vh", "vw", "vmin", "vmax", "vm", "cm", "mm", "in", "pt", "pc",
];
const MAX_ROUNDING_PRECISION: u8 = 15;

/// Settings for one minification run.
pub struct ValueContext<'a, 'v> {
    pub validator: &'a Validator<'v>,
    pub rounding_precision: u8,
}

/// Minifies every value in place. Declarations that must go are marked unused.
pub fn minify_values(properties: &mut [Property], context: &ValueContext) {
    let flags = &context.validator.profile().properties;

    for property in properties.iter_mut() {
        if property.unused {
            continue;
        }

        let allowed = match property.hack {
            Some(Hack::Underscore) | Some(Hack::Star) => flags.ie_prefix_hack,
            Some(Hack::Backslash) => flags.ie_suffix_hack,
            Some(Hack::Bang) => flags.ie_bang_hack,
            None => true,
        };
        if !allowed {
            property.unused = true;
            continue;
        }

        if let Some(block) = property.block.take() {
            let mut nested = wrap(&block, property.origin);
            minify_values(&mut nested, context);
            property.block = Some(unwrap(&nested));
            continue;
        }

        if property.value.is_empty() {
            property.unused = true;
            continue;
        }
        if property.variable {
            continue;
        }

        minify_property(property, context);

        if is_padding(&property.name) && property.value.iter().any(|fragment| is_negative(fragment)) {
            property.unused = true;
        }
    }
}

fn minify_property(property: &mut Property, context: &ValueContext) {
    let name = property.name.clone();
    let unprefixed = strip_vendor(&name);
    let flags = &context.validator.profile().properties;
    let shorten_colors = flags.colors && is_color_property(unprefixed);
    let numbers = unprefixed != "unicode-range";
    let keep_zero_units = !flags.zero_units || unprefixed.contains("flex");

    for fragment in property.value.iter_mut() {
        if fragment == "," || fragment == "/" || contains_placeholder(fragment) {
            continue;
        }

        let mut minified = fragment.clone();
        if minified.contains('(') {
            minified = normalize_function(&minified);
        }
        if numbers {
            minified = minify_numbers(&minified, keep_zero_units, context);
        }
        if shorten_colors {
            minified = if context.validator.is_color(&minified) {
                shorten_color(&minified, context.validator.profile().colors.opacity)
            } else if context.validator.is_function(&minified) {
                shorten_inner_colors(&minified, context.validator.profile().colors.opacity)
            } else {
                minified
            };
        }
        if unprefixed == "filter" || unprefixed == "-ms-filter" {
            minified = minify_legacy_filter(&minified);
        }
        *fragment = minified;
    }

    property.value = minify_by_name(unprefixed, std::mem::take(&mut property.value));
}

fn minify_by_name(name: &str, value: Vec<String>) -> Vec<String> {
    match name {
        "margin" | "padding" | "border-width" | "border-color" | "border-style" => collapse_box(value),
        "border-radius" => collapse_radius(value),
        "box-shadow" if is_all_zero(&value, 4) => vec!["0".to_string(), "0".to_string()],
        "text-shadow" if is_all_zero(&value, 3) => vec!["0".to_string(), "0".to_string()],
        "font-weight" => match value.as_slice() {
            [only] if only.eq_ignore_ascii_case("normal") => vec!["400".to_string()],
            [only] if only.eq_ignore_ascii_case("bold") => vec!["700".to_string()],
            _ => value,
        },
        "font" => value
            .into_iter()
            .map(|fragment| {
                if fragment.eq_ignore_ascii_case("bold") {
                    "700".to_string()
                } else {
                    fragment
                }
            })
            .collect(),
        "background" if is_none(&value) => vec!["0".to_string(), "0".to_string()],
        "border" | "border-top" | "border-right" | "border-bottom" | "border-left" | "outline"
            if is_none(&value) =>
        {
            vec!["0".to_string()]
        }
        _ => value,
    }
}

fn is_none(value: &[String]) -> bool {
    matches!(value, [only] if only.eq_ignore_ascii_case("none"))
}

fn is_all_zero(value: &[String], count: usize) -> bool {
    value.len() == count && value.iter().all(|fragment| fragment == "0")
}

fn collapse_box(value: Vec<String>) -> Vec<String> {
    if value.iter().any(|fragment| fragment == "," || fragment == "/") {
        return value;
    }
    match value.as_slice() {
        [top, right] => collapse_four(&[top.clone(), right.clone(), top.clone(), right.clone()]),
        [top, right, bottom] => collapse_four(&[top.clone(), right.clone(), bottom.clone(), right.clone()]),
        [_, _, _, _] => collapse_four(&value),
        _ => value,
    }
}

fn collapse_radius(value: Vec<String>) -> Vec<String> {
    if value.iter().any(|fragment| fragment == ",") {
        return value;
    }
    let halves: Vec<Vec<String>> = value
        .split(|fragment| fragment == "/")
        .map(|half| collapse_box(half.to_vec()))
        .collect();
    match halves.as_slice() {
        [horizontal, vertical] if horizontal == vertical => horizontal.clone(),
        [horizontal, vertical] => {
            let mut collapsed = horizontal.clone();
            collapsed.push("/".to_string());
            collapsed.extend(vertical.iter().cloned());
            collapsed
        }
        _ => value,
    }
}

fn is_padding(name: &str) -> bool {
    name == "padding" || name.starts_with("padding-")
}

fn is_negative(fragment: &str) -> bool {
    fragment
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|first| first.is_ascii_digit() || first == '.')
        && fragment.trim_start_matches(['-', '0', '.']).chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

fn is_color_property(name: &str) -> bool {
    name == "color"
        || name.ends_with("-color")
        || matches!(
            name,
            "background"
                | "background-image"
                | "border"
                | "border-top"
                | "border-right"
                | "border-bottom"
                | "border-left"
                | "border-image"
                | "box-shadow"
                | "column-rule"
                | "fill"
                | "mask"
                | "outline"
                | "stroke"
                | "text-decoration"
                | "text-emphasis"
                | "text-shadow"
        )
}

/// Tightens whitespace inside function calls, leaving math operators alone.
fn normalize_function(fragment: &str) -> String {
    let tightened = SPACE_AROUND_COMMA.replace_all(fragment, ",");
    let tightened = SPACE_AFTER_OPEN.replace_all(&tightened, "(");
    SPACE_BEFORE_CLOSE.replace_all(&tightened, ")").into_owned()
}

fn minify_legacy_filter(fragment: &str) -> String {
    if !fragment.contains("progid:") {
        return fragment.to_string();
    }
    let lowered = LEGACY_FILTER.replace_all(fragment, |caps: &Captures| {
        format!("{}{}", caps[1].to_ascii_lowercase(), &caps[2])
    });
    let spaced = FILTER_COMMA.replace_all(&lowered, ", $1");
    FILTER_EQUALS.replace_all(&spaced, "=").into_owned()
}

fn minify_numbers(fragment: &str, keep_zero_units: bool, context: &ValueContext) -> String {
    let in_calc = fragment.to_ascii_lowercase().contains("calc(");
    NUMBER
        .replace_all(fragment, |caps: &Captures| {
            let whole = caps[0].len() == fragment.len();
            let number = minify_number(
                &caps[2],
                &caps[3],
                &caps[4],
                whole,
                keep_zero_units || in_calc,
                context,
            );
            format!("{}{}", &caps[1], number)
        })
        .into_owned()
}

fn minify_number(
    sign: &str,
    number: &str,
    unit: &str,
    whole: bool,
    keep_zero_units: bool,
    context: &ValueContext,
) -> String {
    let Ok(value) = number.parse::<f64>() else {
        return format!("{}{}{}", sign, number, unit);
    };
    let lower_unit = unit.to_ascii_lowercase();

    if value == 0.0 {
        return zero(unit, whole, keep_zero_units);
    }

    let mut text = trim_number(number);
    let precision = context.rounding_precision;
    if lower_unit == "px" && precision <= MAX_ROUNDING_PRECISION {
        text = round_to(&text, value, precision);
        if text.parse::<f64>().map_or(false, |rounded| rounded == 0.0) {
            return zero(unit, whole, keep_zero_units);
        }
    }

    let mut best = format!("{}{}", text, unit);
    let flags = &context.validator.profile().properties;
    if lower_unit == "px" && flags.shorter_length_units {
        let allowed = context.validator.profile().allowed_units();
        for (candidate_unit, factor) in [("in", 1.0 / 96.0), ("pt", 0.75), ("pc", 1.0 / 16.0)] {
            if !allowed.contains(&candidate_unit) {
                continue;
            }
            if let Some(converted) = exact(value * factor) {
                let candidate = format!("{}{}", converted, candidate_unit);
                if candidate.len() < best.len() {
                    best = candidate;
                }
            }
        }
    } else if lower_unit == "ms" {
        if let Some(seconds) = exact(value / 1000.0) {
            let candidate = format!("{}s", seconds);
            if candidate.len() < best.len() {
                best = candidate;
            }
        }
    } else if lower_unit == "s" {
        if let Some(millis) = exact(value * 1000.0) {
            let candidate = format!("{}ms", millis);
            if candidate.len() < best.len() {
                best = candidate;
            }
        }
    }

    format!("{}{}", sign, best)
}

/// Zero with its unit dropped where that is safe. The sign is always dropped.
fn zero(unit: &str, whole: bool, keep_zero_units: bool) -> String {
    let lower_unit = unit.to_ascii_lowercase();
    let drop_unit =
        !keep_zero_units && (LENGTH_UNITS.contains(&lower_unit.as_str()) || (lower_unit == "%" && whole));
    if drop_unit || unit.is_empty() {
        "0".to_string()
    } else {
        format!("0{}", unit)
    }
}

/// `0.50` to `.5`, `010` to `10`.
fn trim_number(number: &str) -> String {
    let (int, fraction) = number.split_once('.').unwrap_or((number, ""));
    let int = int.trim_start_matches('0');
    let fraction = fraction.trim_end_matches('0');
    match (int.is_empty(), fraction.is_empty()) {
        (true, true) => "0".to_string(),
        (_, true) => int.to_string(),
        _ => format!("{}.{}", int, fraction),
    }
}

fn round_to(text: &str, value: f64, precision: u8) -> String {
    let decimals = text.split_once('.').map_or(0, |(_, fraction)| fraction.len());
    if decimals <= precision as usize {
        return text.to_string();
    }
    let rounded = format!("{:.*}", precision as usize, value);
    trim_number(&rounded)
}

/// A short decimal rendering of `value`, if it has at most three decimals.
fn exact(value: f64) -> Option<String> {
    let scaled = value * 1000.0;
    if (scaled - scaled.round()).abs() > 1e-9 {
        return None;
    }
    Some(trim_number(&format!("{:.3}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::CompatibilityProfile;
    use crate::tokenizer::split::split_value;
    use pretty_assertions::assert_eq;

    fn minify_with(profile: &CompatibilityProfile, name: &str, value: &str) -> Option<String> {
        let validator = Validator::new(profile);
        let context = ValueContext {
            validator: &validator,
            rounding_precision: 2,
        };
        let mut properties = vec![crate::properties::wrap::wrap_declaration(
            &crate::tree::css_tree::Declaration::new(name, split_value(value)),
            0,
            0,
        )];
        minify_values(&mut properties, &context);
        let property = &properties[0];
        (!property.unused).then(|| crate::properties::wrap::unwrap_property(property).to_string())
    }

    fn minify(name: &str, value: &str) -> Option<String> {
        minify_with(&CompatibilityProfile::modern(), name, value)
    }

    #[test]
    fn test_numbers() {
        assert_eq!(minify("margin", "0px 0.50em 10.0px 0%"), Some("margin:0 .5em 10px 0".into()));
        assert_eq!(minify("width", "calc(100% - 0px)"), Some("width:calc(100% - 0px)".into()));
        assert_eq!(minify("flex", "1 1 0%"), Some("flex:1 1 0%".into()));
        assert_eq!(minify("width", "10.12345px"), Some("width:10.12px".into()));
        assert_eq!(minify("opacity", "0.5"), Some("opacity:.5".into()));
        assert_eq!(minify("top", "-0.0px"), Some("top:0".into()));
        assert_eq!(minify("transition-duration", "500ms"), Some("transition-duration:.5s".into()));
        assert_eq!(minify("transition-delay", "0.001s"), Some("transition-delay:1ms".into()));
    }

    #[test]
    fn test_rounding_to_zero() {
        assert_eq!(minify("width", "0.001px"), Some("width:0".into()));
        assert_eq!(minify("margin", "-0.004px 1px"), Some("margin:0 1px".into()));
        assert_eq!(minify("width", "0.006px"), Some("width:.01px".into()));
    }

    #[test]
    fn test_shorter_length_units() {
        let mut profile = CompatibilityProfile::modern();
        profile.properties.shorter_length_units = true;
        assert_eq!(minify_with(&profile, "width", "96px"), Some("width:1in".into()));
        assert_eq!(minify_with(&profile, "width", "12px"), Some("width:9pt".into()));
        assert_eq!(minify_with(&profile, "width", "13px"), Some("width:13px".into()));
    }

    #[test]
    fn test_colors() {
        assert_eq!(minify("color", "#FF0000"), Some("color:red".into()));
        assert_eq!(minify("background-color", "rgb(255, 255, 255)"), Some("background-color:#fff".into()));
        assert_eq!(
            minify("background", "linear-gradient( #ffffff ,  black )"),
            Some("background:linear-gradient(#fff,#000)".into())
        );
        assert_eq!(minify("font-family", "Black"), Some("font-family:Black".into()));
    }

    #[test]
    fn test_property_specific() {
        assert_eq!(minify("padding", "1px 2px 1px 2px"), Some("padding:1px 2px".into()));
        assert_eq!(minify("border-radius", "2px 2px/2px"), Some("border-radius:2px".into()));
        assert_eq!(minify("box-shadow", "0 0 0 0"), Some("box-shadow:0 0".into()));
        assert_eq!(minify("font-weight", "bold"), Some("font-weight:700".into()));
        assert_eq!(minify("font", "bold 12px Arial"), Some("font:700 12px Arial".into()));
        assert_eq!(minify("background", "none"), Some("background:0 0".into()));
        assert_eq!(minify("border", "none"), Some("border:0".into()));
        assert_eq!(
            minify("filter", "progid:DXImageTransform.Microsoft.Alpha(Opacity = 80)"),
            Some("filter:alpha(Opacity=80)".into())
        );
    }

    #[test]
    fn test_dropped_declarations() {
        assert_eq!(minify("padding", "-1px 0"), None);
        assert_eq!(minify("padding-top", "-0"), Some("padding-top:0".into()));
        assert_eq!(minify("*zoom", "1"), None);
        assert_eq!(minify_with(&CompatibilityProfile::ie7(), "*zoom", "1"), Some("*zoom:1".into()));
        assert_eq!(minify("color", "red\\9"), Some("color:red\\9".into()));
    }
}
