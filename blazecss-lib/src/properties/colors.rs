//! Color value shortening: hex collapse, name/hex swaps and `rgb()`/`hsl()`
//! conversion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

const NAMED_COLORS: &[(&str, &str)] = &[
    ("aliceblue", "#f0f8ff"),
    ("antiquewhite", "#faebd7"),
    ("aqua", "#0ff"),
    ("aquamarine", "#7fffd4"),
    ("azure", "#f0ffff"),
    ("beige", "#f5f5dc"),
    ("bisque", "#ffe4c4"),
    ("black", "#000"),
    ("blanchedalmond", "#ffebcd"),
    ("blue", "#00f"),
    ("blueviolet", "#8a2be2"),
    ("brown", "#a52a2a"),
    ("burlywood", "#deb887"),
    ("cadetblue", "#5f9ea0"),
    ("chartreuse", "#7fff00"),
    ("chocolate", "#d2691e"),
    ("coral", "#ff7f50"),
    ("cornflowerblue", "#6495ed"),
    ("cornsilk", "#fff8dc"),
    ("crimson", "#dc143c"),
    ("cyan", "#0ff"),
    ("darkblue", "#00008b"),
    ("darkcyan", "#008b8b"),
    ("darkgoldenrod", "#b8860b"),
    ("darkgray", "#a9a9a9"),
    ("darkgreen", "#006400"),
    ("darkgrey", "#a9a9a9"),
    ("darkkhaki", "#bdb76b"),
    ("darkmagenta", "#8b008b"),
    ("darkolivegreen", "#556b2f"),
    ("darkorange", "#ff8c00"),
    ("darkorchid", "#9932cc"),
    ("darkred", "#8b0000"),
    ("darksalmon", "#e9967a"),
    ("darkseagreen", "#8fbc8f"),
    ("darkslateblue", "#483d8b"),
    ("darkslategray", "#2f4f4f"),
    ("darkslategrey", "#2f4f4f"),
    ("darkturquoise", "#00ced1"),
    ("darkviolet", "#9400d3"),
    ("deeppink", "#ff1493"),
    ("deepskyblue", "#00bfff"),
    ("dimgray", "#696969"),
    ("dimgrey", "#696969"),
    ("dodgerblue", "#1e90ff"),
    ("firebrick", "#b22222"),
    ("floralwhite", "#fffaf0"),
    ("forestgreen", "#228b22"),
    ("fuchsia", "#f0f"),
    ("gainsboro", "#dcdcdc"),
    ("ghostwhite", "#f8f8ff"),
    ("gold", "#ffd700"),
    ("goldenrod", "#daa520"),
    ("gray", "#808080"),
    ("green", "#008000"),
    ("greenyellow", "#adff2f"),
    ("grey", "#808080"),
    ("honeydew", "#f0fff0"),
    ("hotpink", "#ff69b4"),
    ("indianred", "#cd5c5c"),
    ("indigo", "#4b0082"),
    ("ivory", "#fffff0"),
    ("khaki", "#f0e68c"),
    ("lavender", "#e6e6fa"),
    ("lavenderblush", "#fff0f5"),
    ("lawngreen", "#7cfc00"),
    ("lemonchiffon", "#fffacd"),
    ("lightblue", "#add8e6"),
    ("lightcoral", "#f08080"),
    ("lightcyan", "#e0ffff"),
    ("lightgoldenrodyellow", "#fafad2"),
    ("lightgray", "#d3d3d3"),
    ("lightgreen", "#90ee90"),
    ("lightgrey", "#d3d3d3"),
    ("lightpink", "#ffb6c1"),
    ("lightsalmon", "#ffa07a"),
    ("lightseagreen", "#20b2aa"),
    ("lightskyblue", "#87cefa"),
    ("lightslategray", "#778899"),
    ("lightslategrey", "#778899"),
    ("lightsteelblue", "#b0c4de"),
    ("lightyellow", "#ffffe0"),
    ("lime", "#0f0"),
    ("limegreen", "#32cd32"),
    ("linen", "#faf0e6"),
    ("magenta", "#f0f"),
    ("maroon", "#800000"),
    ("mediumaquamarine", "#66cdaa"),
    ("mediumblue", "#0000cd"),
    ("mediumorchid", "#ba55d3"),
    ("mediumpurple", "#9370db"),
    ("mediumseagreen", "#3cb371"),
    ("mediumslateblue", "#7b68ee"),
    ("mediumspringgreen", "#00fa9a"),
    ("mediumturquoise", "#48d1cc"),
    ("mediumvioletred", "#c71585"),
    ("midnightblue", "#191970"),
    ("mintcream", "#f5fffa"),
    ("mistyrose", "#ffe4e1"),
    ("moccasin", "#ffe4b5"),
    ("navajowhite", "#ffdead"),
    ("navy", "#000080"),
    ("oldlace", "#fdf5e6"),
    ("olive", "#808000"),
    ("olivedrab", "#6b8e23"),
    ("orange", "#ffa500"),
    ("orangered", "#ff4500"),
    ("orchid", "#da70d6"),
    ("palegoldenrod", "#eee8aa"),
    ("palegreen", "#98fb98"),
    ("paleturquoise", "#afeeee"),
    ("palevioletred", "#db7093"),
    ("papayawhip", "#ffefd5"),
    ("peachpuff", "#ffdab9"),
    ("peru", "#cd853f"),
    ("pink", "#ffc0cb"),
    ("plum", "#dda0dd"),
    ("powderblue", "#b0e0e6"),
    ("purple", "#800080"),
    ("rebeccapurple", "#663399"),
    ("red", "#f00"),
    ("rosybrown", "#bc8f8f"),
    ("royalblue", "#4169e1"),
    ("saddlebrown", "#8b4513"),
    ("salmon", "#fa8072"),
    ("sandybrown", "#f4a460"),
    ("seagreen", "#2e8b57"),
    ("seashell", "#fff5ee"),
    ("sienna", "#a0522d"),
    ("silver", "#c0c0c0"),
    ("skyblue", "#87ceeb"),
    ("slateblue", "#6a5acd"),
    ("slategray", "#708090"),
    ("slategrey", "#708090"),
    ("snow", "#fffafa"),
    ("springgreen", "#00ff7f"),
    ("steelblue", "#4682b4"),
    ("tan", "#d2b48c"),
    ("teal", "#008080"),
    ("thistle", "#d8bfd8"),
    ("tomato", "#ff6347"),
    ("turquoise", "#40e0d0"),
    ("violet", "#ee82ee"),
    ("wheat", "#f5deb3"),
    ("white", "#fff"),
    ("whitesmoke", "#f5f5f5"),
    ("yellow", "#ff0"),
    ("yellowgreen", "#9acd32"),
];

/// Names that are longer than their hex value.
static NAME_TO_HEX: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    NAMED_COLORS
        .iter()
        .filter(|(name, hex)| hex.len() < name.len())
        .copied()
        .collect()
});

/// Hex values that have a shorter name. The first name listed wins.
static HEX_TO_NAME: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (name, hex) in NAMED_COLORS {
        if name.len() < hex.len() {
            map.entry(*hex).or_insert(*name);
        }
    }
    map
});

static HEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid hex pattern"));
static INNER_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#[0-9a-f]{6}\b|#[0-9a-f]{3}\b|\b(?:rgba?|hsla?)\([^()]*\)|\b[a-z]+\b")
        .expect("valid inner color pattern")
});

pub fn is_named(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    NAMED_COLORS.iter().any(|(name, _)| *name == lower)
}

pub fn is_hex(value: &str) -> bool {
    HEX.is_match(value)
}

/// Shortest form of a single color token; anything else comes back unchanged.
pub fn shorten_color(value: &str, opacity: bool) -> String {
    let lower = value.to_ascii_lowercase();

    if lower.starts_with("rgb") || lower.starts_with("hsl") {
        return match function_to_hex(&lower, opacity) {
            Some(converted) => shorten_color(&converted, opacity),
            None => value.to_string(),
        };
    }

    if is_hex(&lower) {
        let hex = collapse_hex(&lower);
        return match HEX_TO_NAME.get(hex.as_str()) {
            Some(name) => name.to_string(),
            None => hex,
        };
    }

    match NAME_TO_HEX.get(lower.as_str()) {
        Some(hex) => hex.to_string(),
        None if is_named(&lower) => lower,
        None => value.to_string(),
    }
}

/// Shortens colors nested in a function value such as a gradient. Words
/// that are part of a longer identifier and anything inside `var()` stay.
pub fn shorten_inner_colors(value: &str, opacity: bool) -> String {
    let variables = variable_ranges(value);
    let mut out = String::with_capacity(value.len());
    let mut last = 0;

    for found in INNER_COLOR.find_iter(value) {
        let text = found.as_str();
        if variables.iter().any(|range| range.contains(&found.start())) {
            continue;
        }
        let before = value[..found.start()].chars().next_back();
        let after = value[found.end()..].chars().next();
        if before.is_some_and(is_identifier_char) || (!text.ends_with(')') && after.is_some_and(is_identifier_char)) {
            continue;
        }
        if !(text.starts_with('#') || text.contains('(') || is_named(text)) {
            continue;
        }
        out.push_str(&value[last..found.start()]);
        out.push_str(&shorten_color(text, opacity));
        last = found.end();
    }
    out.push_str(&value[last..]);
    out
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}

/// Byte ranges of every `var(...)` call, fallback included.
fn variable_ranges(value: &str) -> Vec<Range<usize>> {
    let lower = value.to_ascii_lowercase();
    let mut ranges = Vec::new();
    let mut from = 0;
    while let Some(offset) = lower[from..].find("var(") {
        let start = from + offset;
        let mut depth = 0usize;
        let mut end = value.len();
        for (idx, ch) in value[start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + idx + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        ranges.push(start..end);
        from = end;
    }
    ranges
}

/// `#aabbcc` to `#abc`, `#aabbccdd` to `#abcd`.
fn collapse_hex(hex: &str) -> String {
    let digits: Vec<char> = hex[1..].chars().collect();
    if (digits.len() == 6 || digits.len() == 8) && digits.chunks(2).all(|pair| pair[0] == pair[1]) {
        let short: String = digits.chunks(2).map(|pair| pair[0]).collect();
        return format!("#{}", short);
    }
    hex.to_string()
}

fn function_to_hex(value: &str, opacity: bool) -> Option<String> {
    let open = value.find('(')?;
    let name = &value[..open];
    let args: Vec<&str> = value[open + 1..value.strip_suffix(')')?.len()]
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|arg| !arg.is_empty() && *arg != "/")
        .collect();

    match (name, args.len()) {
        ("rgb", 3) | ("rgba", 3) => rgb_to_hex(&args),
        ("hsl", 3) | ("hsla", 3) => hsl_to_hex(&args),
        ("rgba", 4) | ("hsla", 4) if opacity && is_zero(args[3]) && is_transparent_black(name, &args) => {
            Some("transparent".to_string())
        }
        ("rgba", 4) | ("rgb", 4) if is_one(args[3]) => rgb_to_hex(&args[..3]),
        ("hsla", 4) | ("hsl", 4) if is_one(args[3]) => hsl_to_hex(&args[..3]),
        _ => None,
    }
}

fn is_zero(arg: &str) -> bool {
    arg.trim_end_matches('%').parse::<f64>().is_ok_and(|value| value == 0.0)
}

fn is_one(arg: &str) -> bool {
    match arg.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().is_ok_and(|value| value == 100.0),
        None => arg.parse::<f64>().is_ok_and(|value| value == 1.0),
    }
}

fn is_transparent_black(name: &str, args: &[&str]) -> bool {
    match name {
        "rgba" => args[..3].iter().all(|arg| is_zero(arg)),
        _ => is_zero(args[2]),
    }
}

fn channel(arg: &str) -> Option<u8> {
    let value = match arg.strip_suffix('%') {
        Some(percent) => percent.parse::<f64>().ok()? * 255.0 / 100.0,
        None => arg.parse::<f64>().ok()?,
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn rgb_to_hex(args: &[&str]) -> Option<String> {
    let red = channel(args[0])?;
    let green = channel(args[1])?;
    let blue = channel(args[2])?;
    Some(format!("#{:02x}{:02x}{:02x}", red, green, blue))
}

fn hsl_to_hex(args: &[&str]) -> Option<String> {
    let hue = args[0].trim_end_matches("deg").parse::<f64>().ok()?;
    let saturation = args[1].strip_suffix('%')?.parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;
    let lightness = args[2].strip_suffix('%')?.parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;
    let hue = hue.rem_euclid(360.0) / 360.0;

    let (red, green, blue) = if saturation == 0.0 {
        (lightness, lightness, lightness)
    } else {
        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        (
            hue_to_rgb(p, q, hue + 1.0 / 3.0),
            hue_to_rgb(p, q, hue),
            hue_to_rgb(p, q, hue - 1.0 / 3.0),
        )
    };

    let to_byte = |value: f64| (value * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(red),
        to_byte(green),
        to_byte(blue)
    ))
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_and_names() {
        assert_eq!(shorten_color("#FF0000", true), "red");
        assert_eq!(shorten_color("#f00", true), "red");
        assert_eq!(shorten_color("#aabbcc", true), "#abc");
        assert_eq!(shorten_color("white", true), "#fff");
        assert_eq!(shorten_color("Navy", true), "navy");
        assert_eq!(shorten_color("#123456", true), "#123456");
    }

    #[test]
    fn test_functions() {
        assert_eq!(shorten_color("rgb(255,0,0)", true), "red");
        assert_eq!(shorten_color("rgb(100%, 100%, 100%)", true), "#fff");
        assert_eq!(shorten_color("hsl(0,0%,0%)", true), "#000");
        assert_eq!(shorten_color("hsl(120,100%,25%)", true), "green");
        assert_eq!(shorten_color("rgba(0,0,0,0)", true), "transparent");
        assert_eq!(shorten_color("rgba(0,0,0,0)", false), "rgba(0,0,0,0)");
        assert_eq!(shorten_color("rgba(0,0,0,.5)", true), "rgba(0,0,0,.5)");
    }

    #[test]
    fn test_inner_colors() {
        assert_eq!(
            shorten_inner_colors("linear-gradient(to right,#ffffff,rgb(0,0,0))", true),
            "linear-gradient(to right,#fff,#000)"
        );
    }

    #[test]
    fn test_inner_colors_leave_identifiers() {
        assert_eq!(shorten_inner_colors("var(--white)", true), "var(--white)");
        assert_eq!(shorten_inner_colors("var(--bg-black,#ffffff)", true), "var(--bg-black,#ffffff)");
        assert_eq!(
            shorten_inner_colors("linear-gradient(var(--from-white),white)", true),
            "linear-gradient(var(--from-white),#fff)"
        );
        assert_eq!(shorten_inner_colors("drop-shadow(0 0 1px white-ish)", true), "drop-shadow(0 0 1px white-ish)");
    }
}
