//! Separator splitting that respects nesting.
//!
//! Strings and urls are already escaped at this point, so only brackets need
//! tracking.

/// Splits `text` on `separator` where it is not nested in `()`, `[]` or `{}`.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;

    for (idx, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if ch == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Finds the first top-level occurrence of any of `targets` in `text`.
pub fn find_top_level(text: &str, targets: &[char]) -> Option<(usize, char)> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        if depth == 0 && targets.contains(&ch) {
            return Some((idx, ch));
        }
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Splits a declaration value into fragments.
///
/// Whitespace separates fragments; `,` and `/` become fragments of their own.
/// Nothing inside parentheses is split.
pub fn split_value(value: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    fn flush(current: &mut String, fragments: &mut Vec<String>) {
        if !current.is_empty() {
            fragments.push(std::mem::take(current));
        }
    }

    for ch in value.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            _ if depth > 0 => {
                if ch.is_whitespace() {
                    if !current.ends_with(' ') {
                        current.push(' ');
                    }
                } else {
                    current.push(ch);
                }
            }
            ',' | '/' => {
                flush(&mut current, &mut fragments);
                fragments.push(ch.to_string());
            }
            _ if ch.is_whitespace() => flush(&mut current, &mut fragments),
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut fragments);
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("a,b:not(c,d),e", ','), vec!["a", "b:not(c,d)", "e"]);
        assert_eq!(
            split_top_level("color:red;--x:{a:b;c:d};top:0", ';'),
            vec!["color:red", "--x:{a:b;c:d}", "top:0"]
        );
    }

    #[test]
    fn test_split_value() {
        assert_eq!(
            split_value("12px/1.5  Arial, sans-serif"),
            vec!["12px", "/", "1.5", "Arial", ",", "sans-serif"]
        );
        assert_eq!(
            split_value("rgba(0, 0,\n0, .5) 1px"),
            vec!["rgba(0, 0, 0, .5)", "1px"]
        );
    }

    #[test]
    fn test_find_top_level() {
        assert_eq!(find_top_level("a(:)b:c", &[':']), Some((4, ':')));
        assert_eq!(find_top_level("abc", &[':']), None);
    }
}
