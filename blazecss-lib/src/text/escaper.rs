//! Pulls comments, quoted text, `url(...)` and `expression(...)` out of the
//! stylesheet so later passes can split on separators without misreading them.

use crate::error::Warnings;
use crate::text::escape_store::{EscapeHandle, EscapeKind, EscapeStores};

const WARNING_CONTEXT: usize = 40;

/// Escapes `css`, filling `stores` and reporting broken constructs to `warnings`.
pub fn escape(css: &str, stores: &mut EscapeStores, warnings: &mut Warnings) -> String {
    let mut out = String::with_capacity(css.len());
    let mut cursor = 0usize;

    while cursor < css.len() {
        let rest = &css[cursor..];

        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => {
                    let comment = &rest[..end + 4];
                    let kind = if comment.starts_with("/*!") {
                        EscapeKind::SpecialComment
                    } else {
                        EscapeKind::Comment
                    };
                    let handle = stores.store_for_mut(kind).store(comment.to_string(), None);
                    out.push_str(&handle.placeholder());
                    cursor += comment.len();
                }
                None => {
                    warnings.push(format!("Broken comment: '{}'. Ignoring.", excerpt(rest)));
                    break;
                }
            }
            continue;
        }

        if rest.starts_with('"') || rest.starts_with('\'') {
            let (text, consumed, terminated) = scan_string(rest);
            if !terminated {
                warnings.push(format!(
                    "Unterminated string: '{}'. Closing it at the end of the line.",
                    excerpt(rest)
                ));
            }
            let handle = stores.free_text.store(text, None);
            out.push_str(&handle.placeholder());
            cursor += consumed;
            continue;
        }

        let preceded_by_ident = css[..cursor]
            .chars()
            .next_back()
            .is_some_and(|ch| ch.is_alphanumeric() || ch == '-' || ch == '_');

        if !preceded_by_ident && starts_with_ignore_case(rest, "url(") {
            match scan_function(rest, 4) {
                FunctionScan::Complete(len) => {
                    let url = &rest[..len];
                    if is_legal_url(url) {
                        let handle = stores.urls.store(url.to_string(), None);
                        out.push_str(&handle.placeholder());
                    } else {
                        warnings.push(format!(
                            "Invalid unquoted URL: '{}'. Leaving it as is.",
                            excerpt(url)
                        ));
                        out.push_str(url);
                    }
                    cursor += len;
                }
                FunctionScan::Broken(boundary) => {
                    warnings.push(format!(
                        "Broken URL declaration: '{}'. Ignoring.",
                        excerpt(&rest[..boundary])
                    ));
                    cursor += boundary;
                }
            }
            continue;
        }

        if !preceded_by_ident && starts_with_ignore_case(rest, "expression(") {
            match scan_function(rest, "expression(".len()) {
                FunctionScan::Complete(len) => {
                    let handle = stores.expressions.store(rest[..len].to_string(), None);
                    out.push_str(&handle.placeholder());
                    cursor += len;
                }
                FunctionScan::Broken(boundary) => {
                    warnings.push(format!(
                        "Broken expression: '{}'. Ignoring.",
                        excerpt(&rest[..boundary])
                    ));
                    cursor += boundary;
                }
            }
            continue;
        }

        if let Some((_, len)) = EscapeHandle::parse_prefix(rest) {
            let handle = stores.literals.store(rest[..len].to_string(), None);
            out.push_str(&handle.placeholder());
            cursor += len;
            continue;
        }

        // Plain character, copied as is.
        if let Some(ch) = rest.chars().next() {
            out.push(ch);
            cursor += ch.len_utf8();
        }
    }

    out
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn excerpt(text: &str) -> String {
    text.chars().take(WARNING_CONTEXT).collect()
}

/// Scans a quoted string at the start of `text`.
///
/// Returns the (possibly repaired) string text, the bytes consumed from the
/// input and whether the closing quote was found.
fn scan_string(text: &str) -> (String, usize, bool) {
    let mut chars = text.char_indices();
    let quote = match chars.next() {
        Some((_, quote)) => quote,
        None => return (String::new(), 0, true),
    };
    let mut escaped = false;

    for (idx, ch) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\n' => {
                let mut repaired = text[..idx].trim_end_matches('\r').to_string();
                repaired.push(quote);
                return (repaired, idx, false);
            }
            _ if ch == quote => {
                let end = idx + ch.len_utf8();
                return (text[..end].to_string(), end, true);
            }
            _ => {}
        }
    }

    let mut repaired = text.to_string();
    repaired.push(quote);
    (repaired, text.len(), false)
}

enum FunctionScan {
    /// Length of the complete call including the closing paren.
    Complete(usize),
    /// Offset of the safe boundary to truncate at.
    Broken(usize),
}

/// Balanced-paren scan of a function call whose opening paren ends at `open_len`.
fn scan_function(text: &str, open_len: usize) -> FunctionScan {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text[open_len..].char_indices() {
        let idx = idx + open_len;
        if escaped {
            escaped = false;
            continue;
        }
        if let Some(q) = quote {
            match ch {
                '\\' => escaped = true,
                '\n' => return FunctionScan::Broken(idx),
                _ if ch == q => quote = None,
                _ => {}
            }
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return FunctionScan::Complete(idx + 1);
                }
            }
            ';' | '}' | '{' => return FunctionScan::Broken(idx),
            _ => {}
        }
    }

    FunctionScan::Broken(text.len())
}

/// Unquoted urls may not hold inner whitespace.
fn is_legal_url(url: &str) -> bool {
    let inner = url[4..url.len() - 1].trim();
    if inner.starts_with('"') || inner.starts_with('\'') {
        return true;
    }
    !inner.chars().any(char::is_whitespace)
}
