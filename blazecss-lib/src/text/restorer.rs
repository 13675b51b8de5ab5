//! Re-inserts escaped text, normalizing it according to where it appears.

use crate::options::KeepSpecialComments;
use crate::text::escape_store::{find_placeholders, EscapeHandle, EscapeKind, EscapeStores};
use once_cell::sync::Lazy;
use regex::Regex;

static QUOTED_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:'[a-zA-Z][a-zA-Z\d\-_]+'|"[a-zA-Z][a-zA-Z\d\-_]+")$"#)
        .expect("valid identifier pattern")
});
static URL_LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\?\r?\n").expect("valid line break pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Quoted names in these contexts are identifiers and read the same unquoted.
const RESERVED_IDENTIFIERS: &[&str] = &[
    "inherit",
    "initial",
    "unset",
    "default",
    "none",
    "auto",
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
];

/// Where a piece of text is being restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreContext<'a> {
    Selector,
    BlockHeader,
    AtRule,
    /// A value of the named property.
    Property(&'a str),
    Comment,
}

pub struct Restorer<'a> {
    stores: &'a EscapeStores,
    keep_url_quotes: bool,
    keep_special_comments: KeepSpecialComments,
    special_comments_seen: usize,
}

impl<'a> Restorer<'a> {
    pub fn new(
        stores: &'a EscapeStores,
        keep_url_quotes: bool,
        keep_special_comments: KeepSpecialComments,
    ) -> Self {
        Restorer {
            stores,
            keep_url_quotes,
            keep_special_comments,
            special_comments_seen: 0,
        }
    }

    /// Restores a top-level comment placeholder; `None` when it is dropped.
    pub fn restore_comment(&mut self, placeholder: &str) -> Option<String> {
        let handle = EscapeHandle::parse(placeholder)?;
        if handle.kind != EscapeKind::SpecialComment {
            return None;
        }
        self.special_comments_seen += 1;
        let keep = match self.keep_special_comments {
            KeepSpecialComments::All => true,
            KeepSpecialComments::First => self.special_comments_seen == 1,
            KeepSpecialComments::None => false,
        };
        if keep {
            self.stores.get(&handle).map(str::to_string)
        } else {
            None
        }
    }

    /// Substitutes every placeholder in `text`, walking right to left.
    pub fn restore(&self, text: &str, context: RestoreContext<'_>) -> String {
        let placeholders = find_placeholders(text);
        if placeholders.is_empty() {
            return text.to_string();
        }

        let mut restored = text.to_string();
        for (handle, range) in placeholders.into_iter().rev() {
            let Some(original) = self.stores.get(&handle) else {
                continue;
            };
            let replacement = match handle.kind {
                EscapeKind::Comment | EscapeKind::SourceMarker => String::new(),
                EscapeKind::SpecialComment | EscapeKind::Expression | EscapeKind::Literal => original.to_string(),
                EscapeKind::Url => normalize_url(original, self.keep_url_quotes),
                EscapeKind::FreeText => {
                    if self.may_unquote(&restored, &range, context) {
                        unquote_identifier(original)
                    } else {
                        original.to_string()
                    }
                }
            };
            restored.replace_range(range, &replacement);
        }
        restored
    }

    fn may_unquote(
        &self,
        text: &str,
        range: &std::ops::Range<usize>,
        context: RestoreContext<'_>,
    ) -> bool {
        match context {
            RestoreContext::Selector => {
                let before = text[..range.start].trim_end();
                let after = text[range.end..].trim_start();
                before.ends_with('=') && (after.starts_with(']') || after.starts_with("i]"))
            }
            RestoreContext::BlockHeader => text.trim_start().starts_with('@') && text.contains("keyframes"),
            RestoreContext::Property(name) => {
                let unprefixed = strip_vendor_prefix(name);
                matches!(unprefixed, "font" | "font-family" | "animation" | "animation-name")
            }
            RestoreContext::AtRule | RestoreContext::Comment => false,
        }
    }
}

fn strip_vendor_prefix(name: &str) -> &str {
    for prefix in ["-webkit-", "-moz-", "-ms-", "-o-"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest;
        }
    }
    name
}

fn unquote_identifier(quoted: &str) -> String {
    if !QUOTED_IDENTIFIER.is_match(quoted) {
        return quoted.to_string();
    }
    let inner = &quoted[1..quoted.len() - 1];
    if RESERVED_IDENTIFIERS.contains(&inner.to_ascii_lowercase().as_str()) {
        return quoted.to_string();
    }
    inner.to_string()
}

/// Normalizes the inside of a `url(...)` literal.
pub fn normalize_url(url: &str, keep_quotes: bool) -> String {
    if url.len() < 5 {
        return url.to_string();
    }
    let inner = URL_LINE_BREAKS.replace_all(&url[4..url.len() - 1], "");
    let inner = WHITESPACE.replace_all(inner.trim(), " ").into_owned();

    let quoted = inner.len() >= 2
        && ((inner.starts_with('"') && inner.ends_with('"'))
            || (inner.starts_with('\'') && inner.ends_with('\'')));

    if !quoted || keep_quotes {
        return format!("url({})", inner);
    }

    let content = &inner[1..inner.len() - 1];
    let needs_quotes = content.chars().any(|ch| {
        ch.is_whitespace() || ch == '(' || ch == ')' || ch == '\'' || ch == '"' || ch == '\\'
    }) || is_data_uri_with_charset(content);

    if needs_quotes {
        format!("url({})", inner)
    } else {
        format!("url({})", content)
    }
}

fn is_data_uri_with_charset(content: &str) -> bool {
    content.starts_with("data:")
        && content
            .split_once(';')
            .is_some_and(|(_, rest)| rest.starts_with("charset"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("URL( 'a.png' )", false), "url(a.png)");
        assert_eq!(normalize_url("url(\"a b.png\")", false), "url(\"a b.png\")");
        assert_eq!(normalize_url("url('a.png')", true), "url('a.png')");
        assert_eq!(
            normalize_url("url('data:text/css;charset=utf-8,a')", false),
            "url('data:text/css;charset=utf-8,a')"
        );
    }

    #[test]
    fn test_restore_in_context() {
        let mut stores = EscapeStores::default();
        let family = stores.free_text.store("'Arial'".to_string(), None).placeholder();
        let generic = stores.free_text.store("\"serif\"".to_string(), None).placeholder();
        let content = stores.free_text.store("'x'".to_string(), None).placeholder();
        let restorer = Restorer::new(&stores, false, KeepSpecialComments::All);

        assert_eq!(
            restorer.restore(&format!("{},{}", family, generic), RestoreContext::Property("font-family")),
            "Arial,\"serif\""
        );
        assert_eq!(restorer.restore(&content, RestoreContext::Property("content")), "'x'");
        assert_eq!(
            restorer.restore(&format!("[type={}]", family), RestoreContext::Selector),
            "[type=Arial]"
        );
    }

    #[test]
    fn test_unknown_placeholder_left_as_is() {
        let mut stores = EscapeStores::default();
        let literal = stores.literals.store("__ESCAPED_URL_0(0)__".to_string(), None).placeholder();
        let restorer = Restorer::new(&stores, false, KeepSpecialComments::All);
        assert_eq!(
            restorer.restore("__ESCAPED_URL_7(0)__", RestoreContext::Property("width")),
            "__ESCAPED_URL_7(0)__"
        );
        assert_eq!(
            restorer.restore(&literal, RestoreContext::Property("width")),
            "__ESCAPED_URL_0(0)__"
        );
    }

    #[test]
    fn test_keep_first_special_comment() {
        let mut stores = EscapeStores::default();
        let first = stores.special_comments.store("/*! a */".to_string(), None).placeholder();
        let second = stores.special_comments.store("/*! b */".to_string(), None).placeholder();
        let mut restorer = Restorer::new(&stores, false, KeepSpecialComments::First);
        assert_eq!(restorer.restore_comment(&first), Some("/*! a */".to_string()));
        assert_eq!(restorer.restore_comment(&second), None);
    }
}
