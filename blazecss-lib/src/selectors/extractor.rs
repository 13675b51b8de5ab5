//! Flattens tokens into the declarations they carry, for reorder checks.

use crate::tree::css_tree::{value_to_string, Selector, Token};
use once_cell::sync::Lazy;
use regex::Regex;

static SIMPLE_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9\-]*$").expect("valid simple selector pattern"));
static VENDOR_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\w+-").expect("valid vendor prefix pattern"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]+").expect("valid word pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedProperty {
    pub name: String,
    pub value: String,
    /// Family the property belongs to, `margin` for `margin-top`.
    pub root: String,
    pub selectors: Vec<Selector>,
    /// Every selector is a bare type selector such as `div`.
    pub in_simple_selector: bool,
}

impl ExtractedProperty {
    /// `name:value`, equal for verbatim repeats.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.value)
    }
}

/// Declarations of a rule, or of every rule nested in a block. Custom
/// properties never take part in reordering decisions.
pub fn extract(token: &Token) -> Vec<ExtractedProperty> {
    match token {
        Token::Rule(rule) => {
            let in_simple_selector = rule
                .selectors
                .iter()
                .all(|selector| SIMPLE_SELECTOR.is_match(&selector.value));
            rule.body
                .iter()
                .filter(|declaration| !declaration.name.is_empty() && !declaration.name.starts_with("--"))
                .map(|declaration| ExtractedProperty {
                    name: declaration.name.to_ascii_lowercase(),
                    value: value_to_string(&declaration.value),
                    root: find_name_root(&declaration.name.to_ascii_lowercase()),
                    selectors: rule.selectors.clone(),
                    in_simple_selector,
                })
                .collect()
        }
        Token::Block(block) => block.body.iter().flat_map(extract).collect(),
        _ => Vec::new(),
    }
}

pub fn find_name_root(name: &str) -> String {
    if name == "list-style" {
        return name.to_string();
    }
    if name.find("-radius").is_some_and(|at| at > 0) {
        return "border-radius".to_string();
    }
    if matches!(name, "border-collapse" | "border-spacing" | "border-image") {
        return name.to_string();
    }
    if let Some(rest) = name.strip_prefix("border-") {
        let parts: Vec<&str> = rest.split('-').collect();
        match parts.as_slice() {
            [side, _] => return format!("border-{}", side),
            [_] => return "border".to_string(),
            _ => {}
        }
    }
    if name.starts_with("text-") {
        return name.to_string();
    }

    let unprefixed = VENDOR_PREFIX.replace(name, "");
    WORD.find(&unprefixed)
        .map(|word| word.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| name.to_string())
}
