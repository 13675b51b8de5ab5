//! Whitespace and legacy-hack cleanup of selectors and at-rule headers.

use crate::compatibility::CompatibilityProfile;
use crate::tree::css_tree::Selector;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static SPACE_AROUND_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?, ?").expect("valid comma pattern"));
static COMBINATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([>+~])\s*").expect("valid combinator pattern"));
static REDUNDANT_STAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\s>+~(,])\*([.#:\[])").expect("valid universal pattern"));
static ADJACENT_NAV: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+nav(\S|$)").expect("valid nav pattern"));
static SPACE_AFTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([,:(]) ").expect("valid header pattern"));
static MEDIA_FEATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*([\w-]+)\s*:\s*").expect("valid media feature pattern"));

const IE7_HACKS: &[&str] = &["*+html ", "*:first-child+html "];

/// Normalizes, deduplicates and sorts a selector list.
pub fn clean_selectors(selectors: &[Selector], profile: &CompatibilityProfile) -> Vec<Selector> {
    let mut cleaned: Vec<Selector> = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let value = clean_selector(&selector.value, profile);
        if !profile.selectors.ie7_hack && IE7_HACKS.iter().any(|hack| value.contains(hack)) {
            continue;
        }
        let selector = Selector::new(value);
        if !cleaned.contains(&selector) {
            cleaned.push(selector);
        }
    }
    cleaned.sort();
    cleaned
}

fn clean_selector(value: &str, profile: &CompatibilityProfile) -> String {
    let reduced = WHITESPACE.replace_all(value.trim(), " ");
    let reduced = SPACE_AROUND_COMMA.replace_all(&reduced, ",");
    let reduced = COMBINATOR.replace_all(&reduced, "$1");
    let mut reduced = REDUNDANT_STAR.replace_all(&reduced, "$1$2").into_owned();
    if profile.selectors.adjacent_space && reduced.find("nav").is_some_and(|at| at > 0) {
        reduced = ADJACENT_NAV.replace(&reduced, "+ nav$1").into_owned();
    }
    reduced
}

/// Header of a block such as `@media screen and (max-width : 10px)`.
pub fn clean_block_header(header: &str) -> String {
    let collapsed = WHITESPACE.replace_all(header.trim(), " ");
    let collapsed = MEDIA_FEATURE.replace_all(&collapsed, "($1:");
    let collapsed = SPACE_AROUND_COMMA.replace_all(&collapsed, ",");
    SPACE_AFTER.replace_all(&collapsed, "$1").replace(" )", ")")
}

/// A single statement at-rule such as `@import url(a.css)  screen`.
pub fn clean_at_rule(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean(values: &[&str], profile: &CompatibilityProfile) -> Vec<String> {
        let selectors: Vec<Selector> = values.iter().map(|value| Selector::new(*value)).collect();
        clean_selectors(&selectors, profile)
            .into_iter()
            .map(|selector| selector.value)
            .collect()
    }

    #[test]
    fn test_whitespace_and_combinators() {
        let profile = CompatibilityProfile::modern();
        assert_eq!(clean(&["div  >  p", "a\n  b", "a ~ b + c"], &profile), vec!["a b", "a~b+c", "div>p"]);
        assert_eq!(clean(&["li:nth-child( 2n + 1 )"], &profile), vec!["li:nth-child( 2n+1 )"]);
    }

    #[test]
    fn test_universal_and_duplicates() {
        let profile = CompatibilityProfile::modern();
        assert_eq!(clean(&["*.a", "div *#b", "*", "*.a"], &profile), vec!["*", ".a", "div #b"]);
        assert_eq!(clean(&["[class*=x]"], &profile), vec!["[class*=x]"]);
    }

    #[test]
    fn test_ie7_hacks() {
        assert_eq!(clean(&["*+html .a", ".b"], &CompatibilityProfile::modern()), vec![".b"]);
        assert_eq!(clean(&["*+html .a"], &CompatibilityProfile::ie7()), vec!["*+html .a"]);
    }

    #[test]
    fn test_headers() {
        assert_eq!(
            clean_block_header("@media screen and ( max-width : 100px ) ,\n print"),
            "@media screen and (max-width:100px),print"
        );
        assert_eq!(clean_at_rule("@import  url(a.css)\n screen"), "@import url(a.css) screen");
    }
}
