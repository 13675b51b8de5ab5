//! Optimizations that never move or merge tokens.

use crate::context::OptimizeContext;
use crate::properties::value_minifier::minify_values;
use crate::properties::wrap::{unwrap, wrap};
use crate::selectors::clean_up::{clean_at_rule, clean_block_header, clean_selectors};
use crate::tree::css_tree::{Declaration, Selector, Token};

pub fn optimize(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    optimize_list(tokens, false, context);
    hoist_charset(tokens);
}

fn optimize_list(tokens: &mut Vec<Token>, in_keyframes: bool, context: &OptimizeContext) {
    let profile = context.profile();
    tokens.retain_mut(|token| match token {
        Token::Rule(rule) => {
            rule.selectors = clean_selectors(&rule.selectors, profile);
            if in_keyframes {
                rule.selectors = rule.selectors.iter().map(keyframe_selector).collect();
            }
            rule.body = minify_body(&rule.body, context);
            !rule.selectors.is_empty()
        }
        Token::Block(block) => {
            block.header = clean_block_header(&block.header);
            let keyframes = is_keyframes(&block.header);
            optimize_list(&mut block.body, keyframes, context);
            true
        }
        Token::FlatBlock(flat) => {
            flat.header = clean_block_header(&flat.header);
            flat.body = minify_body(&flat.body, context);
            true
        }
        Token::AtRule(text) => {
            *text = clean_at_rule(text);
            true
        }
        Token::Text(_) => true,
    });
}

fn minify_body(body: &[Declaration], context: &OptimizeContext) -> Vec<Declaration> {
    let mut properties = wrap(body, 0);
    minify_values(&mut properties, &context.value_context());
    unwrap(&properties)
}

pub fn is_keyframes(header: &str) -> bool {
    let name = header.split(' ').next().unwrap_or_default().to_ascii_lowercase();
    name == "@keyframes" || (name.starts_with("@-") && name.ends_with("-keyframes"))
}

fn keyframe_selector(selector: &Selector) -> Selector {
    match selector.value.as_str() {
        "from" => Selector::new("0%"),
        "100%" => Selector::new("to"),
        _ => selector.clone(),
    }
}

/// Keeps the first `@charset` only, as the very first token.
fn hoist_charset(tokens: &mut Vec<Token>) {
    let mut charset = None;
    tokens.retain(|token| match token {
        Token::AtRule(text) if text.to_ascii_lowercase().starts_with("@charset") => {
            if charset.is_none() {
                charset = Some(token.clone());
            }
            false
        }
        _ => true,
    });
    if let Some(charset) = charset {
        tokens.insert(0, charset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::CompatibilityProfile;
    use crate::error::Warnings;
    use crate::options::{Limits, Options};
    use crate::text::escape_store::EscapeStores;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn run(css: &str) -> String {
        let stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let mut tokens = tokenize(css, &stores, &mut warnings, &Limits::default()).unwrap();
        let options = Options::default();
        let profile = CompatibilityProfile::modern();
        let context = OptimizeContext::new(&options, &profile);
        optimize(&mut tokens, &context);
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn test_rules_cleaned_and_minified() {
        assert_eq!(run("div  >  p , a { color : #FF0000 ; margin : 0px }"), "a,div>p{color:red;margin:0}");
    }

    #[test]
    fn test_keyframes_selectors() {
        assert_eq!(
            run("@keyframes  spin { from { opacity: 0 } 100% { opacity: 1 } }"),
            "@keyframes spin{0%{opacity:0}to{opacity:1}}"
        );
    }

    #[test]
    fn test_charset_hoisted() {
        assert_eq!(
            run("a{color:red}@charset \"x\";@charset \"y\";"),
            "@charset \"x\";a{color:red}"
        );
    }

    #[test]
    fn test_ie7_only_rule_removed() {
        assert_eq!(run("*+html .a{color:red}.b{color:red}"), ".b{color:red}");
    }
}
