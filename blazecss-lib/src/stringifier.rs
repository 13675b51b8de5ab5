//! Writes the optimized token tree back out as compact text.

use crate::compatibility::CompatibilityProfile;
use crate::options::Options;
use crate::text::escape_store::EscapeStores;
use crate::text::restorer::{RestoreContext, Restorer};
use crate::tree::css_tree::{Declaration, Selector, Token};

/// Values where `)` may be glued to the next fragment.
const TIGHT_AFTER_BRACE: &[&str] = &["background", "transform", "src"];

pub struct Stringifier<'a> {
    restorer: Restorer<'a>,
    keep_breaks: bool,
    space_after_closing_brace: bool,
}

impl<'a> Stringifier<'a> {
    pub fn new(stores: &'a EscapeStores, options: &Options, profile: &CompatibilityProfile) -> Self {
        Stringifier {
            restorer: Restorer::new(stores, profile.properties.url_quotes, options.keep_special_comments),
            keep_breaks: options.keep_breaks,
            space_after_closing_brace: profile.properties.space_after_closing_brace,
        }
    }

    pub fn stringify(mut self, tokens: &[Token]) -> String {
        let mut pieces = Vec::with_capacity(tokens.len());
        for token in tokens {
            let mut piece = String::new();
            self.write_token(token, &mut piece);
            if !piece.is_empty() {
                pieces.push(piece);
            }
        }
        pieces.join(if self.keep_breaks { "\n" } else { "" })
    }

    fn write_token(&mut self, token: &Token, out: &mut String) {
        match token {
            Token::Rule(rule) => {
                out.push_str(&self.selectors(&rule.selectors));
                out.push('{');
                self.write_body(&rule.body, out);
                out.push('}');
            }
            Token::Block(block) => {
                out.push_str(&self.restorer.restore(&block.header, RestoreContext::BlockHeader));
                out.push('{');
                for token in &block.body {
                    self.write_token(token, out);
                }
                out.push('}');
            }
            Token::FlatBlock(flat) => {
                out.push_str(&self.restorer.restore(&flat.header, RestoreContext::BlockHeader));
                out.push('{');
                self.write_body(&flat.body, out);
                out.push('}');
            }
            Token::AtRule(text) => {
                out.push_str(&self.restorer.restore(text, RestoreContext::AtRule));
                out.push(';');
            }
            Token::Text(text) => {
                if let Some(comment) = self.restorer.restore_comment(text) {
                    out.push_str(&comment);
                }
            }
        }
    }

    fn selectors(&self, selectors: &[Selector]) -> String {
        selectors
            .iter()
            .map(|selector| self.restorer.restore(&selector.value, RestoreContext::Selector))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn write_body(&self, body: &[Declaration], out: &mut String) {
        for (idx, declaration) in body.iter().enumerate() {
            if idx > 0 {
                out.push(';');
            }
            out.push_str(&declaration.name);
            out.push(':');
            match &declaration.block {
                Some(block) => {
                    out.push('{');
                    self.write_body(block, out);
                    out.push('}');
                }
                None => out.push_str(&self.value(&declaration.name, &declaration.value)),
            }
        }
    }

    fn value(&self, name: &str, value: &[String]) -> String {
        let tight = !self.space_after_closing_brace && TIGHT_AFTER_BRACE.contains(&name);
        let mut out = String::new();
        let mut previous: Option<String> = None;

        for fragment in value {
            let restored = self.restorer.restore(fragment, RestoreContext::Property(name));
            if restored.is_empty() {
                continue;
            }
            if let Some(previous) = &previous {
                let separator = |text: &str| text == "," || text == "/";
                let glued = tight && previous.ends_with(')');
                if !separator(previous) && !separator(&restored) && !glued {
                    out.push(' ');
                }
            }
            out.push_str(&restored);
            previous = Some(restored);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warnings;
    use crate::options::Limits;
    use crate::text::escaper::escape;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn roundtrip(css: &str, options: &Options, profile: &CompatibilityProfile) -> String {
        let mut stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let escaped = escape(css, &mut stores, &mut warnings);
        let tokens = tokenize(&escaped, &stores, &mut warnings, &Limits::default()).unwrap();
        Stringifier::new(&stores, options, profile).stringify(&tokens)
    }

    #[test]
    fn test_restores_escaped_text() {
        let profile = CompatibilityProfile::modern();
        assert_eq!(
            roundtrip("a{background:url('a.png');content:\"x\"}", &Options::default(), &profile),
            "a{background:url(a.png);content:\"x\"}"
        );
    }

    #[test]
    fn test_comments() {
        let profile = CompatibilityProfile::modern();
        let css = "/*! one */a{color:red/* gone */}/*! two */";
        assert_eq!(roundtrip(css, &Options::default(), &profile), "/*! one */a{color:red}/*! two */");

        let options = Options {
            keep_special_comments: crate::options::KeepSpecialComments::First,
            ..Options::default()
        };
        assert_eq!(roundtrip(css, &options, &profile), "/*! one */a{color:red}");
    }

    #[test]
    fn test_keep_breaks() {
        let options = Options {
            keep_breaks: true,
            ..Options::default()
        };
        let profile = CompatibilityProfile::modern();
        assert_eq!(roundtrip("a{color:red}b{color:blue}", &options, &profile), "a{color:red}\nb{color:blue}");
    }

    #[test]
    fn test_closing_brace_spacing() {
        let mut profile = CompatibilityProfile::modern();
        profile.properties.space_after_closing_brace = false;
        assert_eq!(
            roundtrip("a{background:url(a.png) no-repeat}", &Options::default(), &profile),
            "a{background:url(a.png)no-repeat}"
        );
    }
}
