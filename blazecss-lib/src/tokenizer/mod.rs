//! Turns escaped stylesheet text into a tree of [`Token`]s.

pub mod split;

use crate::error::{MinifyError, Warnings};
use crate::options::Limits;
use crate::text::escape_store::{find_placeholders, EscapeHandle, EscapeKind, EscapeStores};
use crate::tree::css_tree::{Block, Declaration, FlatBlock, Rule, Selector, Token};
use split::{find_top_level, split_top_level, split_value};
use std::fmt;

/// At-rules whose body holds declarations rather than rules.
const FLAT_BLOCKS: &[&str] = &[
    "@font-face",
    "@page",
    "@viewport",
    "@-ms-viewport",
    "@-o-viewport",
    "@counter-style",
    "@font-feature-values",
];

/// Where the tokenizer currently is, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub source: Option<String>,
    pub line: usize,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}:{}", source, self.line),
            None => write!(f, "line {}", self.line),
        }
    }
}

/// Tokenizes escaped text. Malformed fragments are dropped with a warning.
pub fn tokenize(
    input: &str,
    stores: &EscapeStores,
    warnings: &mut Warnings,
    limits: &Limits,
) -> Result<Vec<Token>, MinifyError> {
    let mut tokenizer = Tokenizer {
        input,
        cursor: 0,
        line: 1,
        source: None,
        stores,
        warnings,
        max_depth: limits.max_nesting_depth,
    };
    let tokens = tokenizer.tokenize_list(0, false)?;
    log::debug!("tokenized {} top level tokens", tokens.len());
    Ok(tokens)
}

struct Tokenizer<'a, 'w> {
    input: &'a str,
    cursor: usize,
    line: usize,
    source: Option<String>,
    stores: &'a EscapeStores,
    warnings: &'w mut Warnings,
    max_depth: usize,
}

impl<'a, 'w> Tokenizer<'a, 'w> {
    pub fn position(&self) -> SourcePosition {
        SourcePosition {
            source: self.source.clone(),
            line: self.line,
        }
    }

    /// Moves the cursor to `to`, keeping the line count in step.
    fn advance(&mut self, to: usize) {
        let to = to.min(self.input.len());
        let skipped = &self.input[self.cursor..to];
        self.line += skipped.matches('\n').count();
        self.line += find_placeholders(skipped)
            .iter()
            .map(|(handle, _)| handle.lines)
            .sum::<usize>();
        self.cursor = to;
    }

    fn rest(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn check_depth(&self, depth: usize) -> Result<(), MinifyError> {
        if depth > self.max_depth {
            return Err(MinifyError::NestingTooDeep {
                limit: self.max_depth,
                position: self.position().to_string(),
            });
        }
        Ok(())
    }

    fn tokenize_list(&mut self, depth: usize, nested: bool) -> Result<Vec<Token>, MinifyError> {
        let mut tokens = Vec::new();

        loop {
            let trimmed = self.rest().trim_start();
            let skip = self.rest().len() - trimmed.len();
            self.advance(self.cursor + skip);

            let rest = self.rest();
            if rest.is_empty() {
                if nested {
                    self.warnings
                        .push(format!("Missing '}}' at the end of a block at {}.", self.position()));
                }
                return Ok(tokens);
            }

            if rest.starts_with('}') {
                self.advance(self.cursor + 1);
                if nested {
                    return Ok(tokens);
                }
                self.warnings
                    .push(format!("Unexpected '}}' at {}. Ignoring.", self.position()));
                continue;
            }

            if let Some((handle, len)) = EscapeHandle::parse_prefix(rest) {
                match handle.kind {
                    EscapeKind::Comment => {
                        self.advance(self.cursor + len);
                        continue;
                    }
                    EscapeKind::SpecialComment => {
                        tokens.push(Token::Text(rest[..len].to_string()));
                        self.advance(self.cursor + len);
                        continue;
                    }
                    EscapeKind::SourceMarker => {
                        self.advance(self.cursor + len);
                        self.source = self.stores.get(&handle).map(str::to_string);
                        self.line = 1;
                        continue;
                    }
                    _ => {}
                }
            }

            if rest.starts_with('@') {
                self.at_rule(depth, &mut tokens)?;
            } else {
                self.rule(depth, &mut tokens)?;
            }
        }
    }

    fn at_rule(&mut self, depth: usize, tokens: &mut Vec<Token>) -> Result<(), MinifyError> {
        let rest = self.rest();
        match find_top_level(rest, &[';', '{', '}']) {
            None => {
                tokens.push(Token::AtRule(rest.trim().to_string()));
                self.advance(self.input.len());
            }
            Some((idx, ';')) => {
                tokens.push(Token::AtRule(rest[..idx].trim().to_string()));
                self.advance(self.cursor + idx + 1);
            }
            Some((idx, '}')) => {
                tokens.push(Token::AtRule(rest[..idx].trim().to_string()));
                self.advance(self.cursor + idx);
            }
            Some((idx, _)) => {
                let header = rest[..idx].trim().to_string();
                let name = header
                    .split(|ch: char| ch.is_whitespace() || ch == '(')
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                self.advance(self.cursor + idx + 1);
                self.check_depth(depth + 1)?;

                if FLAT_BLOCKS.contains(&name.as_str()) {
                    let (body, comments) = self.body(depth + 1)?;
                    tokens.extend(comments.into_iter().map(Token::Text));
                    tokens.push(Token::FlatBlock(FlatBlock { header, body }));
                } else {
                    let body = self.tokenize_list(depth + 1, true)?;
                    tokens.push(Token::Block(Block { header, body }));
                }
            }
        }
        Ok(())
    }

    fn rule(&mut self, depth: usize, tokens: &mut Vec<Token>) -> Result<(), MinifyError> {
        let rest = self.rest();
        match find_top_level(rest, &['{', '}', ';']) {
            Some((idx, '{')) => {
                let position = self.position();
                let selector_text = strip_comments(&rest[..idx], tokens);
                self.advance(self.cursor + idx + 1);
                let (body, comments) = self.body(depth + 1)?;
                tokens.extend(comments.into_iter().map(Token::Text));

                let selectors: Vec<Selector> = split_top_level(&selector_text, ',')
                    .into_iter()
                    .map(str::trim)
                    .filter(|selector| !selector.is_empty())
                    .map(Selector::new)
                    .collect();
                if selectors.is_empty() {
                    self.warnings
                        .push(format!("Empty selector at {}. Ignoring.", position));
                    return Ok(());
                }
                tokens.push(Token::Rule(Rule::new(selectors, body)));
            }
            Some((idx, ch)) => {
                self.warnings.push(format!(
                    "Invalid selector '{}' at {}. Ignoring.",
                    rest[..idx].trim(),
                    self.position()
                ));
                let consumed = if ch == ';' { idx + 1 } else { idx };
                self.advance(self.cursor + consumed);
            }
            None => {
                self.warnings.push(format!(
                    "Invalid trailing text '{}' at {}. Ignoring.",
                    rest.trim(),
                    self.position()
                ));
                self.advance(self.input.len());
            }
        }
        Ok(())
    }

    /// Reads a declaration body up to its closing brace.
    ///
    /// Returns the declarations and any special comments found inside, which
    /// the caller keeps next to the owning token.
    fn body(&mut self, depth: usize) -> Result<(Vec<Declaration>, Vec<String>), MinifyError> {
        let rest = self.rest();
        let position = self.position();
        let mut braces = 0usize;
        let mut end = None;
        for (idx, ch) in rest.char_indices() {
            match ch {
                '{' => braces += 1,
                '}' if braces == 0 => {
                    end = Some(idx);
                    break;
                }
                '}' => braces -= 1,
                _ => {}
            }
        }

        let body_text = match end {
            Some(idx) => {
                self.advance(self.cursor + idx + 1);
                &rest[..idx]
            }
            None => {
                self.warnings
                    .push(format!("Missing '}}' after '{}' at {}.", rest.trim(), position));
                self.advance(self.input.len());
                rest
            }
        };

        let mut comments = Vec::new();
        let declarations = self.declarations(body_text, depth, &position, &mut comments)?;
        Ok((declarations, comments))
    }

    fn declarations(
        &mut self,
        body_text: &str,
        depth: usize,
        position: &SourcePosition,
        comments: &mut Vec<String>,
    ) -> Result<Vec<Declaration>, MinifyError> {
        let mut declarations = Vec::new();

        for part in split_top_level(body_text, ';') {
            let mut hoisted = Vec::new();
            let part = strip_comment_placeholders(part, &mut hoisted);
            comments.extend(hoisted);
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (colon, _) = match find_top_level(part, &[':']) {
                Some(found) => found,
                None => {
                    self.warnings.push(format!(
                        "Invalid property name '{}' at {}. Ignoring.",
                        part, position
                    ));
                    continue;
                }
            };

            let name = part[..colon].trim();
            let value_text = part[colon + 1..].trim();
            if name.is_empty() {
                self.warnings.push(format!(
                    "Empty property name in '{}' at {}. Ignoring.",
                    part, position
                ));
                continue;
            }

            if name.starts_with("--") && value_text.starts_with('{') && value_text.ends_with('}') {
                self.check_depth(depth + 1)?;
                let inner = &value_text[1..value_text.len() - 1];
                let block = self.declarations(inner, depth + 1, position, comments)?;
                declarations.push(Declaration {
                    name: name.to_string(),
                    value: Vec::new(),
                    block: Some(block),
                });
                continue;
            }

            declarations.push(Declaration::new(name, split_value(value_text)));
        }

        Ok(declarations)
    }
}

/// Drops regular comment placeholders from `text`, moving special ones to `hoisted`.
fn strip_comment_placeholders(text: &str, hoisted: &mut Vec<String>) -> String {
    let mut out = text.to_string();
    for (handle, range) in find_placeholders(text).into_iter().rev() {
        match handle.kind {
            EscapeKind::Comment => out.replace_range(range, " "),
            EscapeKind::SpecialComment => {
                hoisted.insert(0, text[range.clone()].to_string());
                out.replace_range(range, " ");
            }
            _ => {}
        }
    }
    out
}

fn strip_comments(text: &str, tokens: &mut Vec<Token>) -> String {
    let mut hoisted = Vec::new();
    let stripped = strip_comment_placeholders(text, &mut hoisted);
    tokens.extend(hoisted.into_iter().map(Token::Text));
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::escaper::escape;

    fn run(css: &str) -> (Vec<Token>, Warnings) {
        let mut stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let escaped = escape(css, &mut stores, &mut warnings);
        let tokens = tokenize(&escaped, &stores, &mut warnings, &Limits::default()).unwrap();
        (tokens, warnings)
    }

    fn rule(token: &Token) -> &Rule {
        match token {
            Token::Rule(rule) => rule,
            other => panic!("expected a rule, got {:?}", other),
        }
    }

    #[test]
    fn test_rules_and_declarations() {
        let (tokens, warnings) = run("a, b { color : red ; margin:0 auto }");
        assert!(warnings.is_empty());
        assert_eq!(tokens.len(), 1);
        let rule = rule(&tokens[0]);
        assert_eq!(rule.selectors, vec![Selector::new("a"), Selector::new("b")]);
        assert_eq!(rule.body[1].value, vec!["0", "auto"]);
    }

    #[test]
    fn test_blocks_flat_blocks_and_at_rules() {
        let (tokens, _) = run(
            "@charset 'utf-8';@media screen{a{color:red}}@font-face{font-family:x;src:url(a.woff)}",
        );
        assert!(matches!(tokens[0], Token::AtRule(_)));
        match &tokens[1] {
            Token::Block(block) => {
                assert_eq!(block.header, "@media screen");
                assert_eq!(block.body.len(), 1);
            }
            other => panic!("expected a block, got {:?}", other),
        }
        assert!(matches!(tokens[2], Token::FlatBlock(_)));
    }

    #[test]
    fn test_custom_property_block() {
        let (tokens, _) = run(":root{--mixin:{color:red;top:0};color:blue}");
        let rule = rule(&tokens[0]);
        assert_eq!(rule.body.len(), 2);
        assert_eq!(rule.body[0].block.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_malformed_input_is_dropped_with_warnings() {
        let (tokens, warnings) = run("}a{color:red}b{colour}c{top:0");
        assert_eq!(tokens.len(), 3);
        assert!(rule(&tokens[1]).body.is_empty());
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_special_comments_are_kept_as_text() {
        let (tokens, _) = run("/*! keep */a{/* drop */color:red/*! inner */}");
        assert!(matches!(tokens[0], Token::Text(_)));
        assert!(matches!(tokens[1], Token::Text(_)));
        assert_eq!(rule(&tokens[2]).body.len(), 1);
    }

    #[test]
    fn test_line_tracking_in_warnings() {
        let (_, warnings) = run("a{color:red}\n/* x\ny */\n}");
        assert_eq!(
            warnings.iter().next().map(String::as_str),
            Some("Unexpected '}' at line 4. Ignoring.")
        );
    }

    #[test]
    fn test_nesting_limit() {
        let stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let css = "@media a{".repeat(5);
        let limits = Limits {
            max_nesting_depth: 3,
            ..Limits::default()
        };
        let result = tokenize(&css, &stores, &mut warnings, &limits);
        assert!(matches!(result, Err(MinifyError::NestingTooDeep { .. })));
    }
}
