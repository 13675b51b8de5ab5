use std::fmt;

pub mod css_tree {
    use super::*;

    /// One structural unit of a stylesheet.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Token {
        /// `a, b { color: red }`
        Rule(Rule),
        /// `@media`, `@supports`, `@keyframes`, `@document`, ... wrapping other tokens.
        Block(Block),
        /// `@font-face`, `@page`, ... holding declarations directly.
        FlatBlock(FlatBlock),
        /// Single statement at-rules like `@import` or `@charset`, without the `;`.
        AtRule(String),
        /// A preserved special comment placeholder.
        Text(String),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Rule {
        pub selectors: Vec<Selector>,
        pub body: Vec<Declaration>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Block {
        pub header: String,
        pub body: Vec<Token>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct FlatBlock {
        pub header: String,
        pub body: Vec<Declaration>,
    }

    /// A single selector of a rule's selector list, e.g. "div > .red".
    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Selector {
        pub value: String,
    }

    /// A raw declaration as it appears in a body.
    ///
    /// `value` holds the value split into fragments; `,` and `/` separators are
    /// fragments of their own. Importance and hacks are still part of the raw
    /// text here and only get interpreted once the declaration is wrapped for
    /// optimizing.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Declaration {
        pub name: String,
        pub value: Vec<String>,
        /// Block value of a custom property, e.g. `--mixin: { color: red }`.
        pub block: Option<Vec<Declaration>>,
    }

    impl Selector {
        pub fn new(value: impl Into<String>) -> Self {
            Selector {
                value: value.into(),
            }
        }

        /// Splits the selector into compound parts joined by combinators.
        ///
        /// Used for overlap tests only, so attribute and pseudo-class arguments
        /// are kept glued to their compound.
        pub fn parts(&self) -> Vec<&str> {
            let mut parts = Vec::new();
            let mut depth = 0usize;
            let mut start = 0usize;
            for (idx, ch) in self.value.char_indices() {
                match ch {
                    '(' | '[' => depth += 1,
                    ')' | ']' => depth = depth.saturating_sub(1),
                    ' ' | '>' | '+' | '~' if depth == 0 => {
                        if start < idx {
                            parts.push(&self.value[start..idx]);
                        }
                        start = idx + ch.len_utf8();
                    }
                    _ => {}
                }
            }
            if start < self.value.len() {
                parts.push(&self.value[start..]);
            }
            parts
        }
    }

    impl Declaration {
        pub fn new(name: impl Into<String>, value: Vec<String>) -> Self {
            Declaration {
                name: name.into(),
                value,
                block: None,
            }
        }
    }

    impl Rule {
        pub fn new(selectors: Vec<Selector>, body: Vec<Declaration>) -> Self {
            Rule { selectors, body }
        }

        pub fn selectors_as_string(&self) -> String {
            selectors_to_string(&self.selectors)
        }
    }

    pub fn selectors_to_string(selectors: &[Selector]) -> String {
        selectors
            .iter()
            .map(|selector| selector.value.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Joins value fragments back into text, with no spaces around `,` and `/`.
    pub fn value_to_string(value: &[String]) -> String {
        let mut out = String::new();
        for (idx, fragment) in value.iter().enumerate() {
            if idx > 0 {
                let previous = &value[idx - 1];
                if fragment != "," && fragment != "/" && previous != "," && previous != "/" {
                    out.push(' ');
                }
            }
            out.push_str(fragment);
        }
        out
    }

    pub fn declaration_to_string(declaration: &Declaration) -> String {
        match &declaration.block {
            Some(block) => format!("{}:{{{}}}", declaration.name, body_to_string(block)),
            None => format!("{}:{}", declaration.name, value_to_string(&declaration.value)),
        }
    }

    /// Serializes a body for equality checks between rules.
    pub fn body_to_string(body: &[Declaration]) -> String {
        body.iter()
            .map(declaration_to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

use css_tree::{body_to_string, Declaration, Rule, Token};

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.selectors_as_string(), body_to_string(&self.body))
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&css_tree::declaration_to_string(self))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Rule(rule) => write!(f, "{}", rule),
            Token::Block(block) => {
                write!(f, "{}{{", block.header)?;
                for token in &block.body {
                    write!(f, "{}", token)?;
                }
                f.write_str("}")
            }
            Token::FlatBlock(flat) => write!(f, "{}{{{}}}", flat.header, body_to_string(&flat.body)),
            Token::AtRule(text) => write!(f, "{};", text),
            Token::Text(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::css_tree::*;

    #[test]
    fn test_value_to_string_separators() {
        let value: Vec<String> = ["12px", "/", "1.5", "Arial", ",", "serif"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(value_to_string(&value), "12px/1.5 Arial,serif");
    }

    #[test]
    fn test_selector_parts() {
        let selector = Selector::new("div>.red a:not(.x .y)");
        assert_eq!(selector.parts(), vec!["div", ".red", "a:not(.x .y)"]);
    }

    #[test]
    fn test_rule_display() {
        let rule = Rule::new(
            vec![Selector::new("a"), Selector::new("b")],
            vec![Declaration::new("color", vec!["red".to_string()])],
        );
        assert_eq!(rule.to_string(), "a,b{color:red}");
    }
}
