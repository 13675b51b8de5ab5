pub mod advanced;
pub mod clean_up;
pub mod extractor;
pub mod reorderable;
pub mod restructure;
pub mod simple;

use crate::tree::css_tree::Token;

/// Drops rules and flat blocks without declarations, then blocks left empty.
pub fn remove_empty(tokens: &mut Vec<Token>) {
    tokens.retain_mut(|token| match token {
        Token::Rule(rule) => !rule.body.is_empty(),
        Token::FlatBlock(flat) => !flat.body.is_empty(),
        Token::Block(block) => {
            remove_empty(&mut block.body);
            !block.body.is_empty()
        }
        Token::AtRule(_) | Token::Text(_) => true,
    });
}
