//! Passes that merge, move and reduce rules across a token list.
//!
//! Every move is gated on [`can_reorder`], so the cascade seen by any element
//! stays the same. Rules are emptied in place while a pass runs and dropped
//! once it is done, which keeps indices stable within a pass.

use crate::context::OptimizeContext;
use crate::properties::optimizer::{optimize_body, optimize_properties};
use crate::properties::wrap::{unwrap_origin, wrap};
use crate::selectors::clean_up::clean_selectors;
use crate::selectors::extractor::extract;
use crate::selectors::remove_empty;
use crate::selectors::reorderable::can_reorder;
use crate::selectors::restructure::restructure;
use crate::selectors::simple::is_keyframes;
use crate::tree::css_tree::{body_to_string, Declaration, Rule, Token};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static SEMANTIC_BARRIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.*:]").expect("valid barrier pattern"));

pub fn optimize(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    optimize_level(tokens, true, context);
}

fn optimize_level(tokens: &mut Vec<Token>, with_restructuring: bool, context: &OptimizeContext) {
    for token in tokens.iter_mut() {
        match token {
            Token::Rule(rule) => rule.body = optimize_body(&rule.body, &[], context),
            Token::FlatBlock(flat) => flat.body = optimize_body(&flat.body, &[], context),
            Token::Block(block) => {
                let restructurable = !is_keyframes(&block.header);
                optimize_level(&mut block.body, restructurable, context);
            }
            Token::AtRule(_) | Token::Text(_) => {}
        }
    }

    remove_duplicates(tokens);
    merge_adjacent(tokens, context);
    reduce_non_adjacent(tokens, context);
    merge_non_adjacent_by_selector(tokens, context);
    merge_non_adjacent_by_body(tokens, context);

    if with_restructuring && context.options.restructuring {
        restructure(tokens, context);
        merge_adjacent(tokens, context);
    }

    if context.options.media_merging {
        remove_empty(tokens);
        for index in merge_media_queries(tokens) {
            if let Token::Block(block) = &mut tokens[index] {
                optimize_level(&mut block.body, false, context);
            }
        }
    }

    remove_empty(tokens);
    log::debug!("advanced pass left {} tokens", tokens.len());
}

fn rule_at(tokens: &[Token], index: usize) -> Option<&Rule> {
    match tokens.get(index) {
        Some(Token::Rule(rule)) => Some(rule),
        _ => None,
    }
}

fn rule_at_mut(tokens: &mut [Token], index: usize) -> Option<&mut Rule> {
    match tokens.get_mut(index) {
        Some(Token::Rule(rule)) => Some(rule),
        _ => None,
    }
}

/// Both tokens mutably, `first < second`.
fn pair_mut(tokens: &mut [Token], first: usize, second: usize) -> (&mut Token, &mut Token) {
    let (head, tail) = tokens.split_at_mut(second);
    (&mut head[first], &mut tail[0])
}

fn live_rule(tokens: &[Token], index: usize) -> Option<&Rule> {
    rule_at(tokens, index).filter(|rule| !rule.body.is_empty())
}

fn is_special(rule: &Rule, context: &OptimizeContext) -> bool {
    context.profile().is_special_selector(&rule.selectors_as_string())
}

fn merged_body(first: &[Declaration], second: &[Declaration], context: &OptimizeContext) -> Vec<Declaration> {
    let mut body = Vec::with_capacity(first.len() + second.len());
    body.extend_from_slice(first);
    body.extend_from_slice(second);
    optimize_body(&body, &[first.len()], context)
}

/// Whether the token at `moved` may travel past every token strictly between
/// `from` and `to`. Moving down checks the moved token first.
fn can_travel(tokens: &[Token], moved: usize, from: usize, to: usize, downwards: bool) -> bool {
    let moved = extract(&tokens[moved]);
    (from + 1..to).all(|between| {
        let traversed = extract(&tokens[between]);
        if downwards {
            can_reorder(&moved, &traversed)
        } else {
            can_reorder(&traversed, &moved)
        }
    })
}

/// Groups token indices by a key, keeping first-seen order.
struct Groups<T> {
    order: Vec<String>,
    entries: HashMap<String, Vec<T>>,
}

impl<T> Default for Groups<T> {
    fn default() -> Self {
        Groups {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T> Groups<T> {
    fn push(&mut self, key: String, value: T) {
        match self.entries.get_mut(&key) {
            Some(values) => values.push(value),
            None => {
                self.order.push(key.clone());
                self.entries.insert(key, vec![value]);
            }
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &Vec<T>)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|values| (key.as_str(), values)))
    }
}

/// Keeps only the last of identical rules.
fn remove_duplicates(tokens: &mut Vec<Token>) {
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if let Token::Rule(rule) = token {
            let id = format!("{}@{}", body_to_string(&rule.body), rule.selectors_as_string());
            if let Some(previous) = last_seen.insert(id, index) {
                duplicates.push(previous);
            }
        }
    }

    for index in &duplicates {
        if let Some(rule) = rule_at_mut(tokens, *index) {
            rule.body.clear();
        }
    }
    log::trace!("removed {} duplicate rules", duplicates.len());
    remove_empty(tokens);
}

/// Joins neighbours sharing selectors, or sharing a body when neither side
/// holds a special selector. Anything but a rule breaks adjacency.
fn merge_adjacent(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    let mut last: Option<usize> = None;

    for index in 0..tokens.len() {
        match &tokens[index] {
            Token::Rule(rule) if rule.body.is_empty() => continue,
            Token::Rule(_) => {}
            _ => {
                last = None;
                continue;
            }
        }
        let Some(previous) = last else {
            last = Some(index);
            continue;
        };
        let (Token::Rule(earlier), Token::Rule(later)) = pair_mut(tokens, previous, index) else {
            last = Some(index);
            continue;
        };

        if earlier.selectors == later.selectors {
            earlier.body = merged_body(&earlier.body, &later.body, context);
            later.body.clear();
            log::trace!("merged adjacent `{}` by selector", earlier.selectors_as_string());
        } else if body_to_string(&earlier.body) == body_to_string(&later.body)
            && !is_special(earlier, context)
            && !is_special(later, context)
        {
            let mut selectors = earlier.selectors.clone();
            selectors.extend(later.selectors.iter().cloned());
            earlier.selectors = clean_selectors(&selectors, context.profile());
            later.body.clear();
            log::trace!("merged adjacent `{}` by body", earlier.selectors_as_string());
        } else {
            last = Some(index);
        }
    }
    remove_empty(tokens);
}

#[derive(Debug, Clone, Copy)]
struct Occurrence {
    index: usize,
    /// Registered for one selector of a multi-selector rule.
    partial: bool,
    /// A multi-selector rule without special selectors.
    complex: bool,
}

/// Drops declarations that a later rule with the same selector overrides
/// anyway, without moving any rule.
fn reduce_non_adjacent(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    let mut candidates: Groups<Occurrence> = Groups::default();
    for index in 0..tokens.len() {
        let Some(rule) = live_rule(tokens, index) else {
            continue;
        };
        let joined = rule.selectors_as_string();
        let complex = rule.selectors.len() > 1 && !is_special(rule, context);
        candidates.push(joined, Occurrence { index, partial: false, complex });
        if complex {
            for selector in &rule.selectors {
                candidates.push(selector.value.clone(), Occurrence { index, partial: true, complex: false });
            }
        }
    }

    for (_, occurrences) in candidates.iter() {
        let Some(start) = occurrences.iter().position(|occurrence| !occurrence.partial) else {
            continue;
        };
        let group = &occurrences[start..];
        if group.len() < 2 {
            continue;
        }
        let bodies = reduce_group(tokens, group, context);
        for (occurrence, body) in group.iter().zip(bodies) {
            if occurrence.partial {
                continue;
            }
            if let Some(rule) = rule_at_mut(tokens, occurrence.index) {
                rule.body = body;
            }
        }
    }

    for (_, occurrences) in candidates.iter() {
        let Some(first) = occurrences.first().filter(|first| first.complex) else {
            continue;
        };
        let into = first.index;
        let Some(rule) = live_rule(tokens, into) else {
            continue;
        };
        let parts = rule.selectors.clone();

        let mut reduced: Option<Vec<Declaration>> = None;
        let mut consistent = true;
        for part in &parts {
            let group: Vec<Occurrence> = candidates
                .entries
                .get(&part.value)
                .map(|all| all.iter().copied().filter(|occurrence| occurrence.index >= into).collect())
                .unwrap_or_default();
            if group.len() < 2 {
                consistent = false;
                break;
            }
            let Some(body) = reduce_group(tokens, &group, context).into_iter().next() else {
                consistent = false;
                break;
            };
            match &reduced {
                Some(previous) if body_to_string(previous) != body_to_string(&body) => {
                    consistent = false;
                    break;
                }
                Some(_) => {}
                None => reduced = Some(body),
            }
        }

        if let (true, Some(body)) = (consistent, reduced) {
            if let Some(rule) = rule_at_mut(tokens, into) {
                rule.body = body;
            }
        }
    }
    remove_empty(tokens);
}

/// Optimizes the bodies of a group together, one origin per occurrence, and
/// splits the result back per occurrence.
fn reduce_group(tokens: &[Token], group: &[Occurrence], context: &OptimizeContext) -> Vec<Vec<Declaration>> {
    let mut properties = Vec::new();
    let mut joins = Vec::new();
    for (origin, occurrence) in group.iter().enumerate() {
        if let Some(rule) = rule_at(tokens, occurrence.index) {
            if origin > 0 {
                joins.push(properties.len());
            }
            properties.extend(wrap(&rule.body, origin));
        }
    }
    optimize_properties(&mut properties, &joins, false, context);
    (0..group.len()).map(|origin| unwrap_origin(&properties, origin)).collect()
}

/// Joins rules with equal selectors that are separated by other tokens.
fn merge_non_adjacent_by_selector(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    let mut groups: Groups<usize> = Groups::default();
    for index in 0..tokens.len() {
        if let Some(rule) = live_rule(tokens, index) {
            groups.push(rule.selectors_as_string(), index);
        }
    }

    for (selector, indices) in groups.iter() {
        let Some((&last, rest)) = indices.split_last() else {
            continue;
        };
        let mut later = last;
        for &earlier in rest.iter().rev() {
            if live_rule(tokens, earlier).is_none() || live_rule(tokens, later).is_none() {
                later = earlier;
                continue;
            }

            if can_travel(tokens, earlier, earlier, later, true) {
                let (Token::Rule(top), Token::Rule(bottom)) = pair_mut(tokens, earlier, later) else {
                    continue;
                };
                bottom.body = merged_body(&top.body, &bottom.body, context);
                top.body.clear();
                log::trace!("moved `{}` down to its namesake", selector);
            } else if can_travel(tokens, later, earlier, later, false) {
                let (Token::Rule(top), Token::Rule(bottom)) = pair_mut(tokens, earlier, later) else {
                    continue;
                };
                top.body = merged_body(&top.body, &bottom.body, context);
                bottom.body.clear();
                log::trace!("moved `{}` up to its namesake", selector);
                later = earlier;
            } else {
                later = earlier;
            }
        }
    }
    remove_empty(tokens);
}

/// Joins rules with equal bodies that are separated by other tokens. The
/// later rule's selectors move up into the earlier one.
fn merge_non_adjacent_by_body(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    let mut candidates: HashMap<String, usize> = HashMap::new();

    for index in (0..tokens.len()).rev() {
        let Some(rule) = live_rule(tokens, index) else {
            continue;
        };
        if !context.options.semantic_merging && SEMANTIC_BARRIER.is_match(&rule.selectors_as_string()) {
            candidates.clear();
        }
        let body = body_to_string(&rule.body);

        if let Some(&later) = candidates.get(&body) {
            let mergeable = match (rule_at(tokens, index), live_rule(tokens, later)) {
                (Some(earlier), Some(other)) => !is_special(earlier, context) && !is_special(other, context),
                _ => false,
            };
            if mergeable && can_travel(tokens, later, index, later, false) {
                if let (Token::Rule(earlier), Token::Rule(other)) = pair_mut(tokens, index, later) {
                    let mut selectors = earlier.selectors.clone();
                    selectors.extend(other.selectors.iter().cloned());
                    earlier.selectors = clean_selectors(&selectors, context.profile());
                    other.body.clear();
                    log::trace!("merged `{}` by body", earlier.selectors_as_string());
                }
            }
        }
        candidates.insert(body, index);
    }
    remove_empty(tokens);
}

/// Joins `@media` blocks with identical headers. Returns the indices of the
/// blocks that received content; emptied blocks stay in place until the
/// caller removes them.
fn merge_media_queries(tokens: &mut [Token]) -> Vec<usize> {
    let mut groups: Groups<usize> = Groups::default();
    for (index, token) in tokens.iter().enumerate() {
        if let Token::Block(block) = token {
            if block.header.to_ascii_lowercase().starts_with("@media") {
                groups.push(block.header.clone(), index);
            }
        }
    }

    let mut merged = Vec::new();
    for (header, indices) in groups.iter() {
        let Some((&last, rest)) = indices.split_last() else {
            continue;
        };
        let mut later = last;
        for &earlier in rest.iter().rev() {
            if can_travel(tokens, earlier, earlier, later, true) {
                if let (Token::Block(top), Token::Block(bottom)) = pair_mut(tokens, earlier, later) {
                    let mut body = std::mem::take(&mut top.body);
                    body.append(&mut bottom.body);
                    bottom.body = body;
                    merged.push(later);
                }
            } else if can_travel(tokens, later, earlier, later, false) {
                if let (Token::Block(top), Token::Block(bottom)) = pair_mut(tokens, earlier, later) {
                    top.body.append(&mut bottom.body);
                    merged.push(earlier);
                }
                later = earlier;
            } else {
                later = earlier;
            }
        }
        log::trace!("merged `{}` blocks", header);
    }

    merged.sort_unstable();
    merged.dedup();
    merged.retain(|index| matches!(&tokens[*index], Token::Block(block) if !block.body.is_empty()));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compatibility::CompatibilityProfile;
    use crate::error::Warnings;
    use crate::options::{Limits, Options};
    use crate::selectors::simple;
    use crate::text::escape_store::EscapeStores;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn run_with(options: &Options, css: &str) -> String {
        let stores = EscapeStores::default();
        let mut warnings = Warnings::new();
        let mut tokens = tokenize(css, &stores, &mut warnings, &Limits::default()).unwrap();
        let profile = CompatibilityProfile::modern();
        let context = OptimizeContext::new(options, &profile);
        simple::optimize(&mut tokens, &context);
        optimize(&mut tokens, &context);
        tokens.iter().map(|token| token.to_string()).collect()
    }

    fn run(css: &str) -> String {
        run_with(&Options::default(), css)
    }

    #[test]
    fn test_duplicate_rules_then_body_merge() {
        assert_eq!(run("a{color:red} b{color:red} a{color:red}"), "a,b{color:red}");
    }

    #[test]
    fn test_adjacent_same_selector() {
        assert_eq!(run("a{color:red}a{display:block}"), "a{color:red;display:block}");
    }

    #[test]
    fn test_adjacent_special_selector_kept_apart() {
        assert_eq!(
            run("a{color:red}::-webkit-scrollbar{color:red}"),
            "a{color:red}::-webkit-scrollbar{color:red}"
        );
    }

    #[test]
    fn test_non_adjacent_selector_moves_down() {
        assert_eq!(run("a{margin:0}b{color:red}a{padding:0}"), "b{color:red}a{margin:0;padding:0}");
    }

    #[test]
    fn test_non_adjacent_selector_moves_up_when_down_is_blocked() {
        assert_eq!(
            run(".a{color:red}.b{color:blue}.a{display:block}"),
            ".a{color:red;display:block}.b{color:blue}"
        );
    }

    #[test]
    fn test_reduce_overridden_declaration() {
        assert_eq!(
            run(".a{color:red;margin:0}.b{color:blue}.a{color:red}"),
            ".b{color:blue}.a{margin:0;color:red}"
        );
    }

    #[test]
    fn test_non_adjacent_body() {
        assert_eq!(run("a{color:red}b{display:block}c{color:red}"), "a,c{color:red}b{display:block}");
    }

    #[test]
    fn test_media_merged_down() {
        assert_eq!(
            run("@media print{a{color:red}}b{color:blue}@media print{c{display:none}}"),
            "b{color:blue}@media print{a{color:red}c{display:none}}"
        );
    }

    #[test]
    fn test_media_merged_up_when_down_is_blocked() {
        assert_eq!(
            run("@media print{.a{color:red}}.b{color:blue}@media print{.c{display:none}}"),
            "@media print{.a{color:red}.c{display:none}}.b{color:blue}"
        );
    }

    #[test]
    fn test_media_merging_off() {
        let options = Options {
            media_merging: false,
            ..Options::default()
        };
        assert_eq!(
            run_with(&options, "@media print{a{color:red}}b{color:blue}@media print{c{display:none}}"),
            "@media print{a{color:red}}b{color:blue}@media print{c{display:none}}"
        );
    }
}
