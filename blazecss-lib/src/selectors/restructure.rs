//! Hoists declarations repeated across rules into a new shared rule.
//!
//! Tokens are scanned bottom-up. Every movable declaration travels upwards
//! together with the rules holding it, until a token it cannot be reordered
//! with blocks it. At that point a new rule is written just below the blocker
//! if doing so makes the output shorter.

use crate::compatibility::CompatibilityProfile;
use crate::context::OptimizeContext;
use crate::selectors::clean_up::clean_selectors;
use crate::selectors::extractor::{extract, ExtractedProperty};
use crate::selectors::reorderable::can_reorder_single;
use crate::tree::css_tree::{declaration_to_string, selectors_to_string, Declaration, Rule, Token};

/// How many holders the fit search may leave out.
pub const MAX_COMBINATIONS_LEVEL: usize = 2;

/// Holder counts above this are only tried as a whole.
const MAX_FIT_HOLDERS: usize = 16;

struct Movable {
    property: ExtractedProperty,
    declaration: Declaration,
    holders: Vec<usize>,
}

pub fn restructure(tokens: &mut Vec<Token>, context: &OptimizeContext) {
    let profile = context.profile();
    let mut moved: Vec<Movable> = Vec::new();
    let mut hoisted = 0;

    let mut index = tokens.len();
    while index > 0 {
        index -= 1;
        let properties = extract(&tokens[index]);
        if properties.is_empty() {
            continue;
        }
        let declarations: Vec<Declaration> = match &tokens[index] {
            Token::Rule(rule) if !profile.is_special_selector(&rule.selectors_as_string()) => rule
                .body
                .iter()
                .filter(|declaration| !declaration.name.is_empty() && !declaration.name.starts_with("--"))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };

        let existing = moved.len();
        let mut dropped = vec![false; existing];

        for position in (0..properties.len()).rev() {
            let property = &properties[position];
            let mut same_at = None;

            for k in 0..existing {
                if dropped[k] {
                    continue;
                }
                let blocked =
                    !moved[k].holders.contains(&index) && !can_reorder_single(property, &moved[k].property);
                if blocked {
                    let (gone, inserted) = drop_moved(tokens, index + 1, &moved, k, &dropped, profile);
                    if inserted {
                        shift_holders(&mut moved, index + 1);
                        hoisted += 1;
                    }
                    for gone in gone {
                        dropped[gone] = true;
                    }
                    continue;
                }
                if same_at.is_none() && moved[k].property.key() == property.key() {
                    same_at = Some(k);
                }
            }

            let movable = declarations.len() == properties.len()
                && (0..position).all(|earlier| can_reorder_single(property, &properties[earlier]));
            if !movable {
                continue;
            }
            match same_at.filter(|k| !dropped[*k]) {
                Some(k) => {
                    let entry = &mut moved[k];
                    entry.holders.push(index);
                    entry.property.in_simple_selector &= property.in_simple_selector;
                    for selector in &property.selectors {
                        if !entry.property.selectors.contains(selector) {
                            entry.property.selectors.push(selector.clone());
                        }
                    }
                }
                None => moved.push(Movable {
                    property: property.clone(),
                    declaration: declarations[position].clone(),
                    holders: vec![index],
                }),
            }
        }

        for k in (0..existing).rev() {
            if dropped[k] {
                moved.remove(k);
            }
        }
    }

    let top = tokens
        .iter()
        .take_while(|token| match token {
            Token::Text(_) => true,
            Token::AtRule(text) => {
                let text = text.to_ascii_lowercase();
                text.starts_with("@charset") || text.starts_with("@import")
            }
            _ => false,
        })
        .count();
    let mut dropped = vec![false; moved.len()];
    for k in 0..moved.len() {
        if dropped[k] {
            continue;
        }
        let (gone, inserted) = drop_moved(tokens, top, &moved, k, &dropped, profile);
        if inserted {
            shift_holders(&mut moved, top);
            hoisted += 1;
        }
        for gone in gone {
            dropped[gone] = true;
        }
    }

    log::debug!("restructuring hoisted {} rules", hoisted);
}

/// Writes `moved[k]` out at `position`, together with every other entry held
/// by exactly the same rules. Returns the entries that are done and whether
/// a rule was inserted.
fn drop_moved(
    tokens: &mut Vec<Token>,
    position: usize,
    moved: &[Movable],
    k: usize,
    skip: &[bool],
    profile: &CompatibilityProfile,
) -> (Vec<usize>, bool) {
    let holders = eligible_holders(tokens, position, &moved[k], profile);
    if holders.len() < 2 {
        return (vec![k], false);
    }

    let mut group: Vec<usize> = (0..skip.len())
        .filter(|other| *other != k && !skip[*other])
        .filter(|other| eligible_holders(tokens, position, &moved[*other], profile) == holders)
        .collect();
    if !group.is_empty() {
        group.push(k);
        let first = holders[0];
        group.sort_by_key(|entry| declaration_position(tokens, first, &moved[*entry].declaration));
        let declarations: Vec<Declaration> = group.iter().map(|entry| moved[*entry].declaration.clone()).collect();
        if let Some(fit) = best_fit(tokens, &holders, &declarations, profile) {
            hoist(tokens, position, &fit, &declarations, profile);
            return (group, true);
        }
    }

    let declarations = [moved[k].declaration.clone()];
    match best_fit(tokens, &holders, &declarations, profile) {
        Some(fit) => {
            hoist(tokens, position, &fit, &declarations, profile);
            (vec![k], true)
        }
        None => (vec![k], false),
    }
}

/// Holders at or below `position` that still carry the declaration, in
/// source order.
fn eligible_holders(
    tokens: &[Token],
    position: usize,
    movable: &Movable,
    profile: &CompatibilityProfile,
) -> Vec<usize> {
    let mut holders: Vec<usize> = movable
        .holders
        .iter()
        .copied()
        .filter(|holder| *holder >= position)
        .filter(|holder| match tokens.get(*holder) {
            Some(Token::Rule(rule)) => {
                rule.body.contains(&movable.declaration) && !profile.is_special_selector(&rule.selectors_as_string())
            }
            _ => false,
        })
        .collect();
    holders.sort_unstable();
    holders.dedup();
    holders
}

fn declaration_position(tokens: &[Token], holder: usize, declaration: &Declaration) -> usize {
    match tokens.get(holder) {
        Some(Token::Rule(rule)) => rule
            .body
            .iter()
            .position(|candidate| candidate == declaration)
            .unwrap_or(usize::MAX),
        _ => usize::MAX,
    }
}

fn shift_holders(moved: &mut [Movable], from: usize) {
    for entry in moved.iter_mut() {
        for holder in entry.holders.iter_mut() {
            if *holder >= from {
                *holder += 1;
            }
        }
    }
}

/// The holder subset giving the largest saving, leaving out at most
/// [`MAX_COMBINATIONS_LEVEL`] holders.
fn best_fit(
    tokens: &[Token],
    holders: &[usize],
    declarations: &[Declaration],
    profile: &CompatibilityProfile,
) -> Option<Vec<usize>> {
    let mut best: Option<(isize, Vec<usize>)> = None;
    for subset in combinations(holders) {
        let gain = saving(tokens, &subset, declarations, profile);
        if gain > 0 && best.as_ref().map_or(true, |(best_gain, _)| gain > *best_gain) {
            best = Some((gain, subset));
        }
    }
    best.map(|(_, subset)| subset)
}

fn combinations(holders: &[usize]) -> Vec<Vec<usize>> {
    let mut all = vec![holders.to_vec()];
    if holders.len() > MAX_FIT_HOLDERS {
        return all;
    }
    let mut frontier = all.clone();
    for _ in 0..MAX_COMBINATIONS_LEVEL {
        let mut next = Vec::new();
        for set in &frontier {
            if set.len() <= 2 {
                continue;
            }
            for skip in 0..set.len() {
                let mut smaller = set.clone();
                smaller.remove(skip);
                if !all.contains(&smaller) {
                    all.push(smaller.clone());
                    next.push(smaller);
                }
            }
        }
        frontier = next;
    }
    all
}

/// Bytes saved by moving `declarations` out of `holders` into one new rule.
fn saving(tokens: &[Token], holders: &[usize], declarations: &[Declaration], profile: &CompatibilityProfile) -> isize {
    let lengths: Vec<usize> = declarations.iter().map(|declaration| declaration_to_string(declaration).len()).collect();
    let body_length = lengths.iter().sum::<usize>() + lengths.len().saturating_sub(1);

    let mut before = 0;
    let mut selectors = Vec::new();
    for holder in holders {
        let Some(Token::Rule(rule)) = tokens.get(*holder) else {
            continue;
        };
        before += lengths.iter().map(|length| length + 1).sum::<usize>();
        if rule.body.len() == declarations.len() {
            before += rule.selectors_as_string().len() + 2;
        }
        selectors.extend(rule.selectors.iter().cloned());
    }
    let after = selectors_to_string(&clean_selectors(&selectors, profile)).len() + 2 + body_length;
    before as isize - after as isize
}

fn hoist(
    tokens: &mut Vec<Token>,
    position: usize,
    holders: &[usize],
    declarations: &[Declaration],
    profile: &CompatibilityProfile,
) {
    let mut selectors = Vec::new();
    for holder in holders {
        if let Some(Token::Rule(rule)) = tokens.get_mut(*holder) {
            selectors.extend(rule.selectors.iter().cloned());
            for declaration in declarations {
                if let Some(at) = rule.body.iter().position(|candidate| candidate == declaration) {
                    rule.body.remove(at);
                }
            }
        }
    }
    let rule = Rule::new(clean_selectors(&selectors, profile), declarations.to_vec());
    log::trace!("hoisted `{}`", rule);
    tokens.insert(position, Token::Rule(rule));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Warnings;
    use crate::options::{Limits, Options};
    use crate::selectors::remove_empty;
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
        restructure(&mut tokens, &context);
        remove_empty(&mut tokens);
        tokens.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn test_shared_declaration_hoisted() {
        assert_eq!(
            run(".a{background:url(a.png);margin:0}.b{background:url(a.png);padding:0}"),
            ".a,.b{background:url(a.png)}.a{margin:0}.b{padding:0}"
        );
    }

    #[test]
    fn test_shared_declarations_hoisted_together() {
        assert_eq!(
            run(".a{background:url(a.png);border:1px solid red;margin:0}.b{background:url(a.png);border:1px solid red;padding:0}"),
            ".a,.b{background:url(a.png);border:1px solid red}.a{margin:0}.b{padding:0}"
        );
    }

    #[test]
    fn test_short_declaration_not_worth_it() {
        assert_eq!(
            run(".first{color:red;margin:0}.second{color:red;padding:0}"),
            ".first{color:red;margin:0}.second{color:red;padding:0}"
        );
    }

    #[test]
    fn test_conflicting_rule_blocks_hoisting() {
        assert_eq!(
            run(".a{border:1px solid #abcdef}.c{border:0}.b{border:1px solid #abcdef}"),
            ".a{border:1px solid #abcdef}.c{border:0}.b{border:1px solid #abcdef}"
        );
    }

    #[test]
    fn test_hoisted_below_imports() {
        assert_eq!(
            run("@import url(x.css);.a{background:url(a.png)}.b{background:url(a.png)}"),
            "@import url(x.css);.a,.b{background:url(a.png)}"
        );
    }

    #[test]
    fn test_combination_limit() {
        assert_eq!(MAX_COMBINATIONS_LEVEL, 2);
        let subsets = combinations(&[1, 2, 3, 4]);
        assert!(subsets.contains(&vec![1, 2, 3, 4]));
        assert!(subsets.contains(&vec![2, 4]));
        assert!(!subsets.iter().any(|subset| subset.len() < 2));
    }
}
