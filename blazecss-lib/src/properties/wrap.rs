//! The optimizer's view of a declaration.
//!
//! A rule body is wrapped into a flat `Vec<Property>`; passes mark entries
//! `unused` instead of removing them and [`unwrap`] drops them at the end.

use crate::tree::css_tree::{value_to_string, Declaration};

/// Legacy browser targeting syntax attached to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hack {
    /// `_color: red`
    Underscore,
    /// `*color: red`
    Star,
    /// `color: red\9`
    Backslash,
    /// `color: red !ie`
    Bang,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Vec<String>,
    pub important: bool,
    pub hack: Option<Hack>,
    /// Custom property, `--name`.
    pub variable: bool,
    /// Block value of a custom property.
    pub block: Option<Vec<Declaration>>,
    /// Broken up into `components`.
    pub shorthand: bool,
    /// Value holds several comma separated layers.
    pub multiplex: bool,
    pub components: Vec<Property>,
    /// Value was rebuilt from components.
    pub dirty: bool,
    pub unused: bool,
    /// Index in the body it was wrapped from.
    pub position: usize,
    /// Which rule it came from when several bodies are optimized together.
    pub origin: usize,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Vec<String>) -> Self {
        let name = name.into();
        Property {
            variable: name.starts_with("--"),
            name,
            value,
            important: false,
            hack: None,
            block: None,
            shorthand: false,
            multiplex: false,
            components: Vec::new(),
            dirty: false,
            unused: false,
            position: 0,
            origin: 0,
        }
    }

    /// A component of `parent`, sharing its importance and hack.
    pub fn component_of(parent: &Property, name: &str, value: Vec<String>) -> Self {
        Property {
            important: parent.important,
            hack: parent.hack,
            position: parent.position,
            origin: parent.origin,
            ..Property::new(name, value)
        }
    }

    pub fn value_string(&self) -> String {
        value_to_string(&self.value)
    }

    /// Length of `name:value` as it would be written out.
    pub fn serialized_len(&self) -> usize {
        let mut len = self.name.len() + 1 + self.value_string().len();
        if self.important {
            len += "!important".len();
        }
        len
    }

    /// Finds a component by name, searching nested shorthands too.
    pub fn find_component(&self, name: &str) -> Option<&Property> {
        for component in &self.components {
            if component.name == name {
                return Some(component);
            }
            if let Some(found) = component.find_component(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn is_live(&self) -> bool {
        !self.unused
    }
}

/// Wraps a declaration body. `origin` tags every property with its rule.
pub fn wrap(body: &[Declaration], origin: usize) -> Vec<Property> {
    body.iter()
        .enumerate()
        .map(|(position, declaration)| wrap_declaration(declaration, position, origin))
        .collect()
}

pub fn wrap_declaration(declaration: &Declaration, position: usize, origin: usize) -> Property {
    let (name, prefix_hack) = if let Some(rest) = declaration.name.strip_prefix('_') {
        (rest, Some(Hack::Underscore))
    } else if let Some(rest) = declaration.name.strip_prefix('*') {
        (rest, Some(Hack::Star))
    } else {
        (declaration.name.as_str(), None)
    };

    let mut value = declaration.value.clone();
    let suffix_hack = strip_suffix_hack(&mut value);
    let important = strip_important(&mut value);

    let mut property = Property::new(name.to_ascii_lowercase(), value);
    if property.variable {
        property.name = name.to_string();
    }
    property.important = important;
    property.hack = prefix_hack.or(suffix_hack);
    property.block = declaration.block.clone();
    property.position = position;
    property.origin = origin;
    property
}

fn strip_suffix_hack(value: &mut Vec<String>) -> Option<Hack> {
    let last = value.last_mut()?;
    let lower = last.to_ascii_lowercase();
    if lower.ends_with("!ie") {
        let keep = last.len() - 3;
        last.truncate(keep);
        if last.trim().is_empty() {
            value.pop();
        }
        return Some(Hack::Bang);
    }
    if let Some(rest) = last.strip_suffix("\\9") {
        *last = rest.to_string();
        if last.is_empty() {
            value.pop();
        }
        return Some(Hack::Backslash);
    }
    None
}

fn strip_important(value: &mut Vec<String>) -> bool {
    let len = value.len();
    if len >= 2
        && value[len - 2] == "!"
        && value[len - 1].eq_ignore_ascii_case("important")
    {
        value.truncate(len - 2);
        return true;
    }

    let Some(last) = value.last_mut() else {
        return false;
    };
    let lower = last.to_ascii_lowercase();
    if !lower.ends_with("important") {
        return false;
    }
    let head = lower.trim_end_matches("important").trim_end();
    if !head.ends_with('!') {
        return false;
    }
    let keep = head.len() - 1;
    last.truncate(keep);
    if last.is_empty() {
        value.pop();
    }
    true
}

/// Turns live properties back into declarations, re-applying importance and hacks.
pub fn unwrap(properties: &[Property]) -> Vec<Declaration> {
    properties
        .iter()
        .filter(|property| property.is_live())
        .map(unwrap_property)
        .collect()
}

/// Live properties of one origin only.
pub fn unwrap_origin(properties: &[Property], origin: usize) -> Vec<Declaration> {
    properties
        .iter()
        .filter(|property| property.is_live() && property.origin == origin)
        .map(unwrap_property)
        .collect()
}

pub fn unwrap_property(property: &Property) -> Declaration {
    let name = match property.hack {
        Some(Hack::Underscore) => format!("_{}", property.name),
        Some(Hack::Star) => format!("*{}", property.name),
        _ => property.name.clone(),
    };

    let mut value = property.value.clone();
    if property.hack == Some(Hack::Backslash) {
        if let Some(last) = value.last_mut() {
            last.push_str("\\9");
        }
    }
    if property.important {
        match value.last_mut() {
            Some(last) => last.push_str("!important"),
            None => value.push("!important".to_string()),
        }
    }
    if property.hack == Some(Hack::Bang) {
        value.push("!ie".to_string());
    }

    Declaration {
        name,
        value,
        block: property.block.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn declaration(name: &str, value: &[&str]) -> Declaration {
        Declaration::new(name, value.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_importance_forms() {
        let forms: [&[&str]; 3] = [
            &["red!important"],
            &["red", "!important"],
            &["red", "!", "important"],
        ];
        for value in forms {
            let property = wrap_declaration(&declaration("color", value), 0, 0);
            assert!(property.important);
            assert_eq!(property.value, vec!["red"]);
        }
    }

    #[test]
    fn test_hacks() {
        let star = wrap_declaration(&declaration("*zoom", &["1"]), 0, 0);
        assert_eq!((star.name.as_str(), star.hack), ("zoom", Some(Hack::Star)));

        let suffix = wrap_declaration(&declaration("width", &["1px\\9"]), 0, 0);
        assert_eq!(suffix.hack, Some(Hack::Backslash));
        assert_eq!(suffix.value, vec!["1px"]);

        let bang = wrap_declaration(&declaration("color", &["red", "!ie"]), 0, 0);
        assert_eq!(bang.hack, Some(Hack::Bang));
        assert_eq!(bang.value, vec!["red"]);
    }

    #[test]
    fn test_unwrap_reapplies_markers() {
        let mut property = wrap_declaration(&declaration("_width", &["1px!important"]), 0, 0);
        assert_eq!(unwrap_property(&property).to_string(), "_width:1px!important");

        property.unused = true;
        assert!(unwrap(&[property]).is_empty());
    }

    #[test]
    fn test_custom_property_keeps_case() {
        let property = wrap_declaration(&declaration("--Main-Color", &["red"]), 0, 0);
        assert!(property.variable);
        assert_eq!(property.name, "--Main-Color");
    }
}
