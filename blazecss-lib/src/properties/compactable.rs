//! Static per-property metadata driving the shorthand algebra.

use crate::properties::validator::Validator;
use crate::properties::wrap::Property;
use crate::properties::{break_up, can_override, restore};
use crate::tokenizer::split::split_value;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// A shorthand value the algebra does not understand. Never surfaced to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported value for `{0}`")]
pub struct BreakUpError(pub String);

impl BreakUpError {
    pub fn of(property: &Property) -> Self {
        BreakUpError(property.name.clone())
    }
}

/// When a later value may replace an earlier one of the same property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideRule {
    Always,
    SameValue,
    Color,
    Unit,
    Time,
    Image,
    BackgroundPosition,
    BackgroundSize,
    Keyword(KeywordSet),
    /// Plain identifiers without a vendor prefix on either side.
    Identifier,
    /// Shorthands compare component by component.
    Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSet {
    Attachment,
    Repeat,
    BoxModel,
    Style,
    ListStyleType,
    ListStylePosition,
    Timing,
    IterationCount,
    Direction,
    FillMode,
    PlayState,
}

/// How a shorthand value maps onto its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Background,
    WidthStyleColor,
    FourValues,
    BorderRadius,
    ListStyle,
    Transition,
    Animation,
}

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub rule: OverrideRule,
    pub layout: Option<Layout>,
    pub components: Vec<String>,
    /// `None` means the value is never dropped on restore.
    pub default_value: Option<&'static str>,
    pub shortest_value: Option<&'static str>,
    pub multiplex: bool,
    /// A longhand value that cannot be folded into the shorthand.
    pub non_mergeable_value: Option<&'static str>,
}

/// Break-up, restore and override behavior shared by every descriptor.
pub trait Compactable {
    fn break_up(&self, property: &Property, validator: &Validator) -> Result<Vec<Property>, BreakUpError>;
    fn restore(&self, property: &Property, validator: &Validator) -> Result<Vec<String>, BreakUpError>;
    fn can_override(&self, left: &[String], right: &[String], validator: &Validator) -> bool;
}

impl Descriptor {
    fn longhand(rule: OverrideRule, default_value: &'static str) -> Self {
        Descriptor {
            rule,
            layout: None,
            components: Vec::new(),
            default_value: Some(default_value),
            shortest_value: None,
            multiplex: false,
            non_mergeable_value: None,
        }
    }

    fn shorthand(rule: OverrideRule, layout: Layout, components: Vec<String>, default_value: &'static str) -> Self {
        Descriptor {
            rule,
            layout: Some(layout),
            components,
            default_value: Some(default_value),
            shortest_value: None,
            multiplex: false,
            non_mergeable_value: None,
        }
    }

    fn shortest(mut self, value: &'static str) -> Self {
        self.shortest_value = Some(value);
        self
    }

    fn multiplexed(mut self) -> Self {
        self.multiplex = true;
        self
    }

    fn no_default(mut self) -> Self {
        self.default_value = None;
        self
    }

    fn non_mergeable(mut self, value: &'static str) -> Self {
        self.non_mergeable_value = Some(value);
        self
    }

    pub fn is_shorthand(&self) -> bool {
        self.layout.is_some()
    }

    pub fn default_fragments(&self) -> Option<Vec<String>> {
        self.default_value.map(split_value)
    }

    /// Value written when every component is at its default.
    pub fn empty_value(&self) -> Vec<String> {
        self.shortest_value
            .or(self.default_value)
            .map(split_value)
            .unwrap_or_default()
    }
}

impl Compactable for Descriptor {
    fn break_up(&self, property: &Property, validator: &Validator) -> Result<Vec<Property>, BreakUpError> {
        match self.layout {
            Some(layout) => break_up::break_up(layout, self, property, validator),
            None => Err(BreakUpError::of(property)),
        }
    }

    fn restore(&self, property: &Property, validator: &Validator) -> Result<Vec<String>, BreakUpError> {
        match self.layout {
            Some(layout) => restore::restore(layout, self, property, validator),
            None => Ok(property.value.clone()),
        }
    }

    fn can_override(&self, left: &[String], right: &[String], validator: &Validator) -> bool {
        can_override::every_combination(self.rule, left, right, validator)
    }
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];
const CORNERS: [&str; 4] = ["top-left", "top-right", "bottom-right", "bottom-left"];
const MOZ_CORNERS: [&str; 4] = ["topleft", "topright", "bottomright", "bottomleft"];

fn names(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

static DESCRIPTORS: Lazy<HashMap<String, Descriptor>> = Lazy::new(|| {
    use KeywordSet::*;
    use OverrideRule::*;

    let mut table: HashMap<String, Descriptor> = HashMap::new();
    let mut add = |name: &str, descriptor: Descriptor| {
        table.insert(name.to_string(), descriptor);
    };

    add(
        "background",
        Descriptor::shorthand(
            Components,
            Layout::Background,
            names(&[
                "background-image",
                "background-position",
                "background-size",
                "background-repeat",
                "background-attachment",
                "background-origin",
                "background-clip",
                "background-color",
            ]),
            "0 0",
        )
        .multiplexed(),
    );
    add("background-attachment", Descriptor::longhand(Keyword(Attachment), "scroll").multiplexed());
    add("background-clip", Descriptor::longhand(Keyword(BoxModel), "border-box").multiplexed());
    add(
        "background-color",
        Descriptor::longhand(Color, "transparent").non_mergeable("none"),
    );
    add("background-image", Descriptor::longhand(Image, "none").multiplexed());
    add("background-origin", Descriptor::longhand(Keyword(BoxModel), "padding-box").multiplexed());
    add(
        "background-position",
        Descriptor::longhand(BackgroundPosition, "0 0").shortest("0").multiplexed(),
    );
    add("background-repeat", Descriptor::longhand(Keyword(Repeat), "repeat").multiplexed());
    add(
        "background-size",
        Descriptor::longhand(BackgroundSize, "auto").shortest("0 0").multiplexed(),
    );

    add(
        "border",
        Descriptor::shorthand(
            Components,
            Layout::WidthStyleColor,
            names(&["border-width", "border-style", "border-color"]),
            "none",
        )
        .shortest("0"),
    );
    for (kind, rule, default) in [("width", Unit, "medium"), ("style", Keyword(Style), "none"), ("color", Color, "currentcolor")] {
        let components = SIDES
            .iter()
            .map(|side| format!("border-{}-{}", side, kind))
            .collect();
        let mut all = Descriptor::shorthand(rule, Layout::FourValues, components, default);
        if kind == "width" {
            all = all.shortest("0");
        }
        add(&format!("border-{}", kind), all);
        for side in SIDES {
            let mut longhand = Descriptor::longhand(rule, default);
            if kind == "width" {
                longhand = longhand.shortest("0");
            }
            add(&format!("border-{}-{}", side, kind), longhand);
        }
    }
    for side in SIDES {
        add(
            &format!("border-{}", side),
            Descriptor::shorthand(
                Components,
                Layout::WidthStyleColor,
                vec![
                    format!("border-{}-width", side),
                    format!("border-{}-style", side),
                    format!("border-{}-color", side),
                ],
                "none",
            )
            .shortest("0"),
        );
    }

    for prefix in ["", "-webkit-"] {
        let components = CORNERS
            .iter()
            .map(|corner| format!("{}border-{}-radius", prefix, corner))
            .collect::<Vec<_>>();
        for component in &components {
            add(component, Descriptor::longhand(Unit, "0"));
        }
        add(
            &format!("{}border-radius", prefix),
            Descriptor::shorthand(Unit, Layout::BorderRadius, components, "0"),
        );
    }
    let moz_components = MOZ_CORNERS
        .iter()
        .map(|corner| format!("-moz-border-radius-{}", corner))
        .collect::<Vec<_>>();
    for component in &moz_components {
        add(component, Descriptor::longhand(Unit, "0"));
    }
    add(
        "-moz-border-radius",
        Descriptor::shorthand(Unit, Layout::BorderRadius, moz_components, "0"),
    );

    for name in ["bottom", "left", "right", "top", "height", "width"] {
        add(name, Descriptor::longhand(Unit, "auto"));
    }
    for name in ["max-height", "max-width"] {
        add(name, Descriptor::longhand(Unit, "none"));
    }
    for name in ["min-height", "min-width", "text-indent", "letter-spacing", "word-spacing"] {
        add(name, Descriptor::longhand(Unit, "0"));
    }
    add("font-size", Descriptor::longhand(Unit, "medium"));
    add("line-height", Descriptor::longhand(Unit, "normal"));
    add("opacity", Descriptor::longhand(Unit, "1"));
    add("z-index", Descriptor::longhand(Unit, "auto"));
    add("color", Descriptor::longhand(Color, "transparent"));
    add("font-weight", Descriptor::longhand(Always, "400"));
    for name in ["float", "clear", "font-style", "text-transform", "visibility"] {
        add(name, Descriptor::longhand(Identifier, "none"));
    }

    add(
        "list-style",
        Descriptor::shorthand(
            Components,
            Layout::ListStyle,
            names(&["list-style-type", "list-style-position", "list-style-image"]),
            "outside none",
        )
        .shortest("none"),
    );
    add("list-style-image", Descriptor::longhand(Image, "none"));
    add("list-style-position", Descriptor::longhand(Keyword(ListStylePosition), "outside"));
    add("list-style-type", Descriptor::longhand(Keyword(ListStyleType), "disc").no_default());

    for box_name in ["margin", "padding"] {
        let components = SIDES
            .iter()
            .map(|side| format!("{}-{}", box_name, side))
            .collect::<Vec<_>>();
        for component in &components {
            add(component, Descriptor::longhand(Unit, "0"));
        }
        add(box_name, Descriptor::shorthand(Unit, Layout::FourValues, components, "0"));
    }

    add(
        "outline",
        Descriptor::shorthand(
            Components,
            Layout::WidthStyleColor,
            names(&["outline-width", "outline-style", "outline-color"]),
            "0",
        ),
    );
    add("outline-color", Descriptor::longhand(Color, "invert"));
    add("outline-style", Descriptor::longhand(Keyword(Style), "none"));
    add("outline-width", Descriptor::longhand(Unit, "medium").shortest("0"));

    for prefix in ["", "-webkit-", "-moz-", "-o-"] {
        let parts = [
            ("property", SameValue, "all"),
            ("duration", Time, "0s"),
            ("timing-function", Keyword(Timing), "ease"),
            ("delay", Time, "0s"),
        ];
        let components = parts
            .iter()
            .map(|(part, _, _)| format!("{}transition-{}", prefix, part))
            .collect::<Vec<_>>();
        for ((_, rule, default), component) in parts.iter().zip(&components) {
            add(component, Descriptor::longhand(*rule, *default).multiplexed());
        }
        add(
            &format!("{}transition", prefix),
            Descriptor::shorthand(Components, Layout::Transition, components, "all")
                .shortest("0s")
                .multiplexed(),
        );
    }

    for prefix in ["", "-webkit-"] {
        let parts = [
            ("name", SameValue, "none"),
            ("duration", Time, "0s"),
            ("timing-function", Keyword(Timing), "ease"),
            ("delay", Time, "0s"),
            ("iteration-count", Keyword(IterationCount), "1"),
            ("direction", Keyword(Direction), "normal"),
            ("fill-mode", Keyword(FillMode), "none"),
            ("play-state", Keyword(PlayState), "running"),
        ];
        let components = parts
            .iter()
            .map(|(part, _, _)| format!("{}animation-{}", prefix, part))
            .collect::<Vec<_>>();
        for ((_, rule, default), component) in parts.iter().zip(&components) {
            add(component, Descriptor::longhand(*rule, *default).multiplexed());
        }
        add(
            &format!("{}animation", prefix),
            Descriptor::shorthand(Components, Layout::Animation, components, "none")
                .shortest("none")
                .multiplexed(),
        );
    }

    table
});

static OPAQUE: Lazy<Descriptor> = Lazy::new(|| Descriptor::longhand(OverrideRule::SameValue, "").no_default());

/// Descriptor for a known property.
pub fn descriptor(name: &str) -> Option<&'static Descriptor> {
    DESCRIPTORS.get(name)
}

/// Unknown and custom properties only ever override an equal value.
pub fn descriptor_or_opaque(name: &str) -> &'static Descriptor {
    descriptor(name).unwrap_or(&OPAQUE)
}

/// Shorthands that list `name` as a direct component.
pub fn shorthands_of(name: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = DESCRIPTORS
        .iter()
        .filter(|(_, descriptor)| descriptor.components.iter().any(|component| component == name))
        .map(|(shorthand, _)| shorthand.as_str())
        .collect();
    found.sort_unstable();
    found
}

/// Whether `component` is a direct or nested component of `shorthand`.
pub fn is_component_of(shorthand: &str, component: &str) -> bool {
    match descriptor(shorthand) {
        Some(descriptor) => descriptor
            .components
            .iter()
            .any(|name| name == component || is_component_of(name, component)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shapes() {
        let border = descriptor("border").unwrap();
        assert_eq!(border.layout, Some(Layout::WidthStyleColor));
        assert_eq!(border.components, vec!["border-width", "border-style", "border-color"]);
        assert_eq!(
            descriptor("-moz-border-radius").unwrap().components[0],
            "-moz-border-radius-topleft"
        );
        assert!(descriptor("list-style-type").unwrap().default_value.is_none());
        assert_eq!(descriptor_or_opaque("display").rule, OverrideRule::SameValue);
    }

    #[test]
    fn test_component_relations() {
        assert!(is_component_of("border", "border-top-width"));
        assert!(is_component_of("margin", "margin-left"));
        assert!(!is_component_of("margin", "padding-left"));
        assert_eq!(shorthands_of("border-top-color"), vec!["border-color", "border-top"]);
    }
}
