use crate::compatibility::CompatibilityProfile;
use crate::error::MinifyError;
use serde::Deserialize;

/// Which `/*! ... */` comments survive minification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum KeepSpecialComments {
    /// `"*"`
    #[default]
    #[serde(rename = "*")]
    All,
    /// `"1"`
    #[serde(rename = "1")]
    First,
    /// `"0"`
    #[serde(rename = "0")]
    None,
}

impl KeepSpecialComments {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "*" | "all" => Some(KeepSpecialComments::All),
            "1" | "first" => Some(KeepSpecialComments::First),
            "0" | "none" => Some(KeepSpecialComments::None),
            _ => None,
        }
    }
}

/// A preset string (with optional overrides) or a fully spelled out profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Compatibility {
    Preset(String),
    Profile(Box<CompatibilityProfile>),
}

impl Default for Compatibility {
    fn default() -> Self {
        Compatibility::Preset("*".to_string())
    }
}

impl Compatibility {
    pub fn resolve(&self) -> Result<CompatibilityProfile, MinifyError> {
        match self {
            Compatibility::Preset(preset) => CompatibilityProfile::from_str_with_overrides(preset),
            Compatibility::Profile(profile) => Ok((**profile).clone()),
        }
    }
}

/// Safety caps; exceeding them aborts the call with a [`MinifyError`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_nesting_depth: usize,
    pub max_input_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nesting_depth: 64,
            max_input_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Options for one minify call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Property and selector level merging; off means value minification only.
    pub advanced: bool,
    /// Remove earlier same-name declarations even when values differ.
    pub aggressive_merging: bool,
    pub compatibility: Compatibility,
    pub keep_breaks: bool,
    pub keep_special_comments: KeepSpecialComments,
    pub media_merging: bool,
    pub restructuring: bool,
    /// Decimal places kept for `px` values.
    pub rounding_precision: u8,
    pub semantic_merging: bool,
    pub shorthand_compacting: bool,
    pub limits: Limits,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            advanced: true,
            aggressive_merging: true,
            compatibility: Compatibility::default(),
            keep_breaks: false,
            keep_special_comments: KeepSpecialComments::All,
            media_merging: true,
            restructuring: true,
            rounding_precision: 2,
            semantic_merging: false,
            shorthand_compacting: true,
            limits: Limits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert!(options.advanced);
        assert_eq!(options.rounding_precision, 2);
        assert!(options.compatibility.resolve().is_ok());
    }

    #[test]
    fn test_keep_special_comments_parse() {
        assert_eq!(KeepSpecialComments::parse("1"), Some(KeepSpecialComments::First));
        assert_eq!(KeepSpecialComments::parse("x"), None);
    }

    #[test]
    fn test_from_json() {
        let options: Options = serde_json::from_str(
            r#"{"keep_breaks":true,"keep_special_comments":"0","compatibility":"ie8,+units.rem","limits":{"max_nesting_depth":8}}"#,
        )
        .unwrap();
        assert!(options.keep_breaks);
        assert!(options.restructuring);
        assert_eq!(options.keep_special_comments, KeepSpecialComments::None);
        assert_eq!(options.limits.max_nesting_depth, 8);
        assert_eq!(options.limits.max_input_bytes, Limits::default().max_input_bytes);
        assert!(options.compatibility.resolve().unwrap().units.rem);
    }

    #[test]
    fn test_full_profile_from_json() {
        let options: Options =
            serde_json::from_str(r#"{"compatibility":{"selectors":{"ie7_hack":true,"special":"-moz-"}}}"#).unwrap();
        let profile = options.compatibility.resolve().unwrap();
        assert!(profile.selectors.ie7_hack);
        assert!(profile.is_special_selector("::-moz-selection"));
        assert!(!profile.is_special_selector("::-webkit-scrollbar"));
    }
}
