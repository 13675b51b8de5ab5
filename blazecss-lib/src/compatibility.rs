//! Browser compatibility profiles.
//!
//! A profile is resolved once per run from a preset name (`*`, `ie8`, `ie7`)
//! followed by comma separated `+group.flag` / `-group.flag` overrides, e.g.
//! `"ie8,+units.rem,-properties.merging"`.

use crate::error::MinifyError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};

const SPECIAL_SELECTORS_DEFAULT: &str = r"(-moz-|-ms-|-o-|-webkit-|:dir\([a-z-]*\)|:first(?:$|[^a-z-])|:fullscreen|:left|:read-only|:read-write|:right|:placeholder|:host|::content|/deep/|::shadow|^,)";
const SPECIAL_SELECTORS_LEGACY_IE: &str = r"(-moz-|-ms-|-o-|-webkit-|:root|:nth|:first-of|:last|:only|:empty|:target|:checked|::selection|:enabled|:disabled|:not|:placeholder|:host|::content|/deep/|::shadow|^,)";

/// Selectors that must never be merged or reordered with others.
#[derive(Debug, Clone)]
pub struct SpecialSelectors(Regex);

impl SpecialSelectors {
    pub fn new(pattern: &str) -> Result<Self, MinifyError> {
        Regex::new(pattern)
            .map(SpecialSelectors)
            .map_err(|_| MinifyError::InvalidCompatibility(pattern.to_string()))
    }

    pub fn is_match(&self, selector: &str) -> bool {
        self.0.is_match(selector)
    }
}

impl<'de> Deserialize<'de> for SpecialSelectors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Regex::new(&pattern)
            .map(SpecialSelectors)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorFlags {
    /// `rgba()`/`hsla()` are understood.
    pub opacity: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PropertyFlags {
    pub background_clip_merging: bool,
    pub background_origin_merging: bool,
    pub background_size_merging: bool,
    pub colors: bool,
    pub ie_bang_hack: bool,
    pub ie_prefix_hack: bool,
    pub ie_suffix_hack: bool,
    pub merging: bool,
    pub shorter_length_units: bool,
    pub space_after_closing_brace: bool,
    pub url_quotes: bool,
    pub zero_units: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorFlags {
    pub adjacent_space: bool,
    pub ie7_hack: bool,
    pub special: SpecialSelectors,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UnitFlags {
    pub ch: bool,
    #[serde(rename = "in")]
    pub inch: bool,
    pub pc: bool,
    pub pt: bool,
    pub rem: bool,
    pub vh: bool,
    pub vm: bool,
    pub vmax: bool,
    pub vmin: bool,
    pub vw: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CompatibilityProfile {
    pub colors: ColorFlags,
    pub properties: PropertyFlags,
    pub selectors: SelectorFlags,
    pub units: UnitFlags,
}

impl Default for ColorFlags {
    fn default() -> Self {
        ColorFlags { opacity: true }
    }
}

impl Default for PropertyFlags {
    fn default() -> Self {
        PropertyFlags {
            background_clip_merging: false,
            background_origin_merging: false,
            background_size_merging: false,
            colors: true,
            ie_bang_hack: false,
            ie_prefix_hack: false,
            ie_suffix_hack: true,
            merging: true,
            shorter_length_units: false,
            space_after_closing_brace: true,
            url_quotes: false,
            zero_units: true,
        }
    }
}

impl Default for SelectorFlags {
    fn default() -> Self {
        SelectorFlags {
            adjacent_space: false,
            ie7_hack: false,
            special: SpecialSelectors(DEFAULT_SPECIAL.clone()),
        }
    }
}

impl Default for UnitFlags {
    fn default() -> Self {
        UnitFlags {
            ch: true,
            inch: true,
            pc: true,
            pt: true,
            rem: true,
            vh: true,
            vm: true,
            vmax: true,
            vmin: true,
            vw: true,
        }
    }
}

static DEFAULT_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(SPECIAL_SELECTORS_DEFAULT).expect("valid special selectors pattern"));
static LEGACY_IE_SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(SPECIAL_SELECTORS_LEGACY_IE).expect("valid special selectors pattern")
});

impl CompatibilityProfile {
    /// Modern browsers.
    pub fn modern() -> Self {
        CompatibilityProfile::default()
    }

    pub fn ie8() -> Self {
        let mut profile = CompatibilityProfile::default();
        profile.colors.opacity = false;
        profile.properties.ie_prefix_hack = true;
        profile.properties.merging = false;
        profile.selectors.special = SpecialSelectors(LEGACY_IE_SPECIAL.clone());
        profile.units = UnitFlags {
            ch: false,
            inch: true,
            pc: true,
            pt: true,
            rem: false,
            vh: false,
            vm: false,
            vmax: false,
            vmin: false,
            vw: false,
        };
        profile
    }

    pub fn ie7() -> Self {
        let mut profile = CompatibilityProfile::ie8();
        profile.properties.ie_bang_hack = true;
        profile.selectors.ie7_hack = true;
        profile
    }

    /// Resolves a profile string such as `"ie8,+units.rem"`.
    pub fn from_str_with_overrides(source: &str) -> Result<Self, MinifyError> {
        let parts = source.split(',').map(str::trim).filter(|p| !p.is_empty());
        let mut profile = CompatibilityProfile::default();
        let mut first = true;

        for part in parts {
            if first {
                first = false;
                match part {
                    "*" => continue,
                    "ie8" => {
                        profile = CompatibilityProfile::ie8();
                        continue;
                    }
                    "ie7" => {
                        profile = CompatibilityProfile::ie7();
                        continue;
                    }
                    _ => {}
                }
            }

            let (enabled, flag) = if let Some(flag) = part.strip_prefix('+') {
                (true, flag)
            } else if let Some(flag) = part.strip_prefix('-') {
                (false, flag)
            } else {
                return Err(MinifyError::InvalidCompatibility(part.to_string()));
            };
            profile.set_flag(flag, enabled)?;
        }

        Ok(profile)
    }

    fn set_flag(&mut self, flag: &str, enabled: bool) -> Result<(), MinifyError> {
        let slot = match flag {
            "colors.opacity" => &mut self.colors.opacity,
            "properties.backgroundClipMerging" | "properties.background_clip_merging" => {
                &mut self.properties.background_clip_merging
            }
            "properties.backgroundOriginMerging" | "properties.background_origin_merging" => {
                &mut self.properties.background_origin_merging
            }
            "properties.backgroundSizeMerging" | "properties.background_size_merging" => {
                &mut self.properties.background_size_merging
            }
            "properties.colors" => &mut self.properties.colors,
            "properties.ieBangHack" | "properties.ie_bang_hack" => &mut self.properties.ie_bang_hack,
            "properties.iePrefixHack" | "properties.ie_prefix_hack" => {
                &mut self.properties.ie_prefix_hack
            }
            "properties.ieSuffixHack" | "properties.ie_suffix_hack" => {
                &mut self.properties.ie_suffix_hack
            }
            "properties.merging" => &mut self.properties.merging,
            "properties.shorterLengthUnits" | "properties.shorter_length_units" => {
                &mut self.properties.shorter_length_units
            }
            "properties.spaceAfterClosingBrace" | "properties.space_after_closing_brace" => {
                &mut self.properties.space_after_closing_brace
            }
            "properties.urlQuotes" | "properties.url_quotes" => &mut self.properties.url_quotes,
            "properties.zeroUnits" | "properties.zero_units" => &mut self.properties.zero_units,
            "selectors.adjacentSpace" | "selectors.adjacent_space" => {
                &mut self.selectors.adjacent_space
            }
            "selectors.ie7Hack" | "selectors.ie7_hack" => &mut self.selectors.ie7_hack,
            "units.ch" => &mut self.units.ch,
            "units.in" => &mut self.units.inch,
            "units.pc" => &mut self.units.pc,
            "units.pt" => &mut self.units.pt,
            "units.rem" => &mut self.units.rem,
            "units.vh" => &mut self.units.vh,
            "units.vm" => &mut self.units.vm,
            "units.vmax" => &mut self.units.vmax,
            "units.vmin" => &mut self.units.vmin,
            "units.vw" => &mut self.units.vw,
            _ => return Err(MinifyError::InvalidCompatibility(flag.to_string())),
        };
        *slot = enabled;
        Ok(())
    }

    /// Units this profile may emit or treat as understood.
    pub fn allowed_units(&self) -> Vec<&'static str> {
        let mut units = vec!["px", "em", "ex", "cm", "mm", "%"];
        let optional = [
            ("ch", self.units.ch),
            ("in", self.units.inch),
            ("pc", self.units.pc),
            ("pt", self.units.pt),
            ("rem", self.units.rem),
            ("vh", self.units.vh),
            ("vm", self.units.vm),
            ("vmax", self.units.vmax),
            ("vmin", self.units.vmin),
            ("vw", self.units.vw),
        ];
        units.extend(optional.iter().filter(|(_, on)| *on).map(|(unit, _)| *unit));
        units
    }

    pub fn is_special_selector(&self, selector: &str) -> bool {
        self.selectors.special.is_match(selector)
    }
}
