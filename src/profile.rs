//! Serializable rule sets and preferences.
//!
//! A [`RuleSetProfile`] is the persisted form of a [`RuleSet`]: what a
//! configuration store writes to disk and what an editor process sends to
//! the renderer. [`Preferences`] carries the host-level switches.
//!
//! # Example
//!
//! ```
//! use folco_overlay::{KeyType, LayerSettings, RuleProfile, RuleSet, RuleSetProfile};
//!
//! let profile = RuleSetProfile::new().with_rule(RuleProfile {
//!     key_type: KeyType::Name,
//!     keys: "Scripts;Scenes".into(),
//!     recursive: true,
//!     layers: vec![LayerSettings::builtin("folder")],
//! });
//!
//! let json = profile.to_json().unwrap();
//! let rules: RuleSet = RuleSetProfile::from_json(&json).unwrap().into();
//! assert!(rules.resolve("Assets/Scripts/AI", true).is_some());
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::compositor::SMALL_SLOT_MARGIN;
use crate::error::Result;
use crate::geometry::UnitRect;
use crate::layer::{CropMode, Layer, LayerSource, ScaleMode};
use crate::rule::{KeyType, Rule};
use crate::ruleset::RuleSet;

// ============================================================================
// LayerSettings
// ============================================================================

/// Serializable form of a [`Layer`].
///
/// Tint and background keep their color when switched off, so toggling
/// them in an editor does not lose the chosen color.
///
/// ```json
/// {
///   "relativeRect": { "x": 0.5, "y": 0.5, "w": 0.5, "h": 0.5 },
///   "tint": true,
///   "color": { "r": 255, "g": 200, "b": 0, "a": 255 },
///   "background": false,
///   "backgroundColor": { "r": 0, "g": 0, "b": 0, "a": 255 },
///   "builtinIconId": "star",
///   "cropMode": { "mode": "auto" },
///   "scaleMode": "scale-to-fit"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct LayerSettings {
    #[serde(default)]
    pub relative_rect: UnitRect,

    /// Whether [`color`](Self::color) is applied as a tint.
    #[serde(default)]
    pub tint: bool,

    #[serde(default)]
    pub color: Color,

    /// Whether [`background_color`](Self::background_color) is filled.
    #[serde(default)]
    pub background: bool,

    #[serde(default = "default_background_color")]
    pub background_color: Color,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_asset_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_icon_id: Option<String>,

    #[serde(default)]
    pub crop_mode: CropMode,

    #[serde(default)]
    pub scale_mode: ScaleMode,
}

fn default_background_color() -> Color {
    Color::rgb(0, 0, 0)
}

impl Default for LayerSettings {
    fn default() -> Self {
        Self {
            relative_rect: UnitRect::FULL,
            tint: false,
            color: Color::WHITE,
            background: false,
            background_color: default_background_color(),
            source_asset_ref: None,
            builtin_icon_id: None,
            crop_mode: CropMode::None,
            scale_mode: ScaleMode::StretchToFill,
        }
    }
}

impl LayerSettings {
    pub fn asset(reference: impl Into<String>) -> Self {
        Self {
            source_asset_ref: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn builtin(id: impl Into<String>) -> Self {
        Self {
            builtin_icon_id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl From<&Layer> for LayerSettings {
    fn from(layer: &Layer) -> Self {
        Self {
            relative_rect: layer.rect,
            tint: layer.tint.is_some(),
            color: layer.tint.unwrap_or(Color::WHITE),
            background: layer.background.is_some(),
            background_color: layer.background.unwrap_or_else(default_background_color),
            source_asset_ref: layer.source.asset.clone(),
            builtin_icon_id: layer.source.builtin.clone(),
            crop_mode: layer.crop,
            scale_mode: layer.scale_mode,
        }
    }
}

impl From<LayerSettings> for Layer {
    fn from(settings: LayerSettings) -> Self {
        Self {
            rect: UnitRect::new(
                settings.relative_rect.x,
                settings.relative_rect.y,
                settings.relative_rect.width,
                settings.relative_rect.height,
            ),
            tint: settings.tint.then_some(settings.color),
            background: settings.background.then_some(settings.background_color),
            source: LayerSource {
                asset: settings.source_asset_ref,
                builtin: settings.builtin_icon_id,
            },
            crop: settings.crop_mode,
            scale_mode: settings.scale_mode,
        }
    }
}

// ============================================================================
// RuleProfile / RuleSetProfile
// ============================================================================

/// Serializable form of a [`Rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RuleProfile {
    /// `"name"` or `"path"`. Unknown values load, but the rule never
    /// matches.
    pub key_type: KeyType,

    /// `;`-joined keys.
    #[serde(default)]
    pub keys: String,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default)]
    pub layers: Vec<LayerSettings>,
}

impl From<&Rule> for RuleProfile {
    fn from(rule: &Rule) -> Self {
        Self {
            key_type: rule.key_type,
            keys: rule.name.clone(),
            recursive: rule.recursive,
            layers: rule.layers.iter().map(LayerSettings::from).collect(),
        }
    }
}

impl From<RuleProfile> for Rule {
    fn from(profile: RuleProfile) -> Self {
        Rule::new(profile.key_type, profile.keys)
            .recursive(profile.recursive)
            .with_layers(profile.layers.into_iter().map(Layer::from))
    }
}

/// A serializable rule set.
///
/// Rule order is preserved exactly; it is the precedence order.
///
/// # JSON Format
///
/// ```json
/// {
///   "useDefault": false,
///   "defaultLayers": [],
///   "rules": [
///     {
///       "keyType": "name",
///       "keys": "Scripts;Scenes",
///       "recursive": true,
///       "layers": [{ "builtinIconId": "folder" }]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct RuleSetProfile {
    #[serde(default)]
    pub use_default: bool,

    #[serde(default)]
    pub default_layers: Vec<LayerSettings>,

    #[serde(default)]
    pub rules: Vec<RuleProfile>,
}

impl RuleSetProfile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule.
    pub fn with_rule(mut self, rule: RuleProfile) -> Self {
        self.rules.push(rule);
        self
    }

    /// Enables the default folder with `layers`.
    pub fn with_default(mut self, layers: Vec<LayerSettings>) -> Self {
        self.use_default = true;
        self.default_layers = layers;
        self
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&RuleSet> for RuleSetProfile {
    fn from(set: &RuleSet) -> Self {
        Self {
            use_default: set.use_default,
            default_layers: set.default_layers.iter().map(LayerSettings::from).collect(),
            rules: set.rules.iter().map(RuleProfile::from).collect(),
        }
    }
}

impl From<RuleSetProfile> for RuleSet {
    fn from(profile: RuleSetProfile) -> Self {
        Self {
            use_default: profile.use_default,
            default_layers: profile.default_layers.into_iter().map(Layer::from).collect(),
            rules: profile.rules.into_iter().map(Rule::from).collect(),
        }
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// Host-level switches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Master switch. Off by default: nothing is drawn until the user opts
    /// in.
    #[serde(default)]
    pub enabled: bool,

    /// Whether recursive rules may apply below their matched folder.
    #[serde(default = "default_true")]
    pub allow_recursive: bool,

    /// Growth of a small slot's image rect on each side, as a fraction of
    /// the slot size.
    #[serde(default = "default_small_slot_margin")]
    pub small_slot_margin: f32,
}

fn default_true() -> bool {
    true
}

fn default_small_slot_margin() -> f32 {
    SMALL_SLOT_MARGIN
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enabled: false,
            allow_recursive: true,
            small_slot_margin: SMALL_SLOT_MARGIN,
        }
    }
}

impl Preferences {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample_set() -> RuleSet {
        RuleSet::from_rules([
            Rule::by_name("Scripts;Scenes").with_layer(
                Layer::builtin("folder")
                    .with_tint(Color::rgb(255, 200, 0))
                    .with_crop(CropMode::Auto),
            ),
            Rule::by_path("Assets/Art").recursive(true).with_layers([
                Layer::asset("art.png").with_background(Color::rgba(0, 0, 0, 128)),
                Layer::builtin("star")
                    .with_rect(UnitRect::new(0.5, 0.5, 0.5, 0.5))
                    .with_scale_mode(ScaleMode::ScaleToFit)
                    .with_crop(CropMode::Manual {
                        rect: UnitRect::new(0.25, 0.0, 0.5, 1.0),
                    }),
            ]),
            Rule::by_name("Scripts").recursive(true).with_layer(Layer::builtin("dot")),
        ])
        .with_default(vec![Layer::builtin("folder")])
    }

    #[test]
    fn roundtrip_preserves_resolution() {
        let set = sample_set();
        let json = RuleSetProfile::from(&set).to_json().unwrap();
        let restored: RuleSet = RuleSetProfile::from_json(&json).unwrap().into();

        assert_eq!(restored, set);

        let paths = [
            "Assets/Scripts",
            "Assets/Game/Scripts/AI",
            "Assets/Scenes",
            "Assets/Art",
            "Assets/Art/Characters",
            "Assets/ArtSource",
            "Assets/Other",
        ];
        for path in paths {
            for allow_recursive in [true, false] {
                assert_eq!(
                    restored.resolve(path, allow_recursive),
                    set.resolve(path, allow_recursive),
                    "{path} (recursive: {allow_recursive})"
                );
            }
        }
    }

    #[test]
    fn json_uses_camel_case() {
        let json = RuleSetProfile::from(&sample_set()).to_json_pretty().unwrap();
        assert!(json.contains("\"useDefault\""));
        assert!(json.contains("\"keyType\": \"name\""));
        assert!(json.contains("\"relativeRect\""));
        assert!(json.contains("\"builtinIconId\""));
        assert!(json.contains("\"sourceAssetRef\""));
        assert!(json.contains("\"scale-to-fit\""));
        assert!(json.contains("\"mode\": \"auto\""));
    }

    #[test]
    fn toggled_off_colors_survive() {
        let settings = LayerSettings {
            color: Color::rgb(1, 2, 3),
            ..LayerSettings::builtin("dot")
        };
        let layer = Layer::from(settings.clone());
        assert_eq!(layer.tint, None);
        assert_eq!(layer.background, None);

        let json = RuleSetProfile::new()
            .with_default(vec![settings])
            .to_json()
            .unwrap();
        let restored = RuleSetProfile::from_json(&json).unwrap();
        assert_eq!(restored.default_layers[0].color, Color::rgb(1, 2, 3));
    }

    #[test]
    fn sparse_json_fills_defaults() {
        let json = r#"{ "rules": [ { "keyType": "byPath", "keys": "Assets/Foo",
            "layers": [ { "sourceAssetRef": "foo.png" } ] } ] }"#;
        let set: RuleSet = RuleSetProfile::from_json(json).unwrap().into();

        let rule = &set.rules[0];
        assert_eq!(rule.key_type, KeyType::Path);
        assert!(!rule.recursive);
        assert_eq!(rule.layers[0], Layer::asset("foo.png"));
        assert!(!set.use_default);
    }

    #[test]
    fn unknown_key_type_loads_but_never_matches() {
        let json = r#"{ "rules": [
            { "keyType": "name", "keys": "Scripts", "layers": [ { "builtinIconId": "dot" } ] },
            { "keyType": "byGuid", "keys": "Scripts", "layers": [ { "builtinIconId": "star" } ] }
        ] }"#;
        let set: RuleSet = RuleSetProfile::from_json(json).unwrap().into();

        assert_eq!(set.rules[1].key_type, KeyType::Unrecognized);
        let found = set.resolve("Assets/Scripts", true).unwrap();
        assert_eq!(found.layers[0].source.builtin.as_deref(), Some("dot"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(RuleSetProfile::from_json("{ rules"), Err(Error::Json(_))));
    }

    #[test]
    fn empty_profile_deserializes() {
        let profile = RuleSetProfile::from_json("{}").unwrap();
        assert_eq!(profile, RuleSetProfile::default());
    }

    #[test]
    fn preferences_defaults() {
        let prefs = Preferences::from_json("{}").unwrap();
        assert_eq!(prefs, Preferences::default());
        assert!(!prefs.enabled);
        assert!(prefs.allow_recursive);

        let prefs = Preferences::from_json(r#"{ "enabled": true, "allowRecursive": false }"#).unwrap();
        assert!(prefs.enabled);
        assert!(!prefs.allow_recursive);
        assert_eq!(prefs.small_slot_margin, SMALL_SLOT_MARGIN);
    }
}
