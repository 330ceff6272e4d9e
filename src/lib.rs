//! folco-overlay: rule-driven folder icon overlays
//!
//! This crate picks, for a folder path, the configured rule out of an
//! ordered rule list and renders that rule's stack of image layers onto a
//! target rect. Layers can be cropped (by hand or to their visible pixels),
//! tinted, backed by a fill color and scaled three ways.
//!
//! # Example
//!
//! ```
//! use folco_overlay::{
//!     AssetLibrary, Color, CropMode, ImageCache, Layer, LayerCompositor,
//!     RasterCanvas, Rule, RuleSet, UnitRect,
//! };
//!
//! let rules = RuleSet::from_rules([
//!     Rule::by_name("Scripts;Editor")
//!         .recursive(true)
//!         .with_layer(Layer::builtin("folder").with_tint(Color::rgb(90, 170, 255)))
//!         .with_layer(
//!             Layer::builtin("star")
//!                 .with_rect(UnitRect::new(0.5, 0.5, 0.5, 0.5))
//!                 .with_crop(CropMode::Auto),
//!         ),
//! ]);
//!
//! let rule = rules.resolve("Assets/Game/Scripts/AI", true).unwrap();
//!
//! let library = AssetLibrary::new();
//! let mut cache = ImageCache::new();
//! let mut canvas = RasterCanvas::new(64, 64);
//! let bounds = canvas.bounds();
//! let drawn = LayerCompositor::new(&library, &mut cache).render(&rule.layers, bounds, false, &mut canvas);
//! assert_eq!(drawn, 2);
//! ```
//!
//! # Serializable Profiles
//!
//! Rule sets are persisted and exchanged as [`RuleSetProfile`]s. A
//! [`FolderIconRenderer`] bundles rules, [`Preferences`], images and the
//! cache, and implements [`Configurable`]:
//!
//! ```
//! use folco_overlay::{Configurable, FolderIconRenderer, RuleSetProfile};
//!
//! let json = r#"{ "rules": [ { "keyType": "path", "keys": "Assets/Art", "recursive": true,
//!     "layers": [ { "builtinIconId": "square", "tint": true,
//!                   "color": { "r": 255, "g": 0, "b": 0, "a": 255 } } ] } ] }"#;
//!
//! let mut renderer: FolderIconRenderer = FolderIconRenderer::default();
//! renderer.apply_profile(&RuleSetProfile::from_json(json).unwrap());
//! assert!(renderer.resolve("Assets/Art/Characters").is_some());
//!
//! let exported = renderer.export_profile().to_json().unwrap();
//! ```

mod autocrop;
mod cache;
mod canvas;
mod color;
mod compositor;
mod error;
mod geometry;
mod icon;
mod layer;
mod profile;
mod provider;
mod renderer;
mod rule;
mod ruleset;

pub use autocrop::{CropBox, bounding_box};
pub use cache::{ContentId, ImageCache};
pub use canvas::RasterCanvas;
pub use color::Color;
pub use compositor::{DrawOp, DrawSurface, LayerCompositor, RecordingSurface, SMALL_SLOT_MARGIN};
pub use error::{Error, Result};
pub use geometry::{DrawRect, RectPx, SizePx, UnitRect};
pub use icon::{IconImage, ImageSurface, PixelFormat, RawImage, crop_pixels, decode_pixels};
pub use layer::{CropMode, Layer, LayerSource, Placement, ScaleMode, SvgSource};
pub use profile::{LayerSettings, Preferences, RuleProfile, RuleSetProfile};
pub use provider::{AssetLibrary, BUILTIN_GLYPHS, BuiltinIcons, EMOJI_PREFIX, ImageProvider, SharedImage};
pub use renderer::{Configurable, FolderIconRenderer, OverlayHook, classify_slot};
pub use rule::{KEY_DELIMITER, KeyType, Rule, RuleIdentity};
pub use ruleset::RuleSet;
