//! Icon layers: one image plus its placement, crop, tint and background.
//!
//! A rule carries an ordered list of [`Layer`]s. The first layer is drawn
//! at the bottom and every later layer paints over it, which is how badges
//! and overlays are stacked on a folder icon.

pub mod svg;

pub use svg::SvgSource;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::{DrawRect, SizePx, UnitRect};

// ============================================================================
// LayerSource
// ============================================================================

/// Where a layer's image comes from.
///
/// A user-supplied asset takes priority over the built-in icon whenever it
/// resolves; the built-in id is only consulted as a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerSource {
    /// Reference to a user-supplied image asset.
    pub asset: Option<String>,
    /// Identifier of a built-in icon.
    pub builtin: Option<String>,
}

impl LayerSource {
    pub fn asset(reference: impl Into<String>) -> Self {
        Self {
            asset: Some(reference.into()),
            builtin: None,
        }
    }

    pub fn builtin(id: impl Into<String>) -> Self {
        Self {
            asset: None,
            builtin: Some(id.into()),
        }
    }

    /// Returns true if either reference is filled in.
    ///
    /// This only checks that there is something to resolve; whether an
    /// image provider actually knows the reference is decided at render
    /// time.
    pub fn is_set(&self) -> bool {
        let filled = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.asset) || filled(&self.builtin)
    }
}

// ============================================================================
// CropMode / ScaleMode
// ============================================================================

/// How much of the source image a layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CropMode {
    /// The whole image.
    #[default]
    None,
    /// A region given in unit-square coordinates of the image.
    Manual { rect: UnitRect },
    /// The tight box around the image's visible pixels.
    Auto,
}

/// How a (possibly cropped) image is mapped into its draw rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ScaleMode {
    /// Stretch to cover the rect exactly, ignoring aspect ratio.
    #[default]
    StretchToFill,
    /// Keep aspect ratio and cover the rect, cutting off the overflow.
    ScaleAndCrop,
    /// Keep aspect ratio and fit inside the rect, centered.
    ScaleToFit,
}

/// Where an image lands inside a draw rect, and which part of it shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Destination rect in draw coordinates.
    pub dest: DrawRect,
    /// Visible part of the image, in unit-square image coordinates.
    pub source: UnitRect,
}

impl ScaleMode {
    /// Maps an image of `image` pixels into `target`.
    pub fn place(self, image: SizePx, target: DrawRect) -> Placement {
        let stretched = Placement {
            dest: target,
            source: UnitRect::FULL,
        };

        let (Some(image_aspect), false) = (image.aspect(), target.is_empty()) else {
            return stretched;
        };
        let target_aspect = target.width / target.height;

        match self {
            Self::StretchToFill => stretched,
            Self::ScaleToFit => {
                let dest = if image_aspect > target_aspect {
                    let height = target.width / image_aspect;
                    DrawRect::new(
                        target.x,
                        target.y + (target.height - height) / 2.0,
                        target.width,
                        height,
                    )
                } else {
                    let width = target.height * image_aspect;
                    DrawRect::new(
                        target.x + (target.width - width) / 2.0,
                        target.y,
                        width,
                        target.height,
                    )
                };
                Placement {
                    dest,
                    source: UnitRect::FULL,
                }
            }
            Self::ScaleAndCrop => {
                let source = if image_aspect > target_aspect {
                    let visible = target_aspect / image_aspect;
                    UnitRect::new((1.0 - visible) / 2.0, 0.0, visible, 1.0)
                } else {
                    let visible = image_aspect / target_aspect;
                    UnitRect::new(0.0, (1.0 - visible) / 2.0, 1.0, visible)
                };
                Placement {
                    dest: target,
                    source,
                }
            }
        }
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One visual element within a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Position and size relative to the slot, in the unit square.
    pub rect: UnitRect,
    /// Color multiplied into the image, if any.
    pub tint: Option<Color>,
    /// Fill drawn under the image, if any.
    pub background: Option<Color>,
    pub source: LayerSource,
    pub crop: CropMode,
    pub scale_mode: ScaleMode,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            rect: UnitRect::FULL,
            tint: None,
            background: None,
            source: LayerSource::default(),
            crop: CropMode::None,
            scale_mode: ScaleMode::StretchToFill,
        }
    }
}

impl Layer {
    /// A full-slot layer showing a user-supplied asset.
    pub fn asset(reference: impl Into<String>) -> Self {
        Self {
            source: LayerSource::asset(reference),
            ..Self::default()
        }
    }

    /// A full-slot layer showing a built-in icon.
    pub fn builtin(id: impl Into<String>) -> Self {
        Self {
            source: LayerSource::builtin(id),
            ..Self::default()
        }
    }

    pub fn with_rect(mut self, rect: UnitRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_tint(mut self, color: Color) -> Self {
        self.tint = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn with_crop(mut self, crop: CropMode) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_scale_mode(mut self, scale_mode: ScaleMode) -> Self {
        self.scale_mode = scale_mode;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
