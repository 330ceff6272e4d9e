//! Rectangles in pixel, unit-square and draw-space coordinates.

use serde::{Deserialize, Serialize};

/// A rectangle defined in pixel coordinates.
///
/// Used for regions read out of an image, such as a crop region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or `None` for a degenerate size.
    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// A rectangle inside the unit square `[0,1]×[0,1]`.
///
/// Layer placement and manual crop regions are stored this way so they
/// scale with whatever slot or image they are applied to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct UnitRect {
    pub x: f32,
    pub y: f32,
    #[serde(rename = "w")]
    pub width: f32,
    #[serde(rename = "h")]
    pub height: f32,
}

impl Default for UnitRect {
    fn default() -> Self {
        Self::FULL
    }
}

impl UnitRect {
    /// The whole unit square.
    pub const FULL: Self = Self { x: 0.0, y: 0.0, width: 1.0, height: 1.0 };

    /// Creates a unit rect. Negative sizes are clamped to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Scales this rect to an image of `size`, truncating toward zero and
    /// clamping the result to the image bounds.
    pub fn to_pixels(&self, size: SizePx) -> RectPx {
        let scale = |v: f32, extent: u32| -> u32 {
            ((v * extent as f32) as i64).clamp(0, extent as i64) as u32
        };

        let x = scale(self.x, size.width);
        let y = scale(self.y, size.height);
        let width = scale(self.width, size.width).min(size.width - x);
        let height = scale(self.height, size.height).min(size.height - y);
        RectPx::new(x, y, width, height)
    }
}

/// A rectangle in the host's drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DrawRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Maps a unit-square rect into this rect:
    /// `origin + unit.origin * size`, `unit.size * size`.
    pub fn project(&self, unit: &UnitRect) -> DrawRect {
        DrawRect {
            x: self.x + unit.x * self.width,
            y: self.y + unit.y * self.height,
            width: unit.width * self.width,
            height: unit.height * self.height,
        }
    }

    /// Grows the rect by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> DrawRect {
        DrawRect {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_px_emptiness() {
        assert!(!RectPx::new(10, 20, 100, 200).is_empty());
        assert!(RectPx::new(0, 0, 0, 5).is_empty());
        assert!(RectPx::new(3, 3, 5, 0).is_empty());
    }

    #[test]
    fn unit_rect_to_pixels_clamps() {
        let size = SizePx::new(10, 20);
        assert_eq!(UnitRect::FULL.to_pixels(size), RectPx::new(0, 0, 10, 20));
        assert_eq!(
            UnitRect::new(0.5, 0.25, 0.5, 0.5).to_pixels(size),
            RectPx::new(5, 5, 5, 10)
        );
        // Overhanging rects are cut at the image edge.
        assert_eq!(
            UnitRect::new(0.8, 0.9, 0.5, 0.5).to_pixels(size),
            RectPx::new(8, 18, 2, 2)
        );
    }

    #[test]
    fn project_relative_rect() {
        let target = DrawRect::new(100.0, 50.0, 64.0, 32.0);
        let abs = target.project(&UnitRect::new(0.5, 0.5, 0.25, 0.5));
        assert_eq!(abs, DrawRect::new(132.0, 66.0, 16.0, 16.0));
    }

    #[test]
    fn degenerate_unit_rect() {
        assert!(UnitRect::new(0.0, 0.0, 0.0, 1.0).is_degenerate());
        assert!(UnitRect::new(0.0, 0.0, -1.0, 1.0).is_degenerate());
        assert!(!UnitRect::FULL.is_degenerate());
    }

    #[test]
    fn inflate_grows_all_sides() {
        let rect = DrawRect::new(10.0, 10.0, 16.0, 16.0).inflate(1.5);
        assert_eq!(rect, DrawRect::new(8.5, 8.5, 19.0, 19.0));
    }
}
