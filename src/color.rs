//! RGBA colors used for tints and backgrounds.

use palette::Srgba;
use serde::{Deserialize, Serialize};

/// An 8-bit sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const CLEAR: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }

    /// Converts to a floating-point palette color in `0.0..=1.0`.
    pub fn to_srgba(self) -> Srgba<f32> {
        Srgba::new(self.r, self.g, self.b, self.a).into_format()
    }

    pub fn from_srgba(color: Srgba<f32>) -> Self {
        let c: Srgba<u8> = color.into_format();
        Self::rgba(c.red, c.green, c.blue, c.alpha)
    }

    /// Component-wise multiply, alpha included. Used for tinting.
    pub fn multiply(self, other: Color) -> Color {
        let a = self.to_srgba();
        let b = other.to_srgba();
        Self::from_srgba(Srgba::new(
            a.red * b.red,
            a.green * b.green,
            a.blue * b.blue,
            a.alpha * b.alpha,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiply_by_white_is_identity() {
        let c = Color::rgba(200, 100, 50, 128);
        assert_eq!(c.multiply(Color::WHITE), c);
    }

    #[test]
    fn multiply_by_clear_is_clear() {
        let c = Color::rgb(200, 100, 50);
        assert_eq!(c.multiply(Color::CLEAR), Color::CLEAR);
    }

    #[test]
    fn multiply_tints_channels() {
        let tinted = Color::WHITE.multiply(Color::rgb(255, 0, 0));
        assert_eq!(tinted, Color::rgb(255, 0, 0));
    }

    #[test]
    fn array_roundtrip() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(Color::from_array(c.to_array()), c);
    }
}
