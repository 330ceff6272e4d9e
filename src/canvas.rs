//! Software rendering of layer stacks into an RGBA image.
//!
//! [`RasterCanvas`] is a [`DrawSurface`] backed by an [`RgbaImage`]. Canvas
//! coordinates are pixel coordinates: a pixel is covered by a rect when its
//! center lies inside it. Images are sampled nearest-neighbour and blended
//! source-over.

use std::borrow::Cow;

use image::{Rgba, RgbaImage};
use log::warn;

use crate::color::Color;
use crate::compositor::DrawSurface;
use crate::geometry::DrawRect;
use crate::icon::{ImageSurface, decode_pixels};
use crate::layer::ScaleMode;

// ============================================================================
// RasterCanvas
// ============================================================================

/// A [`DrawSurface`] that rasterizes into an owned image.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    /// Creates a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Draws over an existing image, e.g. the host's folder icon.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// The whole canvas as a draw rect.
    pub fn bounds(&self) -> DrawRect {
        DrawRect::new(0.0, 0.0, self.image.width() as f32, self.image.height() as f32)
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.image.pixels_mut().for_each(|p| *p = Rgba([0, 0, 0, 0]));
    }

    /// Pixel columns and rows whose centers fall inside `rect`.
    fn covered(&self, rect: DrawRect) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
        if rect.is_empty() {
            return None;
        }
        let span = |start: f32, end: f32, extent: u32| {
            let first = (start - 0.5).ceil().clamp(0.0, extent as f32) as u32;
            let last = (end - 0.5).ceil().clamp(0.0, extent as f32) as u32;
            first..last
        };
        let xs = span(rect.x, rect.right(), self.image.width());
        let ys = span(rect.y, rect.bottom(), self.image.height());
        if xs.is_empty() || ys.is_empty() {
            None
        } else {
            Some((xs, ys))
        }
    }

    fn blend_pixel(&mut self, x: u32, y: u32, src: Rgba<u8>) {
        let dst = self.image.get_pixel_mut(x, y);
        *dst = alpha_blend(src, *dst);
    }
}

impl DrawSurface for RasterCanvas {
    fn fill_rect(&mut self, rect: DrawRect, color: Color) {
        let Some((xs, ys)) = self.covered(rect) else {
            return;
        };
        let src = Rgba(color.to_array());
        for y in ys {
            for x in xs.clone() {
                self.blend_pixel(x, y, src);
            }
        }
    }

    fn draw_image(
        &mut self,
        rect: DrawRect,
        image: &dyn ImageSurface,
        scale_mode: ScaleMode,
        tint: Option<Color>,
    ) {
        let pixels: Cow<'_, RgbaImage> = match image.pixels() {
            Some(pixels) => Cow::Borrowed(pixels),
            None => match decode_pixels(image) {
                Ok(pixels) => Cow::Owned(pixels),
                Err(err) => {
                    warn!("cannot rasterize image: {err}");
                    return;
                }
            },
        };
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let placement = scale_mode.place(image.size(), rect);
        let dest = placement.dest;
        let source = placement.source;
        let Some((xs, ys)) = self.covered(dest) else {
            return;
        };

        // Maps a canvas pixel center to a source pixel index along one axis.
        let sample = |pos: u32, origin: f32, extent: f32, from: f32, span: f32, size: u32| {
            let t = (pos as f32 + 0.5 - origin) / extent;
            let u = from + t.clamp(0.0, 1.0) * span;
            ((u * size as f32) as u32).min(size - 1)
        };

        for y in ys {
            let sy = sample(y, dest.y, dest.height, source.y, source.height, height);
            for x in xs.clone() {
                let sx = sample(x, dest.x, dest.width, source.x, source.width, width);
                let mut src = *pixels.get_pixel(sx, sy);
                if let Some(tint) = tint {
                    src = Rgba(Color::from_array(src.0).multiply(tint).to_array());
                }
                self.blend_pixel(x, y, src);
            }
        }
    }
}

/// Alpha blends two RGBA pixels (source over destination).
fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================
