//! Tight bounding boxes around the visible pixels of an image.

use image::RgbaImage;

use crate::geometry::RectPx;

/// Bounding box of the non-transparent pixels of an image.
///
/// All four edges are inclusive: `right` is the last column and `bottom`
/// the last row that contain a visible pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropBox {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl CropBox {
    /// The box covering a whole `width`×`height` image.
    ///
    /// Both dimensions must be non-zero.
    pub(crate) fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            right: width - 1,
            top: 0,
            bottom: height - 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }

    /// The pixel region this box selects.
    pub fn to_rect(&self) -> RectPx {
        RectPx::new(self.left, self.top, self.width(), self.height())
    }
}

/// Computes the smallest box containing every pixel with alpha > 0.
///
/// Each edge is found by its own scan inward from that side, stopping at
/// the first row or column holding a visible pixel. A fully transparent
/// image yields the full image extent. Returns `None` only for an image
/// with no pixels at all.
pub fn bounding_box(image: &RgbaImage) -> Option<CropBox> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let visible = |x: u32, y: u32| image.get_pixel(x, y)[3] > 0;
    let column_hit = |x: u32| (0..height).any(|y| visible(x, y));
    let row_hit = |y: u32| (0..width).any(|x| visible(x, y));

    let mut found = CropBox::full(width, height);

    if let Some(left) = (0..width).find(|&x| column_hit(x)) {
        found.left = left;
    }
    if let Some(right) = (0..width).rev().find(|&x| column_hit(x)) {
        found.right = right;
    }
    if let Some(top) = (0..height).find(|&y| row_hit(y)) {
        found.top = top;
    }
    if let Some(bottom) = (0..height).rev().find(|&y| row_hit(y)) {
        found.bottom = bottom;
    }

    Some(found)
}
