//! Image surfaces that layers draw from.
//!
//! An [`ImageSurface`] is any 2D buffer of pixels with alpha. Some surfaces
//! hold pixels that can be read directly ([`IconImage`]); others only expose
//! their raw content, the way a GPU-resident texture or a compressed asset
//! would ([`RawImage`]). Reading pixels out of the latter goes through
//! [`ImageCache::readable_copy`](crate::ImageCache::readable_copy).

use std::fmt;

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};
use crate::geometry::{RectPx, SizePx};

/// Layout of the raw bytes behind a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGBA, straight alpha, row-major.
    Rgba8,
    /// 8-bit RGB; alpha is implicitly opaque.
    Rgb8,
    /// 8-bit luminance plus alpha.
    La8,
    /// 8-bit luminance; alpha is implicitly opaque.
    L8,
    /// A complete encoded file (PNG, WebP, ...) as understood by `image`.
    Encoded,
}

impl PixelFormat {
    /// Stable tag mixed into content identity.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Rgba8 => 0,
            Self::Rgb8 => 1,
            Self::La8 => 2,
            Self::L8 => 3,
            Self::Encoded => 4,
        }
    }
}

/// A 2D image that can be drawn by a layer.
pub trait ImageSurface: fmt::Debug {
    /// Pixel dimensions of the image.
    fn size(&self) -> SizePx;

    /// Layout of [`raw_data`](Self::raw_data).
    fn format(&self) -> PixelFormat;

    /// The surface content. This is what content identity is computed over.
    fn raw_data(&self) -> &[u8];

    /// Directly readable pixels, if the surface has them.
    ///
    /// Returns `None` for surfaces that need a readable copy first.
    fn pixels(&self) -> Option<&RgbaImage> {
        None
    }
}

/// A surface whose pixels are directly readable.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    /// The image data in RGBA format.
    pub data: RgbaImage,
}

impl IconImage {
    pub fn new(data: RgbaImage) -> Self {
        Self { data }
    }

    /// Copies the given pixel region into a new image.
    ///
    /// The region is clamped to the image bounds.
    pub fn crop(&self, region: RectPx) -> IconImage {
        IconImage::new(crop_pixels(&self.data, region))
    }
}

impl From<RgbaImage> for IconImage {
    fn from(data: RgbaImage) -> Self {
        Self::new(data)
    }
}

impl ImageSurface for IconImage {
    fn size(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }

    fn format(&self) -> PixelFormat {
        PixelFormat::Rgba8
    }

    fn raw_data(&self) -> &[u8] {
        self.data.as_raw()
    }

    fn pixels(&self) -> Option<&RgbaImage> {
        Some(&self.data)
    }
}

impl ImageSurface for RgbaImage {
    fn size(&self) -> SizePx {
        SizePx::new(self.width(), self.height())
    }

    fn format(&self) -> PixelFormat {
        PixelFormat::Rgba8
    }

    fn raw_data(&self) -> &[u8] {
        self.as_raw()
    }

    fn pixels(&self) -> Option<&RgbaImage> {
        Some(self)
    }
}

/// A surface whose pixels are not directly readable.
///
/// Built-in icons and encoded assets are handed out this way; drawing from
/// them with a crop requires a readable copy.
#[derive(Clone, PartialEq)]
pub struct RawImage {
    size: SizePx,
    format: PixelFormat,
    data: Vec<u8>,
}

impl fmt::Debug for RawImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawImage")
            .field("size", &self.size)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RawImage {
    /// Wraps raw pixel bytes of a known size and layout.
    pub fn new(size: SizePx, format: PixelFormat, data: Vec<u8>) -> Self {
        Self { size, format, data }
    }

    /// Wraps an encoded file. The dimensions are read from the header.
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self> {
        let (width, height) = image::ImageReader::new(std::io::Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| Error::UnreadablePixelData(e.to_string()))?
            .into_dimensions()?;
        Ok(Self::new(SizePx::new(width, height), PixelFormat::Encoded, bytes))
    }
}

impl ImageSurface for RawImage {
    fn size(&self) -> SizePx {
        self.size
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn raw_data(&self) -> &[u8] {
        &self.data
    }
}

/// Materializes RGBA pixels for any surface, preserving its dimensions.
///
/// Readable surfaces are cloned; raw surfaces are decoded from their
/// content. Callers on the render path should go through
/// [`ImageCache`](crate::ImageCache) instead of calling this per frame.
pub fn decode_pixels(surface: &dyn ImageSurface) -> Result<RgbaImage> {
    if let Some(pixels) = surface.pixels() {
        return Ok(pixels.clone());
    }

    let SizePx { width, height } = surface.size();
    let raw = surface.raw_data().to_vec();
    let mismatch = || {
        Error::UnreadablePixelData(format!(
            "{:?} data of {} bytes does not fit {}x{}",
            surface.format(),
            surface.raw_data().len(),
            width,
            height
        ))
    };

    let image = match surface.format() {
        PixelFormat::Rgba8 => RgbaImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
        PixelFormat::Rgb8 => DynamicImage::ImageRgb8(
            RgbImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
        )
        .to_rgba8(),
        PixelFormat::La8 => DynamicImage::ImageLumaA8(
            GrayAlphaImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
        )
        .to_rgba8(),
        PixelFormat::L8 => DynamicImage::ImageLuma8(
            GrayImage::from_raw(width, height, raw).ok_or_else(mismatch)?,
        )
        .to_rgba8(),
        PixelFormat::Encoded => image::load_from_memory(&raw)?.to_rgba8(),
    };

    if image.width() != width || image.height() != height {
        return Err(mismatch());
    }
    Ok(image)
}

/// Copies a pixel region out of an image, clamped to its bounds.
pub fn crop_pixels(image: &RgbaImage, region: RectPx) -> RgbaImage {
    let x = region.x.min(image.width());
    let y = region.y.min(image.height());
    let width = region.width.min(image.width() - x);
    let height = region.height.min(image.height() - y);
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn icon_image_is_readable() {
        let img = IconImage::new(RgbaImage::new(4, 3));
        assert_eq!(img.size(), SizePx::new(4, 3));
        assert!(img.pixels().is_some());
        assert_eq!(img.raw_data().len(), 4 * 3 * 4);
    }

    #[test]
    fn decoded_pixels_are_readable() {
        let raw = RawImage::new(SizePx::new(2, 1), PixelFormat::L8, vec![0, 255]);
        let pixels = decode_pixels(&raw).unwrap();
        let surface: &dyn ImageSurface = &pixels;
        assert_eq!(surface.size(), SizePx::new(2, 1));
        assert!(surface.pixels().is_some());
        assert_eq!(
            crate::cache::ContentId::of(surface),
            crate::cache::ContentId::of(&IconImage::new(pixels.clone()))
        );
    }

    #[test]
    fn raw_rgb_decodes_opaque() {
        let raw = RawImage::new(SizePx::new(2, 1), PixelFormat::Rgb8, vec![255, 0, 0, 0, 255, 0]);
        assert!(raw.pixels().is_none());

        let pixels = decode_pixels(&raw).unwrap();
        assert_eq!(pixels.dimensions(), (2, 1));
        assert_eq!(pixels.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(pixels.get_pixel(1, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn raw_with_wrong_length_is_unreadable() {
        let raw = RawImage::new(SizePx::new(2, 2), PixelFormat::Rgba8, vec![0; 3]);
        assert!(matches!(decode_pixels(&raw), Err(Error::UnreadablePixelData(_))));
    }

    #[test]
    fn encoded_png_decodes() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(source.clone())
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let raw = RawImage::from_encoded(bytes).unwrap();
        assert_eq!(raw.size(), SizePx::new(3, 2));
        assert_eq!(decode_pixels(&raw).unwrap(), source);
    }

    #[test]
    fn crop_is_clamped() {
        let img = IconImage::new(RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 4])));
        let cropped = img.crop(RectPx::new(8, 7, 5, 5));
        assert_eq!(cropped.size(), SizePx::new(2, 3));
    }
}
