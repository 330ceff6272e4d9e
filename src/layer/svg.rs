//! SVG rasterization for built-in icon glyphs, using resvg/usvg.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

// ============================================================================
// SvgSource
// ============================================================================

/// A source for SVG data.
///
/// Built-in glyphs are stored as raw markup; emoji are resolved through
/// twemoji when the `twemoji` feature is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvgSource {
    /// Raw SVG markup string.
    Raw(&'static str),

    /// An emoji character to be resolved via twemoji_assets.
    Emoji(String),
}

impl SvgSource {
    /// Resolves this source to SVG markup.
    ///
    /// Emoji sources resolve to `None` without the `twemoji` feature or
    /// when twemoji has no asset for the character.
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::Raw(svg) => Some(*svg),
            #[cfg(feature = "twemoji")]
            Self::Emoji(emoji) => {
                use twemoji_assets::svg::SvgTwemojiAsset;
                let asset = SvgTwemojiAsset::from_emoji(emoji)?;
                Some(asset.as_ref())
            }
            #[cfg(not(feature = "twemoji"))]
            Self::Emoji(_) => None,
        }
    }

    /// Rasterizes the source so its larger dimension is `size` pixels.
    pub fn render(&self, size: u32) -> Option<RgbaImage> {
        render_svg(self.resolve()?, size)
    }
}

// ============================================================================
// SVG Rendering
// ============================================================================

/// Renders an SVG string to an RGBA image at the specified size.
///
/// The SVG is scaled to fit within `size x size` pixels while preserving
/// aspect ratio (the larger dimension will be `size`).
///
/// Returns `None` if the SVG cannot be parsed or rendered.
pub fn render_svg(svg_data: &str, size: u32) -> Option<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_str(svg_data, &opts).ok()?;

    let svg_size = tree.size();
    let scale = (size as f32) / svg_size.width().max(svg_size.height());
    let width = (svg_size.width() * scale).ceil() as u32;
    let height = (svg_size.height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)?;
    let transform = Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Some(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    RgbaImage::from_fn(pixmap.width(), pixmap.height(), |x, y| {
        // tiny_skia uses premultiplied alpha, we need to unpremultiply
        pixmap
            .pixel(x, y)
            .map(|p| {
                let (r, g, b, a) = unpremultiply(p.red(), p.green(), p.blue(), p.alpha());
                Rgba([r, g, b, a])
            })
            .unwrap_or(Rgba([0, 0, 0, 0]))
    })
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
