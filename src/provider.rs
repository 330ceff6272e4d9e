//! Image providers: how layer source references become surfaces.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::geometry::SizePx;
use crate::icon::{IconImage, ImageSurface, PixelFormat, RawImage};
use crate::layer::SvgSource;

/// A shared handle to an image surface.
pub type SharedImage = Arc<dyn ImageSurface + Send + Sync>;

/// Resolves layer source references into images.
///
/// Implemented by the host. Either method returning `None` just means the
/// reference is unknown; the compositor skips the layer.
pub trait ImageProvider {
    /// Looks up a built-in icon by identifier.
    fn resolve_builtin(&self, id: &str) -> Option<SharedImage>;

    /// Looks up a user-supplied asset by reference.
    fn resolve_asset(&self, reference: &str) -> Option<SharedImage>;
}

// ============================================================================
// BuiltinIcons
// ============================================================================

/// Prefix selecting a twemoji glyph, e.g. `"emoji:🦆"`.
pub const EMOJI_PREFIX: &str = "emoji:";

const FOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><path d="M4 12h22l6 6h28v38H4z" fill="#ffffff"/></svg>"##;
const FOLDER_OPEN_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><path d="M4 12h22l6 6h24v8H14L4 52z M14 30h48l-10 26H4z" fill="#ffffff"/></svg>"##;
const DOT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><circle cx="32" cy="32" r="16" fill="#ffffff"/></svg>"##;
const STAR_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><path d="M32 4l8 20h20l-16 12 6 22-18-13-18 13 6-22L4 24h20z" fill="#ffffff"/></svg>"##;
const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64"><rect x="8" y="8" width="48" height="48" fill="#ffffff"/></svg>"##;

/// The bundled built-in glyphs, by identifier.
///
/// Glyphs are white on transparent so a layer tint fully controls their
/// color.
pub const BUILTIN_GLYPHS: &[(&str, &str)] = &[
    ("folder", FOLDER_SVG),
    ("folder-open", FOLDER_OPEN_SVG),
    ("dot", DOT_SVG),
    ("star", STAR_SVG),
    ("square", SQUARE_SVG),
];

/// Rasterizes built-in icon glyphs.
///
/// Glyphs are handed out as [`RawImage`]s: like a host's GPU-resident
/// editor icons they are not directly readable, so cropping them goes
/// through the image cache.
#[derive(Debug, Clone)]
pub struct BuiltinIcons {
    size: u32,
}

impl Default for BuiltinIcons {
    fn default() -> Self {
        Self::new(64)
    }
}

impl BuiltinIcons {
    /// Creates a provider rasterizing glyphs at `size` pixels.
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn source(id: &str) -> Option<SvgSource> {
        if let Some(emoji) = id.strip_prefix(EMOJI_PREFIX) {
            return Some(SvgSource::Emoji(emoji.to_string()));
        }
        BUILTIN_GLYPHS
            .iter()
            .find(|(name, _)| *name == id)
            .map(|&(_, svg)| SvgSource::Raw(svg))
    }

    /// Rasterizes the glyph `id`, or `None` if it is unknown.
    pub fn render(&self, id: &str) -> Option<RawImage> {
        let pixels = Self::source(id)?.render(self.size)?;
        let size = SizePx::new(pixels.width(), pixels.height());
        Some(RawImage::new(size, PixelFormat::Rgba8, pixels.into_raw()))
    }
}

// ============================================================================
// AssetLibrary
// ============================================================================

/// An in-memory [`ImageProvider`]: registered assets plus built-in glyphs.
///
/// Rasterized built-ins are kept, so each glyph is rendered once.
#[derive(Default)]
pub struct AssetLibrary {
    assets: HashMap<String, SharedImage>,
    builtins: BuiltinIcons,
    rendered: std::sync::Mutex<HashMap<String, SharedImage>>,
}

impl fmt::Debug for AssetLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLibrary")
            .field("assets", &self.assets.keys().collect::<Vec<_>>())
            .field("builtins", &self.builtins)
            .finish()
    }
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins(builtins: BuiltinIcons) -> Self {
        Self {
            builtins,
            ..Self::default()
        }
    }

    /// Registers an asset under `reference`, replacing any previous one.
    pub fn insert(&mut self, reference: impl Into<String>, image: SharedImage) {
        self.assets.insert(reference.into(), image);
    }

    /// Registers readable RGBA pixels.
    pub fn insert_pixels(&mut self, reference: impl Into<String>, pixels: image::RgbaImage) {
        self.insert(reference, Arc::new(IconImage::new(pixels)));
    }

    /// Registers an encoded image file (PNG, WebP, ...).
    ///
    /// The bytes stay encoded until a layer needs its pixels.
    pub fn insert_encoded(&mut self, reference: impl Into<String>, bytes: Vec<u8>) -> Result<()> {
        let raw = RawImage::from_encoded(bytes)?;
        self.insert(reference, Arc::new(raw));
        Ok(())
    }

    pub fn remove(&mut self, reference: &str) -> Option<SharedImage> {
        self.assets.remove(reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.assets.contains_key(reference)
    }
}

impl ImageProvider for AssetLibrary {
    fn resolve_builtin(&self, id: &str) -> Option<SharedImage> {
        let mut rendered = self
            .rendered
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(image) = rendered.get(id) {
            return Some(Arc::clone(image));
        }

        let image: SharedImage = Arc::new(self.builtins.render(id)?);
        rendered.insert(id.to_string(), Arc::clone(&image));
        Some(image)
    }

    fn resolve_asset(&self, reference: &str) -> Option<SharedImage> {
        self.assets.get(reference).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn builtin_glyphs_render_unreadable() {
        let icons = BuiltinIcons::new(32);
        for (id, _) in BUILTIN_GLYPHS {
            let image = icons.render(id).unwrap_or_else(|| panic!("{id} should render"));
            assert_eq!(image.size(), SizePx::new(32, 32));
            assert!(image.pixels().is_none());
        }
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(BuiltinIcons::default().render("no-such-icon").is_none());
        assert!(AssetLibrary::new().resolve_builtin("no-such-icon").is_none());
    }

    #[test]
    fn builtin_is_rendered_once() {
        let library = AssetLibrary::new();
        let a = library.resolve_builtin("star").unwrap();
        let b = library.resolve_builtin("star").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn assets_resolve_by_reference() {
        let mut library = AssetLibrary::new();
        library.insert_pixels("red.png", RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])));

        let found = library.resolve_asset("red.png").unwrap();
        assert_eq!(found.size(), SizePx::new(2, 2));
        assert!(found.pixels().is_some());
        assert!(library.resolve_asset("blue.png").is_none());

        library.remove("red.png");
        assert!(!library.contains("red.png"));
    }

    #[test]
    fn encoded_assets_stay_raw() {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(RgbaImage::new(4, 2))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let mut library = AssetLibrary::new();
        library.insert_encoded("blank.png", bytes).unwrap();
        let found = library.resolve_asset("blank.png").unwrap();
        assert_eq!(found.size(), SizePx::new(4, 2));
        assert_eq!(found.format(), PixelFormat::Encoded);

        assert!(library.insert_encoded("junk", vec![1, 2, 3]).is_err());
    }
}
