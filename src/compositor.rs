//! Rendering a rule's layer stack onto a drawing surface.
//!
//! For every layer, in order:
//!
//! 1. place its unit rect inside the target rect
//! 2. resolve the image (asset first, then built-in); unresolved layers
//!    are skipped
//! 3. fill the background, if any
//! 4. crop (none, manual region or auto-crop box)
//! 5. draw with the layer's scale mode, tinted if a tint is set
//!
//! Small (list-row) slots inflate the image rect slightly before drawing.
//! Failures never abort the pass; they are logged and only the affected
//! layer is skipped or drawn uncropped.

use std::sync::Arc;

use image::RgbaImage;
use log::{debug, warn};

use crate::cache::{ContentId, ImageCache};
use crate::color::Color;
use crate::error::Error;
use crate::geometry::{DrawRect, SizePx};
use crate::icon::{IconImage, ImageSurface, crop_pixels};
use crate::layer::{CropMode, Layer, ScaleMode};
use crate::provider::{ImageProvider, SharedImage};

/// Fraction of the slot size a small slot's image rect grows by on each
/// side (1.5px on a 16px row icon).
pub const SMALL_SLOT_MARGIN: f32 = 1.5 / 16.0;

// ============================================================================
// DrawSurface
// ============================================================================

/// Receiver of the draw operations produced by the compositor.
pub trait DrawSurface {
    /// Fills `rect` with `color`, alpha-blended over what is there.
    fn fill_rect(&mut self, rect: DrawRect, color: Color);

    /// Draws `image` into `rect` using `scale_mode`.
    ///
    /// With a tint, every source pixel is multiplied by it before blending.
    fn draw_image(
        &mut self,
        rect: DrawRect,
        image: &dyn ImageSurface,
        scale_mode: ScaleMode,
        tint: Option<Color>,
    );
}

/// A recorded draw operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: DrawRect,
        color: Color,
    },
    DrawImage {
        rect: DrawRect,
        /// Content identity of the image that was drawn.
        image: ContentId,
        size: SizePx,
        scale_mode: ScaleMode,
        tint: Option<Color>,
    },
}

/// A [`DrawSurface`] that only records what was asked of it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }
}

impl DrawSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: DrawRect, color: Color) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn draw_image(
        &mut self,
        rect: DrawRect,
        image: &dyn ImageSurface,
        scale_mode: ScaleMode,
        tint: Option<Color>,
    ) {
        self.ops.push(DrawOp::DrawImage {
            rect,
            image: ContentId::of(image),
            size: image.size(),
            scale_mode,
            tint,
        });
    }
}

// ============================================================================
// LayerCompositor
// ============================================================================

/// Renders layer stacks, resolving images through a provider and cropping
/// through a shared [`ImageCache`].
pub struct LayerCompositor<'a> {
    provider: &'a dyn ImageProvider,
    cache: &'a mut ImageCache,
    small_slot_margin: f32,
}

/// The image a layer ends up drawing.
enum LayerImage {
    Source(SharedImage),
    /// Cached readable copy of a source that is not directly readable.
    Readable(Arc<RgbaImage>),
    Cropped(IconImage),
}

impl LayerImage {
    fn surface(&self) -> &dyn ImageSurface {
        match self {
            Self::Source(image) => &**image,
            Self::Readable(pixels) => &**pixels,
            Self::Cropped(image) => image,
        }
    }
}

impl<'a> LayerCompositor<'a> {
    pub fn new(provider: &'a dyn ImageProvider, cache: &'a mut ImageCache) -> Self {
        Self {
            provider,
            cache,
            small_slot_margin: SMALL_SLOT_MARGIN,
        }
    }

    /// Overrides [`SMALL_SLOT_MARGIN`].
    pub fn with_small_slot_margin(mut self, margin: f32) -> Self {
        self.small_slot_margin = margin.max(0.0);
        self
    }

    /// Draws `layers` bottom to top into `target`.
    ///
    /// Returns the number of layers that drew an image.
    pub fn render(
        &mut self,
        layers: &[Layer],
        target: DrawRect,
        is_small_slot: bool,
        surface: &mut dyn DrawSurface,
    ) -> usize {
        layers
            .iter()
            .filter(|layer| self.render_layer(layer, target, is_small_slot, surface))
            .count()
    }

    fn render_layer(
        &mut self,
        layer: &Layer,
        target: DrawRect,
        is_small_slot: bool,
        surface: &mut dyn DrawSurface,
    ) -> bool {
        let rect = target.project(&layer.rect);
        if layer.rect.is_degenerate() || rect.is_empty() {
            debug!("skipping layer with empty rect {:?}", layer.rect);
            return false;
        }

        let Some(source) = self.resolve_source(layer) else {
            let err = Error::UnresolvedSource {
                asset: layer.source.asset.clone(),
                builtin: layer.source.builtin.clone(),
            };
            warn!("skipping layer: {err}");
            return false;
        };

        if let Some(color) = layer.background {
            surface.fill_rect(rect, color);
        }

        let image = self.prepare(source, layer.crop);
        if image.surface().size().is_empty() {
            debug!("skipping layer whose crop selects no pixels");
            return false;
        }

        let rect = if is_small_slot {
            let slot = target.width.min(target.height);
            rect.inflate(slot * self.small_slot_margin)
        } else {
            rect
        };

        surface.draw_image(rect, image.surface(), layer.scale_mode, layer.tint);
        true
    }

    /// Asset first; the built-in id only when the asset does not resolve.
    fn resolve_source(&self, layer: &Layer) -> Option<SharedImage> {
        let asset = layer
            .source
            .asset
            .as_deref()
            .filter(|r| !r.is_empty())
            .and_then(|r| self.provider.resolve_asset(r));

        asset.or_else(|| {
            layer
                .source
                .builtin
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .and_then(|id| self.provider.resolve_builtin(id))
        })
    }

    /// Readies the source for drawing.
    ///
    /// Sources that are not directly readable are swapped for their cached
    /// readable copy, so surfaces never decode per frame. If no copy can be
    /// made the source is drawn as-is, uncropped.
    fn prepare(&mut self, source: SharedImage, mode: CropMode) -> LayerImage {
        let image: &dyn ImageSurface = &*source;
        if let Some(pixels) = image.pixels() {
            return match self.crop(image, None, pixels, mode) {
                Some(cropped) => LayerImage::Cropped(cropped),
                None => LayerImage::Source(source),
            };
        }

        let id = ContentId::of(image);
        match self.cache.readable_copy_by_id(id, image) {
            Ok(copy) => match self.crop(image, Some(id), &copy, mode) {
                Some(cropped) => LayerImage::Cropped(cropped),
                None => LayerImage::Readable(copy),
            },
            Err(err) => {
                warn!("drawing uncropped: {err}");
                LayerImage::Source(source)
            }
        }
    }

    /// Applies `mode` to `pixels`, the readable form of `image`. Returns
    /// `None` when the whole image should be drawn.
    fn crop(
        &mut self,
        image: &dyn ImageSurface,
        id: Option<ContentId>,
        pixels: &RgbaImage,
        mode: CropMode,
    ) -> Option<IconImage> {
        let region = match mode {
            CropMode::None => return None,
            CropMode::Manual { rect } if rect.is_full() => return None,
            CropMode::Manual { rect } => rect.to_pixels(image.size()),
            CropMode::Auto => {
                let id = id.unwrap_or_else(|| ContentId::of(image));
                self.cache.crop_box_of(id, pixels)?.to_rect()
            }
        };
        Some(IconImage::new(crop_pixels(pixels, region)))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocrop::CropBox;
    use crate::geometry::UnitRect;
    use crate::icon::{PixelFormat, RawImage};
    use crate::provider::AssetLibrary;
    use image::Rgba;

    const TARGET: DrawRect = DrawRect {
        x: 0.0,
        y: 0.0,
        width: 64.0,
        height: 64.0,
    };

    fn bordered(size: u32, border: u32) -> RgbaImage {
        RgbaImage::from_fn(size, size, |x, y| {
            let inside = (border..size - border).contains(&x) && (border..size - border).contains(&y);
            if inside { Rgba([0, 255, 0, 255]) } else { Rgba([0, 0, 0, 0]) }
        })
    }

    fn library() -> AssetLibrary {
        let mut library = AssetLibrary::new();
        library.insert_pixels("solid.png", RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        library.insert_pixels("bordered.png", bordered(10, 2));
        library.insert(
            "raw.png",
            Arc::new(RawImage::new(SizePx::new(10, 10), PixelFormat::Rgba8, bordered(10, 2).into_raw())),
        );
        library.insert(
            "broken.png",
            Arc::new(RawImage::new(SizePx::new(10, 10), PixelFormat::Rgba8, vec![0; 7])),
        );
        library
    }

    fn render(layers: &[Layer], is_small: bool) -> (Vec<DrawOp>, usize) {
        let library = library();
        let mut cache = ImageCache::new();
        let mut surface = RecordingSurface::new();
        let drawn = LayerCompositor::new(&library, &mut cache).render(layers, TARGET, is_small, &mut surface);
        (surface.ops, drawn)
    }

    fn image_sizes(ops: &[DrawOp]) -> Vec<SizePx> {
        ops.iter()
            .filter_map(|op| match op {
                DrawOp::DrawImage { size, .. } => Some(*size),
                DrawOp::FillRect { .. } => None,
            })
            .collect()
    }

    #[test]
    fn no_layers_no_ops() {
        let (ops, drawn) = render(&[], false);
        assert!(ops.is_empty());
        assert_eq!(drawn, 0);
    }

    #[test]
    fn unresolved_layer_does_not_stop_others() {
        let layers = [
            Layer::asset("missing.png").with_background(Color::rgb(0, 0, 255)),
            Layer::asset("solid.png"),
        ];
        let (ops, drawn) = render(&layers, false);
        assert_eq!(drawn, 1);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], DrawOp::DrawImage { rect, .. } if rect == TARGET));
    }

    #[test]
    fn asset_takes_priority_over_builtin() {
        let layer = Layer {
            source: crate::layer::LayerSource {
                asset: Some("solid.png".into()),
                builtin: Some("star".into()),
            },
            ..Layer::default()
        };
        let (ops, _) = render(&[layer], false);
        assert_eq!(image_sizes(&ops), [SizePx::new(8, 8)]);
    }

    #[test]
    fn falls_back_to_builtin() {
        let layer = Layer {
            source: crate::layer::LayerSource {
                asset: Some("missing.png".into()),
                builtin: Some("star".into()),
            },
            ..Layer::default()
        };
        let (ops, _) = render(&[layer], false);
        assert_eq!(image_sizes(&ops), [SizePx::new(64, 64)]);
    }

    #[test]
    fn background_drawn_beneath_image() {
        let layer = Layer::asset("solid.png")
            .with_rect(UnitRect::new(0.5, 0.5, 0.5, 0.5))
            .with_background(Color::rgb(1, 2, 3))
            .with_tint(Color::rgb(9, 9, 9));
        let (ops, _) = render(&[layer], false);
        let quarter = DrawRect::new(32.0, 32.0, 32.0, 32.0);
        assert_eq!(
            ops[0],
            DrawOp::FillRect {
                rect: quarter,
                color: Color::rgb(1, 2, 3)
            }
        );
        assert!(matches!(
            ops[1],
            DrawOp::DrawImage { rect, tint: Some(tint), .. } if rect == quarter && tint == Color::rgb(9, 9, 9)
        ));
    }

    #[test]
    fn layers_keep_order() {
        let layers = [Layer::asset("solid.png"), Layer::asset("bordered.png")];
        let (ops, drawn) = render(&layers, false);
        assert_eq!(drawn, 2);
        assert_eq!(image_sizes(&ops), [SizePx::new(8, 8), SizePx::new(10, 10)]);
    }

    #[test]
    fn degenerate_rect_renders_nothing() {
        let layer = Layer::asset("solid.png")
            .with_rect(UnitRect::new(0.2, 0.2, 0.0, 0.5))
            .with_background(Color::WHITE);
        let (ops, drawn) = render(&[layer], false);
        assert!(ops.is_empty());
        assert_eq!(drawn, 0);
    }

    #[test]
    fn auto_crop_readable_and_raw() {
        let layers = [
            Layer::asset("bordered.png").with_crop(CropMode::Auto),
            Layer::asset("raw.png").with_crop(CropMode::Auto),
        ];
        let (ops, _) = render(&layers, false);
        assert_eq!(image_sizes(&ops), [SizePx::new(6, 6), SizePx::new(6, 6)]);
    }

    #[test]
    fn manual_crop_selects_region() {
        let layer = Layer::asset("solid.png").with_crop(CropMode::Manual {
            rect: UnitRect::new(0.0, 0.5, 0.5, 0.5),
        });
        let (ops, _) = render(&[layer], false);
        assert_eq!(image_sizes(&ops), [SizePx::new(4, 4)]);
    }

    #[test]
    fn unreadable_source_drawn_uncropped() {
        let layer = Layer::asset("broken.png").with_crop(CropMode::Auto);
        let (ops, drawn) = render(&[layer], false);
        assert_eq!(drawn, 1);
        assert_eq!(image_sizes(&ops), [SizePx::new(10, 10)]);
    }

    #[test]
    fn empty_manual_crop_skips_image() {
        let layer = Layer::asset("solid.png").with_crop(CropMode::Manual {
            rect: UnitRect::new(0.0, 0.0, 0.0, 1.0),
        });
        let (ops, drawn) = render(&[layer], false);
        assert!(ops.is_empty());
        assert_eq!(drawn, 0);
    }

    #[test]
    fn small_slot_inflates_image_rect() {
        let target = DrawRect::new(0.0, 0.0, 16.0, 16.0);
        let library = library();
        let mut cache = ImageCache::new();
        let mut surface = RecordingSurface::new();
        LayerCompositor::new(&library, &mut cache).render(
            &[Layer::asset("solid.png").with_background(Color::WHITE)],
            target,
            true,
            &mut surface,
        );

        assert!(matches!(surface.ops[0], DrawOp::FillRect { rect, .. } if rect == target));
        assert!(matches!(
            surface.ops[1],
            DrawOp::DrawImage { rect, .. } if rect == DrawRect::new(-1.5, -1.5, 19.0, 19.0)
        ));
    }

    #[test]
    fn cache_is_shared_across_renders() {
        let library = library();
        let mut cache = ImageCache::new();
        let mut surface = RecordingSurface::new();
        let layers = [Layer::asset("raw.png").with_crop(CropMode::Auto)];

        for _ in 0..3 {
            LayerCompositor::new(&library, &mut cache).render(&layers, TARGET, false, &mut surface);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(image_sizes(&surface.ops).len(), 3);
    }

    #[test]
    fn uncropped_raw_draws_cached_copy() {
        let library = library();
        let mut cache = ImageCache::new();
        let mut surface = RecordingSurface::new();
        let layers = [Layer::asset("raw.png")];

        for _ in 0..3 {
            LayerCompositor::new(&library, &mut cache).render(&layers, TARGET, false, &mut surface);
        }

        let raw = library.resolve_asset("raw.png").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.has_readable_copy(&*raw));

        let copy = ContentId::of(&*cache.readable_copy(&*raw).unwrap());
        assert_eq!(surface.ops.len(), 3);
        for op in &surface.ops {
            assert!(matches!(
                op,
                DrawOp::DrawImage { image, size, .. } if *image == copy && *size == SizePx::new(10, 10)
            ));
        }
    }

    #[test]
    fn auto_crop_of_raw_reuses_entry() {
        let library = library();
        let mut cache = ImageCache::new();
        let mut surface = RecordingSurface::new();
        let layers = [Layer::asset("raw.png").with_crop(CropMode::Auto)];
        LayerCompositor::new(&library, &mut cache).render(&layers, TARGET, false, &mut surface);

        let raw = library.resolve_asset("raw.png").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.has_readable_copy(&*raw));
        assert_eq!(
            cache.auto_crop_box(&*raw).unwrap(),
            Some(CropBox {
                left: 2,
                right: 7,
                top: 2,
                bottom: 7
            })
        );
    }
}
