//! Per-image derived data, keyed by content.
//!
//! The same handful of configured images are cropped on every draw pass,
//! so the readable pixel copy and the auto-crop box of each image are
//! computed once and reused.
//!
//! ## Cache keys
//!
//! Entries are **content-addressed**: the key is a SHA-256 over the image
//! dimensions, pixel format and raw content, never the handle. Two
//! distinct surfaces with identical content share one entry, and an image
//! whose content changes simply lands under a new key. Stale entries are
//! never looked up again, which is why there is no explicit eviction: the
//! key space is bounded by the number of distinct configured images.
//!
//! ## Threading
//!
//! [`ImageCache`] is plain mutable state with `&mut self` methods. A host
//! sharing one cache across threads has to wrap it in a `Mutex` so the
//! check-then-insert in each lookup stays atomic.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use log::debug;
use sha2::{Digest, Sha256};

use crate::autocrop::{CropBox, bounding_box};
use crate::error::Result;
use crate::icon::{ImageSurface, decode_pixels};

/// Stable identity of an image's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Hashes the dimensions, format and raw content of a surface.
    pub fn of(image: &dyn ImageSurface) -> Self {
        let size = image.size();
        let mut hasher = Sha256::new();
        hasher.update(size.width.to_le_bytes());
        hasher.update(size.height.to_le_bytes());
        hasher.update([image.format().tag()]);
        hasher.update(image.raw_data());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({self})")
    }
}

impl fmt::Display for ContentId {
    /// Short hex prefix, enough to tell entries apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct CacheEntry {
    readable: Option<Arc<RgbaImage>>,
    crop_box: Option<Option<CropBox>>,
}

/// Memoizes readable pixel copies and auto-crop boxes by content identity.
#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<ContentId, CacheEntry>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct images seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a readable copy is stored for this content.
    pub fn has_readable_copy(&self, image: &dyn ImageSurface) -> bool {
        self.entries
            .get(&ContentId::of(image))
            .is_some_and(|e| e.readable.is_some())
    }

    /// Returns a pixel-addressable duplicate of `image`.
    ///
    /// The copy has the same width and height as the source. It is built
    /// on the first request for a given content and shared afterwards.
    /// A failed decode is not cached, so the next call retries.
    pub fn readable_copy(&mut self, image: &dyn ImageSurface) -> Result<Arc<RgbaImage>> {
        let id = ContentId::of(image);
        self.readable_copy_by_id(id, image)
    }

    /// Returns the auto-crop box of `image`.
    ///
    /// `None` means the image has no pixels to crop to.
    pub fn auto_crop_box(&mut self, image: &dyn ImageSurface) -> Result<Option<CropBox>> {
        let id = ContentId::of(image);
        let crop_box = match image.pixels() {
            Some(pixels) => self.crop_box_of(id, pixels),
            None => {
                let copy = self.readable_copy_by_id(id, image)?;
                self.crop_box_of(id, &copy)
            }
        };
        Ok(crop_box)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn readable_copy_by_id(
        &mut self,
        id: ContentId,
        image: &dyn ImageSurface,
    ) -> Result<Arc<RgbaImage>> {
        if let Some(copy) = self.entries.get(&id).and_then(|e| e.readable.clone()) {
            return Ok(copy);
        }

        debug!("readable copy miss for {id} ({:?})", image.format());
        let copy = Arc::new(decode_pixels(image)?);
        self.entries.entry(id).or_default().readable = Some(Arc::clone(&copy));
        Ok(copy)
    }

    /// Crop box of the content `id`, whose readable pixels are `pixels`.
    pub(crate) fn crop_box_of(&mut self, id: ContentId, pixels: &RgbaImage) -> Option<CropBox> {
        if let Some(found) = self.entries.get(&id).and_then(|e| e.crop_box) {
            return found;
        }

        let crop_box = bounding_box(pixels);
        debug!("auto-crop box for {id}: {crop_box:?}");
        self.entries.entry(id).or_default().crop_box = Some(crop_box);
        crop_box
    }
}
