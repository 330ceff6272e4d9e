//! The per-item entry point a host drives from its draw callback.

use image::RgbaImage;
use log::trace;

use crate::cache::ImageCache;
use crate::canvas::RasterCanvas;
use crate::compositor::{DrawSurface, LayerCompositor};
use crate::geometry::DrawRect;
use crate::profile::{Preferences, RuleSetProfile};
use crate::provider::{AssetLibrary, ImageProvider};
use crate::rule::Rule;
use crate::ruleset::RuleSet;

// ============================================================================
// Configurable Trait
// ============================================================================

/// Types that can be configured from a [`RuleSetProfile`].
pub trait Configurable {
    /// Replaces the current rules with the profile's.
    fn apply_profile(&mut self, profile: &RuleSetProfile);

    /// Exports the current rules as a profile.
    fn export_profile(&self) -> RuleSetProfile;
}

// ============================================================================
// OverlayHook
// ============================================================================

/// Host overlays (version-control badges and the like) drawn on top of a
/// folder's layers.
pub trait OverlayHook {
    fn draw_overlay(&self, path: &str, rect: DrawRect, surface: &mut dyn DrawSurface);
}

/// Splits a host item rect into the icon slot and whether it is a small
/// (list-row) slot.
///
/// A rect wider than it is tall is a list row with the icon at its left
/// edge; the slot is squared to the row height. Grid tiles keep their
/// width and drop the label area below the icon.
pub fn classify_slot(rect: DrawRect) -> (DrawRect, bool) {
    let is_small = rect.width > rect.height;
    let side = rect.width.min(rect.height);
    (DrawRect::new(rect.x, rect.y, side, side), is_small)
}

// ============================================================================
// FolderIconRenderer
// ============================================================================

/// Rules, preferences, images and cache for one host.
///
/// The host builds one renderer up front and calls
/// [`draw_item`](Self::draw_item) for every visible folder.
///
/// # Example
///
/// ```
/// use folco_overlay::{
///     AssetLibrary, Color, DrawRect, FolderIconRenderer, Layer, Preferences, RecordingSurface,
///     Rule, RuleSet,
/// };
///
/// let rules = RuleSet::from_rules([
///     Rule::by_name("Scripts").with_layer(Layer::builtin("folder").with_tint(Color::rgb(80, 160, 255))),
/// ]);
///
/// let mut renderer = FolderIconRenderer::new(AssetLibrary::new())
///     .with_rules(rules)
///     .with_preferences(Preferences { enabled: true, ..Preferences::default() });
///
/// let mut surface = RecordingSurface::new();
/// let drawn = renderer.draw_item("Assets/Scripts", DrawRect::new(0.0, 0.0, 64.0, 80.0), &mut surface);
/// assert_eq!(drawn, 1);
/// ```
pub struct FolderIconRenderer<P: ImageProvider = AssetLibrary> {
    rules: RuleSet,
    preferences: Preferences,
    provider: P,
    cache: ImageCache,
    overlay_hook: Option<Box<dyn OverlayHook>>,
}

impl Default for FolderIconRenderer<AssetLibrary> {
    fn default() -> Self {
        Self::new(AssetLibrary::new())
    }
}

impl<P: ImageProvider> FolderIconRenderer<P> {
    /// Creates a renderer with no rules and default preferences.
    pub fn new(provider: P) -> Self {
        Self {
            rules: RuleSet::new(),
            preferences: Preferences::default(),
            provider,
            cache: ImageCache::new(),
            overlay_hook: None,
        }
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_overlay_hook(mut self, hook: impl OverlayHook + 'static) -> Self {
        self.overlay_hook = Some(Box::new(hook));
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Mutable access for the configuration editor.
    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: Preferences) {
        self.preferences = preferences;
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Drops every cached readable copy and crop box.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The rule that applies to `path` under the current preferences.
    pub fn resolve(&self, path: &str) -> Option<&Rule> {
        self.rules.resolve(path, self.preferences.allow_recursive)
    }

    /// Draws the configured icon for the folder at `path` into the host
    /// item `rect`, then the host overlay if one is installed.
    ///
    /// Does nothing while the renderer is disabled or when neither a rule
    /// nor the default applies. Returns the number of layers that drew an
    /// image.
    pub fn draw_item(&mut self, path: &str, rect: DrawRect, surface: &mut dyn DrawSurface) -> usize {
        if !self.preferences.enabled {
            return 0;
        }

        let Some(layers) = self.rules.resolve_layers(path, self.preferences.allow_recursive) else {
            return 0;
        };

        let (slot, is_small) = classify_slot(rect);
        trace!("drawing {} layers for {path:?} (small: {is_small})", layers.len());

        let drawn = LayerCompositor::new(&self.provider, &mut self.cache)
            .with_small_slot_margin(self.preferences.small_slot_margin)
            .render(layers, slot, is_small, surface);

        if let Some(hook) = &self.overlay_hook {
            hook.draw_overlay(path, rect, surface);
        }
        drawn
    }

    /// Renders the icon for `path` into a `size`x`size` image, ignoring the
    /// enabled switch. Returns `None` when nothing applies to `path`.
    pub fn render_preview(&mut self, path: &str, size: u32) -> Option<RgbaImage> {
        let layers = self.rules.resolve_layers(path, self.preferences.allow_recursive)?;
        let mut canvas = RasterCanvas::new(size, size);
        let bounds = canvas.bounds();
        LayerCompositor::new(&self.provider, &mut self.cache)
            .with_small_slot_margin(self.preferences.small_slot_margin)
            .render(layers, bounds, false, &mut canvas);
        Some(canvas.into_image())
    }
}

impl<P: ImageProvider> Configurable for FolderIconRenderer<P> {
    /// Replaces the rule set. Cached image data stays valid since it is
    /// keyed by image content.
    fn apply_profile(&mut self, profile: &RuleSetProfile) {
        self.rules = profile.clone().into();
    }

    fn export_profile(&self) -> RuleSetProfile {
        RuleSetProfile::from(&self.rules)
    }
}

// ============================================================================
// Tests
// ============================================================================
