//! Error types shared across the crate.

use thiserror::Error;

/// Errors produced while matching rules or preparing layer images.
///
/// None of these ever escape a render pass: [`RuleSet::resolve`] and
/// [`LayerCompositor::render`] log them and continue with the next rule or
/// layer. They are returned only from the lower-level fallible helpers.
///
/// [`RuleSet::resolve`]: crate::RuleSet::resolve
/// [`LayerCompositor::render`]: crate::LayerCompositor::render
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("unresolved layer source (asset: {asset:?}, builtin: {builtin:?})")]
    UnresolvedSource {
        asset: Option<String>,
        builtin: Option<String>,
    },

    #[error("unreadable pixel data: {0}")]
    UnreadablePixelData(String),

    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
