//! Folder rules and the per-rule path matching semantics.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layer::Layer;

/// Separator between keys in a rule's key field.
pub const KEY_DELIMITER: char = ';';

/// What a rule's keys are compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub enum KeyType {
    /// The folder's own name, or any segment of its path when recursive.
    #[serde(alias = "byName")]
    Name,
    /// The folder's full path, or any path below it when recursive.
    #[serde(alias = "byPath")]
    Path,
    /// A key type this version does not know. Rules carrying it never
    /// match.
    #[serde(other)]
    Unrecognized,
}

/// The `(key type, key field)` pair that identifies a rule for editing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleIdentity {
    pub key_type: KeyType,
    pub name: String,
}

impl RuleIdentity {
    pub fn new(key_type: KeyType, name: impl Into<String>) -> Self {
        Self {
            key_type,
            name: name.into(),
        }
    }
}

/// One configured folder-icon binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub key_type: KeyType,
    /// `;`-separated keys, e.g. `"Scripts;Scenes"`.
    pub name: String,
    /// Whether the rule also applies below the matched folder.
    pub recursive: bool,
    /// Render order: first is bottom.
    pub layers: Vec<Layer>,
}

impl Rule {
    /// Creates a non-recursive rule with no layers.
    pub fn new(key_type: KeyType, name: impl Into<String>) -> Self {
        Self {
            key_type,
            name: name.into(),
            recursive: false,
            layers: Vec::new(),
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(KeyType::Name, name)
    }

    pub fn by_path(path: impl Into<String>) -> Self {
        Self::new(KeyType::Path, path)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_layers(mut self, layers: impl IntoIterator<Item = Layer>) -> Self {
        self.layers.extend(layers);
        self
    }

    pub fn identity(&self) -> RuleIdentity {
        RuleIdentity::new(self.key_type, self.name.clone())
    }

    /// Returns true if this rule has `identity`.
    pub fn is(&self, identity: &RuleIdentity) -> bool {
        self.key_type == identity.key_type && self.name == identity.name
    }

    /// The rule's keys in order. Empty segments are skipped, so a rule
    /// with an empty key field has no keys and matches nothing.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.name.split(KEY_DELIMITER).filter(|key| !key.is_empty())
    }

    /// Returns true if at least one layer has an image reference.
    pub fn has_image_source(&self) -> bool {
        self.layers.iter().any(|layer| layer.source.is_set())
    }

    /// Tests whether this rule applies to `path`.
    ///
    /// Recursive matching is used only when both `allow_recursive` and the
    /// rule's own `recursive` flag are set. Comparisons are
    /// case-sensitive.
    ///
    /// | key type | exact                    | recursive                          |
    /// |----------|--------------------------|------------------------------------|
    /// | `Name`   | last path segment == key | path contains `"/" + key` segment  |
    /// | `Path`   | path == key              | path starts with key as a segment  |
    ///
    /// Recursive matches end on a segment boundary: `"/Scripts"` does not
    /// match inside `"/ScriptsDir"`, and key `Assets/Foo` does not cover
    /// `Assets/FooBar`.
    ///
    /// Fails with [`Error::InvalidConfiguration`] for an unrecognized key
    /// type.
    pub fn matches(&self, path: &str, allow_recursive: bool) -> Result<bool> {
        let recursive = allow_recursive && self.recursive;

        let matched = match self.key_type {
            KeyType::Name if recursive => self.keys().any(|key| contains_segment(path, key)),
            KeyType::Name => {
                let folder_name = file_name(path);
                self.keys().any(|key| key == folder_name)
            }
            KeyType::Path if recursive => self.keys().any(|key| starts_with_segment(path, key)),
            KeyType::Path => self.keys().any(|key| key == path),
            KeyType::Unrecognized => {
                return Err(Error::InvalidConfiguration(format!(
                    "rule {:?} has an unrecognized key type",
                    self.name
                )));
            }
        };

        Ok(matched)
    }
}

/// The final component of a `/`-separated path, ignoring a trailing `/`.
fn file_name(path: &str) -> &str {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// True if `path` contains `"/" + key` followed by `/` or the end.
fn contains_segment(path: &str, key: &str) -> bool {
    let needle = format!("/{key}");
    path.match_indices(&needle).any(|(at, _)| {
        let rest = &path[at + needle.len()..];
        rest.is_empty() || rest.starts_with('/')
    })
}

/// True if `path` is `key` or lies below it.
fn starts_with_segment(path: &str, key: &str) -> bool {
    match path.strip_prefix(key) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || key.ends_with('/'),
        None => false,
    }
}
