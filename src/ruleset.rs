//! Ordered rule lists: path resolution and editing.
//!
//! # Precedence
//!
//! [`RuleSet::resolve`] scans from the **last** rule to the first and
//! returns the first match. A rule appended later therefore overrides an
//! earlier one for every path both cover, no matter which is more
//! specific. Rules are never merged or ranked.
//!
//! It is not known whether this last-wins order was meant as an override
//! mechanism or is an accident of the scan direction. It is kept as-is;
//! do not switch to "most specific wins" or "first match wins" without a
//! migration of existing rule sets.
//!
//! Lookups by identity ([`RuleSet::find_exact`]) scan forward instead and
//! return the **first** rule with the identity. Edits go through that
//! lookup, resolution never does.

use log::{trace, warn};

use crate::layer::Layer;
use crate::rule::{Rule, RuleIdentity};

/// An ordered collection of rules plus an optional default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    /// Draw [`default_layers`](Self::default_layers) for folders no rule
    /// matches.
    pub use_default: bool,
    pub default_layers: Vec<Layer>,
    /// Insertion order is precedence order, last wins.
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, layers: Vec<Layer>) -> Self {
        self.use_default = true;
        self.default_layers = layers;
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Finds the rule that applies to `path`.
    ///
    /// Rules with an unrecognized key type are logged and skipped.
    pub fn resolve(&self, path: &str, allow_recursive: bool) -> Option<&Rule> {
        let found = self.rules.iter().rev().find(|rule| {
            rule.matches(path, allow_recursive).unwrap_or_else(|err| {
                warn!("skipping rule while resolving {path:?}: {err}");
                false
            })
        });

        if let Some(rule) = found {
            trace!("{path:?} resolved to {:?} rule {:?}", rule.key_type, rule.name);
        }
        found
    }

    /// The layers to draw for `path`: the resolved rule's layers, else the
    /// default layers when enabled.
    pub fn resolve_layers(&self, path: &str, allow_recursive: bool) -> Option<&[Layer]> {
        match self.resolve(path, allow_recursive) {
            Some(rule) => Some(&rule.layers),
            None if self.use_default => Some(&self.default_layers),
            None => None,
        }
    }

    /// Returns the first rule with `identity`.
    pub fn find_exact(&self, identity: &RuleIdentity) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.is(identity))
    }

    fn find_exact_mut(&mut self, identity: &RuleIdentity) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|rule| rule.is(identity))
    }

    /// Upserts the rule identified by `identity` with `value`.
    ///
    /// - found, `value` has an image source: the rule is overwritten
    /// - found, no image source: every rule with `identity` is removed
    /// - not found, image source: `value` is appended
    /// - not found, no image source: nothing happens
    pub fn update(&mut self, identity: &RuleIdentity, value: Rule) {
        let has_source = value.has_image_source();

        match self.find_exact_mut(identity) {
            Some(existing) if has_source => *existing = value,
            Some(_) => self.remove_all(identity),
            None if has_source => self.add(value),
            None => {}
        }
    }

    /// Appends a rule, giving it precedence over every existing rule.
    pub fn add(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Removes every rule with `identity`.
    pub fn remove_all(&mut self, identity: &RuleIdentity) {
        self.rules.retain(|rule| !rule.is(identity));
    }

    /// Removes every rule sharing the identity of the rule that applies to
    /// `path` without recursion.
    pub fn remove_all_by_path(&mut self, path: &str) {
        if let Some(identity) = self.resolve(path, false).map(Rule::identity) {
            self.remove_all(&identity);
        }
    }
}
