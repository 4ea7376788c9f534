//! Central registry of configured adapters.
//!
//! Constructed once at startup (spec.md's "no global mutable state beyond
//! the adapter registry" policy, carried here without the name): every
//! adapter is registered by its `source_type()` and declared prefixes, and
//! the registry hands out `Arc<dyn SourceAdapter>` handles that are shared
//! across all users.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::FeedItem;

use super::adapter::SourceAdapter;

/// Registry of all configured sources, keyed by source type.
pub struct SourceRegistry {
  adapters: HashMap<String, Arc<dyn SourceAdapter>>,
  /// source type -> declared prefixes (including the implicit identity one)
  prefix_index: HashMap<String, String>,
}

impl SourceRegistry {
  pub fn new() -> Self {
    Self {
      adapters: HashMap::new(),
      prefix_index: HashMap::new(),
    }
  }

  /// Register an adapter. Its `source_type()` always matches itself with
  /// the identity transform; any additional `prefixes()` are indexed too.
  pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
    let source_type = adapter.source_type().to_string();

    self
      .prefix_index
      .insert(source_type.clone(), source_type.clone());
    for prefix in adapter.prefixes() {
      self
        .prefix_index
        .insert(prefix.prefix.clone(), source_type.clone());
    }

    self.adapters.insert(source_type, adapter);
  }

  pub fn get(&self, source_type: &str) -> Option<Arc<dyn SourceAdapter>> {
    self.adapters.get(source_type).cloned()
  }

  pub fn source_types(&self) -> impl Iterator<Item = &str> {
    self.adapters.keys().map(|s| s.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn SourceAdapter>)> {
    self.adapters.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Look up the adapter that owns `prefix` (either a `source_type()` or
  /// one of its declared extra prefixes), along with any id transform to
  /// apply.
  pub fn adapter_for_prefix(&self, prefix: &str) -> Option<(Arc<dyn SourceAdapter>, &str)> {
    let source_type = self.prefix_index.get(prefix)?;
    let adapter = self.adapters.get(source_type)?;
    Some((adapter.clone(), source_type.as_str()))
  }

  /// Enforce the normalization contract on an item an adapter just handed
  /// back: `id` must be `source_type():localId`, `tier` must already be
  /// set (adapters assign this from config or their own default — the
  /// registry does not invent one).
  pub fn validate_item(&self, source_type: &str, item: &FeedItem) -> Result<()> {
    let expected_prefix = format!("{source_type}:");
    if !item.id.starts_with(&expected_prefix) {
      return Err(Error::Other(format!(
        "adapter {source_type} produced item with id {:?}, expected prefix {:?}",
        item.id, expected_prefix
      )));
    }
    if item.source != source_type {
      return Err(Error::Other(format!(
        "adapter {source_type} produced item with source {:?}",
        item.source
      )));
    }
    Ok(())
  }
}

impl Default for SourceRegistry {
  fn default() -> Self {
    Self::new()
  }
}
