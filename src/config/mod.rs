//! `ScrollConfigLoader`: merges per-user configuration with defaults.
//!
//! The on-disk/YAML store this ultimately reads from is out of scope —
//! represented here only by the [`ConfigSource`] trait boundary.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Tier;

pub const DEFAULT_BATCH_SIZE: u32 = 10;
pub const DEFAULT_WIRE_DECAY_BATCHES: u32 = 10;

/// Per-tier allocation, enabled sources, and display hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
  pub allocation: u32,
  pub enabled_sources: Vec<String>,
  pub color: String,
}

/// A parameterized adapter invocation saved under a stable name
/// (`"scripture-bom"`), addressable via filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
  pub source_type: String,
  #[serde(default)]
  pub params: HashMap<String, serde_json::Value>,
}

/// Merged, immutable scroll configuration for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
  pub batch_size: u32,
  pub wire_decay_batches: u32,
  pub tiers: HashMap<Tier, TierConfig>,
  pub sources: HashMap<String, serde_json::Value>,
  pub aliases: HashMap<String, String>,
  pub query_configs: HashMap<String, QueryConfig>,
  /// Unknown fields from the backing store, preserved and passed through
  /// rather than dropped.
  #[serde(default, flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScrollConfig {
  pub fn default_config() -> Self {
    let mut tiers = HashMap::new();
    tiers.insert(
      Tier::Wire,
      TierConfig {
        allocation: 4,
        enabled_sources: Vec::new(),
        color: "#d94f4f".to_string(),
      },
    );
    tiers.insert(
      Tier::Library,
      TierConfig {
        allocation: 3,
        enabled_sources: Vec::new(),
        color: "#4f7fd9".to_string(),
      },
    );
    tiers.insert(
      Tier::Scrapbook,
      TierConfig {
        allocation: 2,
        enabled_sources: Vec::new(),
        color: "#d9b64f".to_string(),
      },
    );
    tiers.insert(
      Tier::Compass,
      TierConfig {
        allocation: 1,
        enabled_sources: Vec::new(),
        color: "#4fd98c".to_string(),
      },
    );

    Self {
      batch_size: DEFAULT_BATCH_SIZE,
      wire_decay_batches: DEFAULT_WIRE_DECAY_BATCHES,
      tiers,
      sources: HashMap::new(),
      aliases: HashMap::new(),
      query_configs: HashMap::new(),
      extra: serde_json::Map::new(),
    }
  }

  /// Validate: integer allocations ≥ 0 (implicit in `u32`), decay horizon
  /// ≥ 1, tier names restricted to the four canonical values (implicit in
  /// `Tier`'s closed enum).
  pub fn validate(&self) -> Result<()> {
    if self.wire_decay_batches == 0 {
      return Err(Error::ConfigError("wireDecayBatches must be >= 1".to_string()));
    }
    Ok(())
  }

  /// Palette object for the client: one color per tier.
  pub fn extract_colors(&self) -> HashMap<Tier, String> {
    self
      .tiers
      .iter()
      .map(|(tier, config)| (*tier, config.color.clone()))
      .collect()
  }
}

/// Raw, unmerged configuration as stored externally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawScrollConfig {
  pub batch_size: Option<u32>,
  pub wire_decay_batches: Option<u32>,
  #[serde(default)]
  pub tiers: HashMap<Tier, TierConfig>,
  #[serde(default)]
  pub sources: HashMap<String, serde_json::Value>,
  #[serde(default)]
  pub aliases: HashMap<String, String>,
  #[serde(default)]
  pub query_configs: HashMap<String, QueryConfig>,
  #[serde(default, flatten)]
  pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The external collaborator boundary: wherever a user's scroll config
/// actually lives (YAML file, database row, ...), this is the only shape
/// the core engine needs from it.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync {
  /// Load the raw, unmerged config for a user, plus a monotonic generation
  /// counter — when the counter advances, the loader knows to re-merge
  /// rather than serve its cached result.
  async fn load_raw(&self, user: &str) -> Result<(RawScrollConfig, u64)>;
}

/// A config source that always returns the same static configuration,
/// regardless of user — useful for single-tenant deployments and tests.
pub struct StaticConfigSource {
  raw: RawScrollConfig,
  generation: u64,
}

impl StaticConfigSource {
  pub fn new(raw: RawScrollConfig) -> Self {
    Self { raw, generation: 0 }
  }
}

#[async_trait::async_trait]
impl ConfigSource for StaticConfigSource {
  async fn load_raw(&self, _user: &str) -> Result<(RawScrollConfig, u64)> {
    Ok((self.raw.clone(), self.generation))
  }
}

/// An in-memory per-user config store, primarily a test double: bump
/// `generation` after mutating a user's entry to force a re-merge on next
/// `Load`.
#[derive(Default)]
pub struct MapConfigSource {
  entries: Mutex<HashMap<String, (RawScrollConfig, u64)>>,
}

impl MapConfigSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&self, user: &str, raw: RawScrollConfig) {
    let mut entries = self.entries.lock().unwrap();
    let generation = entries.get(user).map(|(_, g)| g + 1).unwrap_or(0);
    entries.insert(user.to_string(), (raw, generation));
  }
}

#[async_trait::async_trait]
impl ConfigSource for MapConfigSource {
  async fn load_raw(&self, user: &str) -> Result<(RawScrollConfig, u64)> {
    let entries = self.entries.lock().unwrap();
    Ok(entries.get(user).cloned().unwrap_or_default())
  }
}

struct CacheEntry {
  config: ScrollConfig,
  generation: u64,
  #[allow(dead_code)]
  loaded_at: Instant,
}

/// Loads per-user scroll configuration, merging with hard-coded defaults
/// and re-merging only when the backing source reports a new generation
/// (pull-on-read with a cheap check, standing in for an mtime/hash
/// comparison since there's no real file to stat in-process).
pub struct ScrollConfigLoader<S: ConfigSource> {
  source: S,
  cache: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: ConfigSource> ScrollConfigLoader<S> {
  pub fn new(source: S) -> Self {
    Self {
      source,
      cache: Mutex::new(HashMap::new()),
    }
  }

  pub async fn load(&self, user: &str) -> Result<ScrollConfig> {
    let (raw, generation) = self.source.load_raw(user).await?;

    if let Some(cached) = self.cache.lock().unwrap().get(user) {
      if cached.generation == generation {
        return Ok(cached.config.clone());
      }
    }

    let merged = merge_with_defaults(raw);
    merged.validate()?;

    self.cache.lock().unwrap().insert(
      user.to_string(),
      CacheEntry {
        config: merged.clone(),
        generation,
        loaded_at: Instant::now(),
      },
    );

    Ok(merged)
  }
}

fn merge_with_defaults(raw: RawScrollConfig) -> ScrollConfig {
  let mut config = ScrollConfig::default_config();

  if let Some(batch_size) = raw.batch_size {
    config.batch_size = batch_size;
  }
  if let Some(wire_decay_batches) = raw.wire_decay_batches {
    config.wire_decay_batches = wire_decay_batches;
  }
  for (tier, tier_config) in raw.tiers {
    config.tiers.insert(tier, tier_config);
  }
  config.sources = raw.sources;
  config.aliases = raw.aliases;
  config.query_configs = raw.query_configs;
  config.extra = raw.extra;

  config
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn defaults_apply_when_raw_is_empty() {
    let loader = ScrollConfigLoader::new(StaticConfigSource::new(RawScrollConfig::default()));
    let config = loader.load("alice").await.unwrap();
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.tiers[&Tier::Wire].allocation, 4);
  }

  #[tokio::test]
  async fn rejects_zero_decay_horizon() {
    let raw = RawScrollConfig {
      wire_decay_batches: Some(0),
      ..Default::default()
    };
    let loader = ScrollConfigLoader::new(StaticConfigSource::new(raw));
    assert!(loader.load("alice").await.is_err());
  }

  #[tokio::test]
  async fn reloads_only_on_generation_bump() {
    let source = MapConfigSource::new();
    source.set("alice", RawScrollConfig { batch_size: Some(5), ..Default::default() });
    let loader = ScrollConfigLoader::new(source);

    let first = loader.load("alice").await.unwrap();
    assert_eq!(first.batch_size, 5);

    // no generation bump — cached value returned even though nothing
    // bumped the live source
    let second = loader.load("alice").await.unwrap();
    assert_eq!(second.batch_size, 5);
  }
}
