//! A request-driven feed assembler with background pre-fetching.
//!
//! The public surface is small: construct an [`Engine`] from a
//! [`config::ConfigSource`], a populated [`source::SourceRegistry`], and a
//! [`bridge::SocialProtocol`], then call [`Engine::get_next_batch`] and
//! [`Engine::get_detail`]. Everything else — pool refilling, wire decay,
//! filter resolution, bridge anchoring — is orchestrated internally.

pub mod assembly;
pub mod bridge;
pub mod config;
pub mod detail;
pub mod error;
pub mod log;
pub mod model;
pub mod pool;
pub mod resolver;
pub mod signal;
pub mod source;
pub mod tier;

pub use error::{Error, Result};

use std::sync::Arc;
use std::time::Duration;

use assembly::{FeedAssemblyService, FeedBatch, GetNextBatchOpts};
use bridge::{ContentBridgeService, SocialProtocol};
use config::{ConfigSource, ScrollConfigLoader};
use detail::DetailAssembler;
use model::{DetailSection, MetaMap};
use pool::FeedPoolManager;
use resolver::{ContentIdResolver, FallbackPattern};
use signal::EventBus;
use source::SourceRegistry;

/// How long a `FeedSession` may sit idle before it's evicted. An embedder
/// running `Engine::spawn_eviction_task` uses this as the sweep threshold.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Top-level handle bundling the assembler, detail dispatcher, bridge
/// service and event bus behind one entry point.
pub struct Engine<S: ConfigSource, P: SocialProtocol> {
  registry: Arc<SourceRegistry>,
  assembly: FeedAssemblyService<S>,
  content_ids: ContentIdResolver,
  bridge: ContentBridgeService<P>,
  events: EventBus,
  pool: Arc<FeedPoolManager>,
}

impl<S: ConfigSource, P: SocialProtocol> Engine<S, P> {
  pub fn new(config_source: S, registry: SourceRegistry, social_protocol: P) -> Self {
    let registry = Arc::new(registry);
    let events = EventBus::new();
    let pool = Arc::new(FeedPoolManager::with_events(registry.clone(), events.clone()));
    let config_loader = ScrollConfigLoader::new(config_source);

    Self {
      registry,
      assembly: FeedAssemblyService::new(config_loader, pool.clone()),
      content_ids: ContentIdResolver::new(default_fallback_patterns(), None),
      bridge: ContentBridgeService::with_events(social_protocol, events.clone()),
      events,
      pool,
    }
  }

  /// Override the default (empty) bare-id fallback patterns and default
  /// source, e.g. to route unprefixed numeric ids to a particular adapter.
  pub fn with_content_id_resolver(mut self, resolver: ContentIdResolver) -> Self {
    self.content_ids = resolver;
    self
  }

  pub fn events(&self) -> &EventBus {
    &self.events
  }

  /// `GetNextBatch(user, opts)`.
  pub async fn get_next_batch(&self, user: &str, opts: GetNextBatchOpts) -> Result<FeedBatch> {
    self.assembly.get_next_batch(user, opts).await
  }

  /// `GetDetail(itemId, meta)`.
  pub async fn get_detail(&self, item_id: &str, meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let assembler = DetailAssembler::new(&self.registry, &self.content_ids, Some(&self.bridge));
    assembler.get_detail(item_id, meta).await
  }

  pub fn bridge(&self) -> &ContentBridgeService<P> {
    &self.bridge
  }

  /// Periodically evict sessions idle longer than `idle_timeout`, ~once
  /// every `idle_timeout / 4`. Spawn this once at startup if the embedder
  /// wants automatic idle eviction rather than calling
  /// `pool().evict_idle` itself.
  pub fn spawn_eviction_task(&self, idle_timeout: Duration) -> tokio::task::JoinHandle<()> {
    let pool = self.pool.clone();
    let sweep_interval = (idle_timeout / 4).max(Duration::from_secs(1));

    tokio::spawn(async move {
      let mut interval = tokio::time::interval(sweep_interval);
      loop {
        interval.tick().await;
        pool.evict_idle(idle_timeout).await;
      }
    })
  }
}

fn default_fallback_patterns() -> Vec<FallbackPattern> {
  Vec::new()
}
