//! `FeedAssemblyService`: the orchestrator behind the single public entry
//! point, `GetNextBatch`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::config::{ConfigSource, ScrollConfigLoader};
use crate::error::Result;
use crate::model::{FeedItem, MetaValue, Tier};
use crate::pool::FeedPoolManager;
use crate::resolver::{FeedFilterResolver, ResolvedFilter};
use crate::signal::{EngineEvent, EvictionReason};
use crate::tier::TierAssemblyService;

/// Hard ceiling on `effectiveLimit`, independent of what a caller or a
/// user's `scrollConfig.batchSize` requests.
pub const MAX_BATCH: u32 = 100;

/// `GetNextBatch` request options. `cursor` absent or `"start"` resets the
/// session.
#[derive(Debug, Clone, Default)]
pub struct GetNextBatchOpts {
  pub cursor: Option<String>,
  pub limit: Option<u32>,
  /// Restrict pool refills to this subset of source types, when present.
  pub sources: Option<Vec<String>>,
  /// Opaque adapter hint carried through to `FetchQuery` on the filtered
  /// path's higher-page-size fetch; unused on the tier path.
  pub focus: Option<String>,
  pub nocache: bool,
  pub filter: Option<String>,
}

/// `GetNextBatch`'s response shape.
#[derive(Debug, Clone)]
pub struct FeedBatch {
  pub items: Vec<FeedItem>,
  pub has_more: bool,
  pub colors: HashMap<Tier, String>,
  pub cursor: String,
}

const START_SENTINEL: &str = "start";

/// §4.3's built-in pseudo-sources, filterable by `sourceType` even on an
/// engine where they happen not to be registered as real adapters.
const BUILTIN_PSEUDO_SOURCES: [&str; 3] = ["freshrss", "headlines", "entropy"];

/// Orchestrates a single `GetNextBatch` call: resolve filter → get pool →
/// assemble → stamp cursor.
pub struct FeedAssemblyService<S: ConfigSource> {
  config_loader: ScrollConfigLoader<S>,
  pool: Arc<FeedPoolManager>,
}

impl<S: ConfigSource> FeedAssemblyService<S> {
  pub fn new(config_loader: ScrollConfigLoader<S>, pool: Arc<FeedPoolManager>) -> Self {
    Self { config_loader, pool }
  }

  pub async fn get_next_batch(&self, user: &str, opts: GetNextBatchOpts) -> Result<FeedBatch> {
    let config = self.config_loader.load(user).await?;
    let effective_limit = opts.limit.unwrap_or(config.batch_size).min(MAX_BATCH);

    let has_cursor = opts.cursor.as_deref().is_some_and(|c| c != START_SENTINEL && !c.is_empty());
    if opts.nocache {
      self.pool.reset(user, EvictionReason::NoCache).await;
    } else if !has_cursor {
      self.pool.reset(user, EvictionReason::ExplicitReset).await;
    }

    let query_names: std::collections::HashSet<String> = config.query_configs.keys().cloned().collect();
    // §4.3: the resolver's registered source types are the adapters plus
    // the built-in pseudo-sources, never a tier's enabledSources — those
    // are a *selection* policy for tier assembly, not the set of sources a
    // `filter=<sourceType>` request is allowed to address. A registered
    // adapter absent from every tier's enabledSources still lands items
    // in the pool (the pool refills from every registered source) and
    // must remain independently filterable.
    let source_types: std::collections::HashSet<String> = self
      .pool
      .registry()
      .source_types()
      .map(str::to_string)
      .chain(BUILTIN_PSEUDO_SOURCES.iter().map(|s| s.to_string()))
      .collect();

    if let Some(filter_expr) = opts.filter.as_deref() {
      let resolver = FeedFilterResolver::new(source_types, query_names, config.aliases.clone());
      if let Some(resolved) = resolver.resolve(filter_expr) {
        return self.filtered_path(user, &config, resolved, effective_limit).await;
      }
      warn!(user, filter = filter_expr, "filter expression did not resolve, falling back to tier path");
    }

    self.tier_path(user, &config, effective_limit).await
  }

  async fn filtered_path(
    &self,
    user: &str,
    config: &crate::config::ScrollConfig,
    resolved: ResolvedFilter,
    effective_limit: u32,
  ) -> Result<FeedBatch> {
    let pool = self.pool.get_pool(user, config).await?;

    let mut matched: Vec<FeedItem> = pool
      .into_iter()
      .filter(|item| matches_filter(item, &resolved))
      .collect();

    matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matched.truncate(effective_limit as usize);

    let ids: Vec<String> = matched.iter().map(|i| i.id.clone()).collect();
    self.pool.mark_seen(user, &ids).await;

    let cursor = self.stamp_cursor(user).await;
    Ok(FeedBatch {
      items: matched,
      has_more: self.pool.has_more(user).await,
      colors: config.extract_colors(),
      cursor,
    })
  }

  async fn tier_path(&self, user: &str, config: &crate::config::ScrollConfig, effective_limit: u32) -> Result<FeedBatch> {
    let pool = self.pool.get_pool(user, config).await?;
    // Peek, don't persist yet — §3/§4.5 only count this batch toward the
    // session's batchCount if it actually returns items.
    let batch_number = self.pool.peek_batch_number(user).await;

    let mut allocation = TierAssemblyService::compute_allocation(config, batch_number);
    cap_allocation(&mut allocation, effective_limit);

    let items = TierAssemblyService::assemble_batch(&pool, &allocation, config);

    let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    self.pool.mark_seen(user, &ids).await;
    self.pool.mark_consumed(user, &ids).await?;

    if !items.is_empty() {
      self.pool.advance_batch_number(user).await;
      self.pool.events().emit(EngineEvent::BatchAssembled {
        user: user.to_string(),
        batch_number,
        item_count: items.len(),
      });
    }

    Ok(FeedBatch {
      items,
      has_more: self.pool.has_more(user).await,
      colors: config.extract_colors(),
      cursor: user.to_string(),
    })
  }

  async fn stamp_cursor(&self, user: &str) -> String {
    format!("{user}:{}", self.pool.batch_number(user).await)
  }
}

/// Scale every tier's slot count down proportionally (floor) so the sum
/// never exceeds `effective_limit`, per §4.6's `min(sum(alloc),
/// effectiveLimit)` output length rule. Conservative: only shrinks, never
/// grows, allocation.
fn cap_allocation(allocation: &mut crate::tier::TierAllocation, effective_limit: u32) {
  let total: u32 = Tier::ALL.iter().map(|t| allocation.slots_for(*t)).sum();
  if total <= effective_limit || total == 0 {
    return;
  }

  let mut remaining = effective_limit;
  for tier in Tier::ALL {
    let share = (allocation.slots_for(tier) as u64 * effective_limit as u64 / total as u64) as u32;
    let share = share.min(remaining);
    allocation.slots.insert(tier, share);
    remaining -= share;
  }
}

fn matches_filter(item: &FeedItem, resolved: &ResolvedFilter) -> bool {
  match resolved {
    ResolvedFilter::Tier(tier) => item.tier == *tier,
    ResolvedFilter::Source { source_type, subsources } => {
      if item.source != *source_type {
        return false;
      }
      match subsources {
        None => true,
        Some(wanted) => {
          let name = item
            .meta
            .get("subreddit")
            .or_else(|| item.meta.get("sourceName"))
            .and_then(MetaValue::as_str)
            .unwrap_or_default()
            .to_lowercase();
          wanted.iter().any(|w| w.to_lowercase() == name)
        }
      }
    }
    ResolvedFilter::Query(name) => item
      .meta
      .get("queryName")
      .and_then(MetaValue::as_str)
      .map(|q| q == name)
      .unwrap_or(false),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{RawScrollConfig, StaticConfigSource};
  use crate::source::adapters::EntropyAdapter;
  use crate::source::SourceRegistry;
  use std::sync::Arc;

  fn service() -> FeedAssemblyService<StaticConfigSource> {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(EntropyAdapter::default()));
    let loader = ScrollConfigLoader::new(StaticConfigSource::new(RawScrollConfig::default()));
    let pool = Arc::new(FeedPoolManager::new(Arc::new(registry)));
    FeedAssemblyService::new(loader, pool)
  }

  #[tokio::test]
  async fn cold_start_returns_a_nonempty_batch() {
    let service = service();
    let batch = service.get_next_batch("alice", GetNextBatchOpts::default()).await.unwrap();
    assert!(!batch.items.is_empty());
  }

  #[tokio::test]
  async fn repeated_calls_never_repeat_an_id_within_a_session() {
    let service = service();
    let mut cursor = None;
    let mut seen = std::collections::HashSet::new();

    for _ in 0..3 {
      let opts = GetNextBatchOpts {
        cursor: cursor.clone(),
        ..Default::default()
      };
      let batch = service.get_next_batch("alice", opts).await.unwrap();
      for item in &batch.items {
        assert!(seen.insert(item.id.clone()), "duplicate id {} across batches", item.id);
      }
      cursor = Some(batch.cursor);
    }
  }

  #[tokio::test]
  async fn filter_by_tier_returns_only_matching_tier() {
    let service = service();
    let opts = GetNextBatchOpts {
      filter: Some("compass".to_string()),
      ..Default::default()
    };
    let batch = service.get_next_batch("alice", opts).await.unwrap();
    assert!(batch.items.iter().all(|i| i.tier == Tier::Compass));
  }
}
