//! `FeedPoolManager`: the fair per-user paging cache.
//!
//! Owns all [`FeedSession`] state exclusively; callers read and mutate a
//! session only through the methods here, never by reaching into the map
//! directly.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ScrollConfig;
use crate::model::{FeedItem, MetaValue};
use crate::signal::{EngineEvent, EventBus, EvictionReason};
use crate::source::{FetchQuery, SourceRegistry};

/// A source's continuation state plus whether it still has unpaged items.
#[derive(Default, Clone)]
struct SourcePagingState {
  page_token: Option<String>,
  has_more: bool,
  exhausted: bool,
  degraded: bool,
}

/// Per-user in-memory session. Lives for the duration of a scrolling
/// session; reset on explicit reset, `nocache=1`, or cursor absence.
pub struct FeedSession {
  seen_ids: HashSet<String>,
  batch_count: u32,
  pool_by_source: HashMap<String, Vec<FeedItem>>,
  source_paging: HashMap<String, SourcePagingState>,
  created_at: Instant,
  last_access: Instant,
}

impl FeedSession {
  fn new() -> Self {
    let now = Instant::now();
    Self {
      seen_ids: HashSet::new(),
      batch_count: 0,
      pool_by_source: HashMap::new(),
      source_paging: HashMap::new(),
      created_at: now,
      last_access: now,
    }
  }

  pub fn created_at(&self) -> Instant {
    self.created_at
  }
}

/// Per-source query config plus the per-user mutex that serializes all
/// mutations to that session.
struct UserState {
  session: FeedSession,
}

/// Default refill threshold multiplier: pool is topped up once it drops
/// below `REFILL_MULTIPLE * batchSize`.
const REFILL_MULTIPLE: usize = 4;

/// Fair per-user candidate pool across all enabled sources.
pub struct FeedPoolManager {
  registry: Arc<SourceRegistry>,
  users: Mutex<HashMap<String, Arc<Mutex<UserState>>>>,
  events: EventBus,
}

impl FeedPoolManager {
  pub fn new(registry: Arc<SourceRegistry>) -> Self {
    Self::with_events(registry, EventBus::new())
  }

  /// Same as [`Self::new`] but shares an embedder-owned [`EventBus`] instead
  /// of minting a private one nobody can subscribe to.
  pub fn with_events(registry: Arc<SourceRegistry>, events: EventBus) -> Self {
    Self {
      registry,
      users: Mutex::new(HashMap::new()),
      events,
    }
  }

  pub fn events(&self) -> &EventBus {
    &self.events
  }

  /// The adapter registry backing this pool, so callers (e.g. the filter
  /// resolver's source-type registration) can enumerate registered
  /// sources without the pool manager re-exposing its whole fetch path.
  pub fn registry(&self) -> &Arc<SourceRegistry> {
    &self.registry
  }

  async fn user_state(&self, user: &str) -> Arc<Mutex<UserState>> {
    let mut users = self.users.lock().await;
    users
      .entry(user.to_string())
      .or_insert_with(|| {
        Arc::new(Mutex::new(UserState {
          session: FeedSession::new(),
        }))
      })
      .clone()
  }

  /// Returns the current candidate pool, seen-filtered, refilling from
  /// sources first if below the refill threshold.
  pub async fn get_pool(&self, user: &str, scroll_config: &ScrollConfig) -> crate::error::Result<Vec<FeedItem>> {
    let state = self.user_state(user).await;
    let mut state = state.lock().await;
    state.session.last_access = Instant::now();

    let refill_threshold = REFILL_MULTIPLE * scroll_config.batch_size.max(1) as usize;
    let total_pooled: usize = state.session.pool_by_source.values().map(|v| v.len()).sum();

    if total_pooled < refill_threshold {
      self.refill(&mut state.session, scroll_config).await?;
    }

    let seen = &state.session.seen_ids;
    let pool: Vec<FeedItem> = state
      .session
      .pool_by_source
      .values()
      .flatten()
      .filter(|item| !seen.contains(&item.id))
      .cloned()
      .collect();

    Ok(pool)
  }

  /// Fan out one page request per enabled, non-exhausted source, in
  /// parallel. A high-volume source gets at most one page per refill tick.
  async fn refill(&self, session: &mut FeedSession, scroll_config: &ScrollConfig) -> crate::error::Result<()> {
    let enabled_sources: Vec<String> = self.registry.source_types().map(str::to_string).collect();

    let fetches = enabled_sources.into_iter().map(|source_type| {
      let registry = self.registry.clone();
      let paging = session.source_paging.get(&source_type).cloned().unwrap_or_default();
      let config = source_config_for(scroll_config, &source_type);
      let page_size = scroll_config.batch_size.max(1) as usize;

      async move {
        if paging.exhausted {
          return (source_type, None);
        }

        let Some(adapter) = registry.get(&source_type) else {
          return (source_type, None);
        };

        let query = FetchQuery {
          config,
          query_name: None,
          page: paging.page_token.clone(),
          page_size,
        };

        let result = tokio::time::timeout(Duration::from_secs(5), adapter.fetch(&query)).await;
        match result {
          Ok(Ok(page)) => (source_type, Some(Ok(page))),
          Ok(Err(e)) => (source_type, Some(Err(e))),
          Err(_) => (
            source_type,
            Some(Err(crate::error::Error::FetchUnavailable("timed out".to_string()))),
          ),
        }
      }
    });

    let results = join_all(fetches).await;

    for (source_type, outcome) in results {
      let paging = session.source_paging.entry(source_type.clone()).or_default();

      match outcome {
        Some(Ok(page)) => {
          paging.page_token = page.next_page.clone();
          paging.has_more = page.has_more;
          paging.exhausted = !page.has_more;
          paging.degraded = false;

          let bucket = session.pool_by_source.entry(source_type.clone()).or_default();
          let existing: HashSet<String> = bucket.iter().map(|i| i.id.clone()).collect();

          for mut item in page.items {
            if let Err(e) = self.registry.validate_item(&source_type, &item) {
              warn!(source = %source_type, error = %e, "dropping item that violated the normalization contract");
              continue;
            }
            if existing.contains(&item.id) {
              continue;
            }
            stamp_query_name(&mut item, &source_type);
            bucket.push(item);
          }
        }
        Some(Err(e)) => {
          warn!(source = %source_type, error = %e, "source fetch failed this refill tick, marking degraded");
          let was_degraded = paging.degraded;
          paging.degraded = true;
          if !was_degraded {
            self.events.emit(EngineEvent::SourceDegraded {
              source: source_type.clone(),
              reason: e.to_string(),
            });
          }
        }
        None => {}
      }
    }

    Ok(())
  }

  pub async fn mark_seen(&self, user: &str, ids: &[String]) {
    let state = self.user_state(user).await;
    let mut state = state.lock().await;
    for id in ids {
      state.session.seen_ids.insert(id.clone());
    }
  }

  /// Clears the session, emitting `SessionEvicted` with the given `reason`
  /// if there was a prior session to clear (a brand-new user's first call
  /// doesn't evict anything).
  pub async fn reset(&self, user: &str, reason: EvictionReason) {
    let mut users = self.users.lock().await;
    let had_session = users
      .insert(
        user.to_string(),
        Arc::new(Mutex::new(UserState {
          session: FeedSession::new(),
        })),
      )
      .is_some();

    if had_session {
      self.events.emit(EngineEvent::SessionEvicted {
        user: user.to_string(),
        reason,
      });
    }
  }

  /// `false` only once every source has reported `hasMore=false`.
  pub async fn has_more(&self, user: &str) -> bool {
    let state = self.user_state(user).await;
    let state = state.lock().await;
    if state.session.source_paging.is_empty() {
      return true;
    }
    state.session.source_paging.values().any(|p| !p.exhausted)
  }

  /// 1-indexed; the batch number the *next* tier-path call would be
  /// assembled under, without persisting anything. Pure peek — callers
  /// must call `advance_batch_number` themselves once they know the
  /// resulting batch was non-empty, per §3/§4.5's "increments on each
  /// non-filtered batch served" (an empty batch does not count).
  pub async fn peek_batch_number(&self, user: &str) -> u32 {
    let state = self.user_state(user).await;
    let state = state.lock().await;
    state.session.batch_count + 1
  }

  /// Persist that a tier-path batch was actually served, advancing the
  /// counter so the next call's `peek_batch_number` is one higher.
  pub async fn advance_batch_number(&self, user: &str) {
    let state = self.user_state(user).await;
    let mut state = state.lock().await;
    state.session.batch_count += 1;
  }

  pub async fn batch_number(&self, user: &str) -> u32 {
    let state = self.user_state(user).await;
    let state = state.lock().await;
    state.session.batch_count.max(1)
  }

  pub async fn mark_consumed(&self, user: &str, ids: &[String]) -> crate::error::Result<()> {
    let mut by_source: HashMap<String, Vec<String>> = HashMap::new();
    for id in ids {
      if let Some((source, local)) = id.split_once(':') {
        by_source.entry(source.to_string()).or_default().push(local.to_string());
      }
    }

    for (source_type, local_ids) in by_source {
      if let Some(adapter) = self.registry.get(&source_type) {
        adapter.mark_consumed(user, &local_ids).await?;
      }
    }
    Ok(())
  }

  /// Evict sessions idle longer than `older_than`. Not spawned internally
  /// — an embedder calls this periodically.
  pub async fn evict_idle(&self, older_than: Duration) {
    let mut users = self.users.lock().await;
    let mut to_remove = Vec::new();

    for (user, state) in users.iter() {
      let state = state.lock().await;
      if state.session.last_access.elapsed() > older_than {
        to_remove.push(user.clone());
      }
    }

    for user in &to_remove {
      debug!(user, "evicting idle session");
      users.remove(user);
      self.events.emit(EngineEvent::SessionEvicted {
        user: user.clone(),
        reason: EvictionReason::IdleTimeout,
      });
    }
  }
}

fn source_config_for(scroll_config: &ScrollConfig, source_type: &str) -> crate::model::MetaMap {
  let Some(value) = scroll_config.sources.get(source_type) else {
    return crate::model::MetaMap::new();
  };
  json_to_meta_map(value)
}

fn json_to_meta_map(value: &serde_json::Value) -> crate::model::MetaMap {
  let mut map = crate::model::MetaMap::new();
  if let serde_json::Value::Object(obj) = value {
    for (k, v) in obj {
      if let Some(meta_value) = json_to_meta_value(v) {
        map.insert(k.clone(), meta_value);
      }
    }
  }
  map
}

fn json_to_meta_value(value: &serde_json::Value) -> Option<MetaValue> {
  match value {
    serde_json::Value::String(s) => Some(MetaValue::String(s.clone())),
    serde_json::Value::Number(n) => {
      if let Some(i) = n.as_i64() {
        Some(MetaValue::Int(i))
      } else {
        n.as_f64().map(MetaValue::Float)
      }
    }
    serde_json::Value::Bool(b) => Some(MetaValue::Bool(*b)),
    serde_json::Value::Array(items) => {
      Some(MetaValue::List(items.iter().filter_map(json_to_meta_value).collect()))
    }
    _ => None,
  }
}

/// Items whose `meta.queryName` is absent get stamped with the source's
/// configured query name. Adapters that already populated this (e.g.
/// `scripture`, using its own `queryConfigs` entry) are left alone.
fn stamp_query_name(item: &mut FeedItem, source_type: &str) {
  if !item.meta.contains_key("queryName") {
    item.meta.insert("queryName".to_string(), MetaValue::String(source_type.to_string()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::adapters::EntropyAdapter;

  fn registry() -> Arc<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(EntropyAdapter::default()));
    Arc::new(registry)
  }

  #[tokio::test]
  async fn seen_items_are_filtered_out_of_the_pool() {
    let manager = FeedPoolManager::new(registry());
    let config = ScrollConfig::default_config();

    let pool = manager.get_pool("alice", &config).await.unwrap();
    assert!(!pool.is_empty());

    let first_id = pool[0].id.clone();
    manager.mark_seen("alice", &[first_id.clone()]).await;

    let pool_again = manager.get_pool("alice", &config).await.unwrap();
    assert!(!pool_again.iter().any(|i| i.id == first_id));
  }

  #[tokio::test]
  async fn reset_clears_seen_set() {
    let manager = FeedPoolManager::new(registry());
    let config = ScrollConfig::default_config();

    let pool = manager.get_pool("alice", &config).await.unwrap();
    let first_id = pool[0].id.clone();
    manager.mark_seen("alice", &[first_id.clone()]).await;

    manager.reset("alice", EvictionReason::ExplicitReset).await;
    let pool_again = manager.get_pool("alice", &config).await.unwrap();
    assert!(pool_again.iter().any(|i| i.id == first_id));
  }

  #[tokio::test]
  async fn batch_number_starts_at_one_and_advances_when_told() {
    let manager = FeedPoolManager::new(registry());
    assert_eq!(manager.peek_batch_number("alice").await, 1);
    assert_eq!(manager.peek_batch_number("alice").await, 1);

    manager.advance_batch_number("alice").await;
    assert_eq!(manager.peek_batch_number("alice").await, 2);
  }

  #[tokio::test]
  async fn batch_number_does_not_advance_without_an_explicit_call() {
    let manager = FeedPoolManager::new(registry());
    assert_eq!(manager.peek_batch_number("alice").await, 1);
    // simulates an empty assembled batch: peek again without advancing
    assert_eq!(manager.peek_batch_number("alice").await, 1);
  }
}
