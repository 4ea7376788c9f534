//! Shared fixtures for integration tests: a configurable in-memory adapter
//! standing in for a real wire source.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use boonscroll::error::Result;
use boonscroll::model::{FeedItem, MetaMap, Tier};
use boonscroll::source::{FetchPage, FetchQuery, SourceAdapter};

/// Produces a fixed, pre-baked set of items (one page, no continuation) for
/// a given `source_type`/`tier`. Priorities and timestamps are supplied by
/// the caller so tests can assert on selection order precisely.
pub struct FixtureAdapter {
  source_type: &'static str,
  items: Vec<FeedItem>,
  call_count: AtomicUsize,
}

impl FixtureAdapter {
  pub fn new(source_type: &'static str, tier: Tier, count: usize) -> Self {
    let items = (0..count)
      .map(|i| FeedItem {
        id: format!("{source_type}:{i}"),
        source: source_type.to_string(),
        tier,
        title: format!("{source_type} item {i}"),
        body: Some("body text".to_string()),
        image: None,
        link: Some(format!("https://example.com/{source_type}/{i}")),
        timestamp: chrono::Utc::now() - chrono::Duration::seconds(i as i64),
        priority: (count - i) as i64,
        meta: MetaMap::new(),
        interaction: None,
        sections: None,
      })
      .collect();

    Self {
      source_type,
      items,
      call_count: AtomicUsize::new(0),
    }
  }

  pub fn with_meta(mut self, key: &str, f: impl Fn(usize) -> Option<boonscroll::model::MetaValue>) -> Self {
    for (i, item) in self.items.iter_mut().enumerate() {
      if let Some(v) = f(i) {
        item.meta.insert(key.to_string(), v);
      }
    }
    self
  }

  pub fn call_count(&self) -> usize {
    self.call_count.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
  fn source_type(&self) -> &'static str {
    self.source_type
  }

  async fn fetch(&self, _query: &FetchQuery) -> Result<FetchPage> {
    let already_called = self.call_count.fetch_add(1, Ordering::SeqCst) > 0;
    if already_called {
      return Ok(FetchPage {
        items: Vec::new(),
        has_more: false,
        next_page: None,
      });
    }

    Ok(FetchPage {
      items: self.items.clone(),
      has_more: false,
      next_page: None,
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let idx: usize = match local_id.parse() {
      Ok(i) => i,
      Err(_) => return Ok(None),
    };
    Ok(self.items.get(idx).cloned())
  }
}
