//! Supporting types for the `SourceAdapter` contract.

use crate::model::{FeedItem, MetaMap};

/// A declared prefix an adapter answers to, beyond its own `source_type()`.
///
/// `id_transform` rewrites the local id before it's handed to the owning
/// adapter — e.g. the `scripture` adapter might declare the prefix `hymn`
/// with a transform that rewrites `"amazing-grace"` into
/// `"song/hymn/amazing-grace"` before calling `get_item`.
pub struct IdPrefix {
  pub prefix: String,
  pub id_transform: Option<Box<dyn Fn(&str) -> String + Send + Sync>>,
}

impl IdPrefix {
  pub fn new(prefix: impl Into<String>) -> Self {
    Self {
      prefix: prefix.into(),
      id_transform: None,
    }
  }

  pub fn with_transform(
    prefix: impl Into<String>,
    transform: impl Fn(&str) -> String + Send + Sync + 'static,
  ) -> Self {
    Self {
      prefix: prefix.into(),
      id_transform: Some(Box::new(transform)),
    }
  }

  pub fn apply(&self, local_id: &str) -> String {
    match &self.id_transform {
      Some(f) => f(local_id),
      None => local_id.to_string(),
    }
  }
}

/// Opaque continuation state for an adapter's own paging, round-tripped by
/// the pool manager without being interpreted.
pub type PageToken = Option<String>;

/// The merged configuration + paging request passed to `fetch`.
#[derive(Debug, Clone)]
pub struct FetchQuery {
  /// Adapter-specific configuration, already merged with defaults by the
  /// `ScrollConfigLoader` (subreddit list, channel ids, feed urls, ...).
  pub config: MetaMap,
  /// Named-query name this fetch is being made on behalf of, if any
  /// (stamped onto produced items' `meta.queryName` by the registry when
  /// the adapter itself doesn't set it).
  pub query_name: Option<String>,
  /// Continuation token from a previous `fetch` call against this source
  /// for this user, or `None` on the first call of a session.
  pub page: PageToken,
  /// How many items the caller would like; a hint, not a guarantee.
  pub page_size: usize,
}

impl FetchQuery {
  pub fn first_page(config: MetaMap, page_size: usize) -> Self {
    Self {
      config,
      query_name: None,
      page: None,
      page_size,
    }
  }
}

/// Output of one `fetch` call.
#[derive(Debug, Clone, Default)]
pub struct FetchPage {
  pub items: Vec<FeedItem>,
  pub has_more: bool,
  pub next_page: PageToken,
}
