//! The `SourceAdapter` contract.
//!
//! This is the one extension point in the engine: every origin — a
//! subreddit list, a federated timeline, a local photo directory, a
//! built-in grounding prompt generator — is a `SourceAdapter`. The registry
//! in [`super::registry`] treats them uniformly; nothing downstream knows
//! or cares which kind it's talking to.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{DetailSection, FeedItem};

use super::types::{FetchPage, FetchQuery, IdPrefix};

/// A source origin.
///
/// Implementors must be stateless across calls, or internally synchronized
/// for whatever per-user state they keep — instances are shared across all
/// users of the engine.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
  /// Stable short identifier, e.g. `"reddit"`. Also the `id` prefix before
  /// the first `:` on every item this adapter produces.
  fn source_type(&self) -> &'static str;

  /// Prefixes this adapter answers to when resolving a compound id, beyond
  /// its own `source_type()` (which always matches with the identity
  /// transform). Most adapters return an empty list.
  fn prefixes(&self) -> Vec<IdPrefix> {
    Vec::new()
  }

  /// Fetch one page of candidate items.
  ///
  /// `query` carries the merged per-source config (subreddit list, channel
  /// ids, feed ids, ...) plus a page-size hint. Implementations may return
  /// fewer items than requested, or none — that is not an error.
  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage>;

  /// Resolve one item by its local id, in list-view shape.
  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>>;

  /// Resolve one item's detail sections.
  ///
  /// `meta` is the item's `meta` map as last seen by the caller (a
  /// convenience so adapters that can synthesize detail purely from
  /// already-known fields don't need a second round-trip upstream).
  ///
  /// Adapters with no real detail view return a single `Body`/`Metadata`
  /// section synthesized from `get_item`; this default implementation does
  /// exactly that.
  async fn get_detail(
    &self,
    local_id: &str,
    meta: &crate::model::MetaMap,
  ) -> Result<Vec<DetailSection>> {
    let _ = meta;
    match self.get_item(local_id).await? {
      Some(item) => Ok(vec![DetailSection::Body {
        text: item.body.unwrap_or(item.title),
      }]),
      None => Err(crate::error::Error::NotFound(format!(
        "{}:{}",
        self.source_type(),
        local_id
      ))),
    }
  }

  /// For sources that model read/consumed state externally (e.g. an RSS
  /// reader's read-marker API). Default is a no-op — most sources are
  /// purely functional over config + query and have nothing to mark.
  async fn mark_consumed(&self, _user: &str, _local_ids: &[String]) -> Result<()> {
    Ok(())
  }
}
