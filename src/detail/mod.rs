//! `DetailAssembler`: dispatches a detail request to its owning adapter and
//! optionally enriches the result with bridge stats.

use crate::bridge::{BridgeStats, ContentBridgeService, SocialProtocol};
use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MetaMap, MetaValue};
use crate::resolver::ContentIdResolver;
use crate::source::SourceRegistry;

/// Resolves a compound item id to its owning adapter's detail sections,
/// attaching bridge-derived meta (`bridge.exists`, `bridge.commentCount`,
/// `bridge.lastActivityTs`) for items the bridge has (or could have)
/// an anchor for.
pub struct DetailAssembler<'a, P: SocialProtocol> {
  registry: &'a SourceRegistry,
  content_ids: &'a ContentIdResolver,
  bridge: Option<&'a ContentBridgeService<P>>,
}

impl<'a, P: SocialProtocol> DetailAssembler<'a, P> {
  pub fn new(registry: &'a SourceRegistry, content_ids: &'a ContentIdResolver, bridge: Option<&'a ContentBridgeService<P>>) -> Self {
    Self {
      registry,
      content_ids,
      bridge,
    }
  }

  /// `GetDetail(itemId, meta)`: resolve → dispatch → (optionally) enrich.
  pub async fn get_detail(&self, item_id: &str, meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let resolved = self
      .content_ids
      .resolve(self.registry, item_id)
      .ok_or_else(|| Error::InvalidId(item_id.to_string()))?;

    let adapter = self
      .registry
      .get(&resolved.source_type)
      .ok_or_else(|| Error::InvalidId(item_id.to_string()))?;

    let mut sections = adapter.get_detail(&resolved.local_id, meta).await?;

    if let Some(bridge) = self.bridge {
      if is_external_source(&resolved.source_type) {
        let stub = FeedItem {
          id: item_id.to_string(),
          source: resolved.source_type.clone(),
          tier: crate::model::Tier::Wire,
          title: meta.get("title").and_then(MetaValue::as_str).unwrap_or_default().to_string(),
          body: None,
          image: None,
          link: meta.get("link").and_then(MetaValue::as_str).map(str::to_string),
          timestamp: chrono::Utc::now(),
          priority: 0,
          meta: meta.clone(),
          interaction: None,
          sections: None,
        };

        if let Ok(stats) = bridge.get_bridge_stats(&stub).await {
          sections.push(bridge_stats_section(&stats));
        }
      }
    }

    Ok(sections)
  }
}

/// Sources whose content lives on an external network and therefore has
/// a meaningful cross-user bridge. Local/synthetic sources never carry
/// bridge state.
fn is_external_source(source_type: &str) -> bool {
  matches!(
    source_type,
    "reddit" | "hackernews" | "mastodon" | "youtube" | "podcast" | "freshrss" | "headlines"
  )
}

fn bridge_stats_section(stats: &BridgeStats) -> DetailSection {
  let mut entries = vec![crate::model::StatEntry {
    label: "bridge.exists".to_string(),
    value: stats.exists.to_string(),
  }];
  entries.push(crate::model::StatEntry {
    label: "bridge.commentCount".to_string(),
    value: stats.comment_count.to_string(),
  });
  if let Some(ts) = stats.last_activity_ts {
    entries.push(crate::model::StatEntry {
      label: "bridge.lastActivityTs".to_string(),
      value: ts.to_rfc3339(),
    });
  }
  DetailSection::Stats { stats: entries }
}
