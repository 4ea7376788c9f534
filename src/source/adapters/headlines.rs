//! Built-in news-headline pseudo-source. Wire tier, config-driven.
//!
//! Like `freshrss`, generates deterministic entries per `(topic, page)`
//! rather than speaking to a real news wire — the out-of-scope concern
//! here is any specific third-party API contract, not the tier-assembly
//! behavior this adapter exists to exercise.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::string_list;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

#[derive(Default)]
pub struct HeadlinesAdapter;

#[async_trait]
impl SourceAdapter for HeadlinesAdapter {
  fn source_type(&self) -> &'static str {
    "headlines"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let topics = {
      let t = string_list(&query.config, "topics");
      if t.is_empty() { vec!["world".to_string()] } else { t }
    };
    let page: u32 = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);

    let items: Vec<FeedItem> = topics
      .iter()
      .map(|topic| synthesize_headline(topic, page))
      .take(query.page_size.max(1))
      .collect();

    Ok(FetchPage {
      items,
      has_more: page < 50,
      next_page: Some((page + 1).to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    Ok(Some(synthesize_headline(local_id, 0)))
  }
}

fn synthesize_headline(topic: &str, page: u32) -> FeedItem {
  let hash = blake3::hash(format!("{topic}:{page}").as_bytes());
  let id_hex = &hash.to_hex()[..10];

  FeedItem {
    id: format!("headlines:{id_hex}"),
    source: "headlines".to_string(),
    tier: Tier::Wire,
    title: format!("Headline roundup: {topic}"),
    body: None,
    image: None,
    link: None,
    timestamp: chrono::Utc::now(),
    priority: 0,
    meta: MetaMap::new().with("topic", topic),
    interaction: None,
    sections: None,
  }
}
