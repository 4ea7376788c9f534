//! Named-query scripture/hymn source. Compass tier.
//!
//! Demonstrates a declared prefix with an `idTransform`: the `hymn` prefix
//! is rewritten to `song/hymn/{value}` before being treated as this
//! adapter's own local id, matching the worked example in the content-id
//! resolver's contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::string_opt;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery, IdPrefix};

pub struct ScriptureAdapter;

#[async_trait]
impl SourceAdapter for ScriptureAdapter {
  fn source_type(&self) -> &'static str {
    "scripture"
  }

  fn prefixes(&self) -> Vec<IdPrefix> {
    vec![IdPrefix::with_transform("hymn", |value| {
      format!("song/hymn/{value}")
    })]
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let Some(query_name) = query.query_name.clone().or_else(|| string_opt(&query.config, "queryName"))
    else {
      return Ok(FetchPage::default());
    };
    let reference = string_opt(&query.config, "reference").unwrap_or_else(|| "3-nephi-11".to_string());

    let item = FeedItem {
      id: format!("scripture:{reference}"),
      source: "scripture".to_string(),
      tier: Tier::Compass,
      title: reference.replace('-', " "),
      body: Some("Read today's passage.".to_string()),
      image: None,
      link: None,
      timestamp: chrono::Utc::now(),
      priority: 0,
      meta: MetaMap::new().with("queryName", query_name),
      interaction: None,
      sections: None,
    };

    Ok(FetchPage {
      items: vec![item],
      has_more: false,
      next_page: None,
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    Ok(Some(FeedItem {
      id: format!("scripture:{local_id}"),
      source: "scripture".to_string(),
      tier: Tier::Compass,
      title: local_id.replace('-', " ").replace('/', " "),
      body: None,
      image: None,
      link: None,
      timestamp: chrono::Utc::now(),
      priority: 0,
      meta: MetaMap::new(),
      interaction: None,
      sections: None,
    }))
  }
}
