//! Remote personal photo library (Immich server). Scrapbook tier.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MediaEntry, MetaMap, MetaMapExt, Tier};

use super::http_util::string_opt;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

pub struct ImmichAdapter {
  client: reqwest::Client,
}

impl Default for ImmichAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for ImmichAdapter {
  fn source_type(&self) -> &'static str {
    "immich"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let (Some(server_url), Some(api_key)) = (
      string_opt(&query.config, "serverUrl"),
      string_opt(&query.config, "apiKey"),
    ) else {
      return Ok(FetchPage::default());
    };

    let page_num: u32 = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(1);
    let body = self
      .client
      .post(format!("{server_url}/api/search/metadata"))
      .header("x-api-key", &api_key)
      .json(&serde_json::json!({ "page": page_num, "size": query.page_size.max(1) }))
      .send()
      .await
      .map_err(|e| Error::fetch_failed("immich", e))?
      .json::<serde_json::Value>()
      .await
      .map_err(|e| Error::fetch_failed("immich", e))?;

    let assets = body["assets"]["items"].as_array().cloned().unwrap_or_default();
    let has_more = !body["assets"]["nextPage"].is_null();

    let items = assets
      .iter()
      .filter_map(|asset| parse_asset(asset, &server_url))
      .collect();

    Ok(FetchPage {
      items,
      has_more,
      next_page: Some((page_num + 1).to_string()),
    })
  }

  async fn get_item(&self, _local_id: &str) -> Result<Option<FeedItem>> {
    Ok(None)
  }

  async fn get_detail(&self, local_id: &str, meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let server_url = meta.get("serverUrl").and_then(|v| v.as_str()).unwrap_or_default();
    Ok(vec![DetailSection::Media {
      media: vec![MediaEntry {
        url: format!("{server_url}/api/assets/{local_id}/original"),
        caption: None,
      }],
    }])
  }
}

fn parse_asset(asset: &serde_json::Value, server_url: &str) -> Option<FeedItem> {
  let id = asset["id"].as_str()?;
  let timestamp = asset["fileCreatedAt"]
    .as_str()
    .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
    .map(|t| t.with_timezone(&chrono::Utc))
    .unwrap_or_else(chrono::Utc::now);

  Some(FeedItem {
    id: format!("immich:{id}"),
    source: "immich".to_string(),
    tier: Tier::Scrapbook,
    title: asset["originalFileName"].as_str().unwrap_or("photo").to_string(),
    body: None,
    image: Some(format!("{server_url}/api/assets/{id}/thumbnail")),
    link: None,
    timestamp,
    priority: 0,
    meta: MetaMap::new().with("serverUrl", server_url),
    interaction: None,
    sections: None,
  })
}
