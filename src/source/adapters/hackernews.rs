//! Hacker News, via the public Firebase-backed API. Wire tier, no auth.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{DetailSection, FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::{get_json, string_opt};
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

pub struct HackerNewsAdapter {
  client: reqwest::Client,
}

impl Default for HackerNewsAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
  fn source_type(&self) -> &'static str {
    "hackernews"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let base_url = string_opt(&query.config, "baseUrl").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let offset: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);
    let ids = get_json(&self.client, &format!("{base_url}/topstories.json"), "hackernews").await?;
    let ids: Vec<i64> = ids.as_array().into_iter().flatten().filter_map(|v| v.as_i64()).collect();

    let page_ids: Vec<i64> = ids.iter().skip(offset).take(query.page_size.max(1)).copied().collect();
    let mut items = Vec::with_capacity(page_ids.len());
    for id in &page_ids {
      let item = get_json(&self.client, &format!("{base_url}/item/{id}.json"), "hackernews").await?;
      if let Some(feed_item) = parse_item(&item) {
        items.push(feed_item);
      }
    }

    let next_offset = offset + page_ids.len();
    Ok(FetchPage {
      items,
      has_more: next_offset < ids.len(),
      next_page: Some(next_offset.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let item = get_json(
      &self.client,
      &format!("{DEFAULT_BASE_URL}/item/{local_id}.json"),
      "hackernews",
    )
    .await?;
    Ok(parse_item(&item))
  }

  async fn get_detail(&self, local_id: &str, _meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let item = get_json(
      &self.client,
      &format!("{DEFAULT_BASE_URL}/item/{local_id}.json"),
      "hackernews",
    )
    .await?;

    let mut comments = Vec::new();
    for kid in item["kids"].as_array().into_iter().flatten() {
      if let Some(kid_id) = kid.as_i64() {
        let comment = get_json(
          &self.client,
          &format!("{DEFAULT_BASE_URL}/item/{kid_id}.json"),
          "hackernews",
        )
        .await?;
        if let Some(author) = comment["by"].as_str() {
          comments.push(crate::model::CommentEntry {
            author: author.to_string(),
            body: comment["text"].as_str().unwrap_or_default().to_string(),
            score: 0,
            depth: 0,
          });
        }
      }
    }

    Ok(vec![
      DetailSection::Body {
        text: item["text"].as_str().unwrap_or_default().to_string(),
      },
      DetailSection::Comments { comments },
    ])
  }
}

fn parse_item(item: &serde_json::Value) -> Option<FeedItem> {
  let id = item["id"].as_i64()?;
  let timestamp = item["time"]
    .as_i64()
    .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
    .unwrap_or_else(chrono::Utc::now);

  Some(FeedItem {
    id: format!("hackernews:{id}"),
    source: "hackernews".to_string(),
    tier: Tier::Wire,
    title: item["title"].as_str().unwrap_or_default().to_string(),
    body: None,
    image: None,
    link: item["url"].as_str().map(str::to_string),
    timestamp,
    priority: item["score"].as_i64().unwrap_or(0),
    meta: MetaMap::new().with("descendants", item["descendants"].as_i64().unwrap_or(0)),
    interaction: None,
    sections: None,
  })
}
