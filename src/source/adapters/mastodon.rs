//! Federated social timeline (any Mastodon-compatible instance). Wire tier.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::{get_json, string_opt};
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

pub struct MastodonAdapter {
  client: reqwest::Client,
}

impl Default for MastodonAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for MastodonAdapter {
  fn source_type(&self) -> &'static str {
    "mastodon"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let Some(instance) = string_opt(&query.config, "instance") else {
      return Ok(FetchPage::default());
    };
    let timeline = string_opt(&query.config, "timeline").unwrap_or_else(|| "public".to_string());

    let mut url = format!(
      "https://{instance}/api/v1/timelines/{timeline}?limit={}",
      query.page_size.max(1)
    );
    if let Some(max_id) = &query.page {
      url.push_str(&format!("&max_id={max_id}"));
    }

    let body = get_json(&self.client, &url, "mastodon").await?;
    let statuses = body.as_array().cloned().unwrap_or_default();
    let next_page = statuses.last().and_then(|s| s["id"].as_str()).map(str::to_string);

    let items = statuses.iter().filter_map(|s| parse_status(s, &instance)).collect();

    Ok(FetchPage {
      items,
      has_more: !statuses.is_empty(),
      next_page,
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    // Local ids are `{instance}/{statusId}`; instance travels with the id
    // since a single adapter instance may serve several configured
    // instances via distinct query configs.
    let Some((instance, status_id)) = local_id.split_once('/') else {
      return Ok(None);
    };
    let url = format!("https://{instance}/api/v1/statuses/{status_id}");
    let body = get_json(&self.client, &url, "mastodon").await?;
    if body["id"].is_null() {
      return Ok(None);
    }
    Ok(parse_status(&body, instance))
  }
}

fn parse_status(status: &serde_json::Value, instance: &str) -> Option<FeedItem> {
  let status_id = status["id"].as_str()?;
  let timestamp = status["created_at"]
    .as_str()
    .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
    .map(|t| t.with_timezone(&chrono::Utc))
    .unwrap_or_else(chrono::Utc::now);

  let account = status["account"]["acct"].as_str().unwrap_or_default();
  let content = status["content"].as_str().unwrap_or_default();
  let plain = content.replace("<p>", "").replace("</p>", "\n");

  Some(FeedItem {
    id: format!("mastodon:{instance}/{status_id}"),
    source: "mastodon".to_string(),
    tier: Tier::Wire,
    title: format!("@{account}"),
    body: Some(plain.chars().take(280).collect()),
    image: status["media_attachments"][0]["preview_url"].as_str().map(str::to_string),
    link: status["url"].as_str().map(str::to_string),
    timestamp,
    priority: status["reblogs_count"].as_i64().unwrap_or(0) + status["favourites_count"].as_i64().unwrap_or(0),
    meta: MetaMap::new().with("account", account).with("instance", instance),
    interaction: None,
    sections: None,
  })
}
