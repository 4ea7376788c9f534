//! Channel-list video source. Library tier.
//!
//! Normalizes against the public, no-API-key channel upload feed
//! (`https://www.youtube.com/feeds/videos.xml?channel_id=...`) rather than
//! the full Data API, since API-key provisioning is out of scope here.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::string_list;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

pub struct YoutubeAdapter {
  client: reqwest::Client,
}

impl Default for YoutubeAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for YoutubeAdapter {
  fn source_type(&self) -> &'static str {
    "youtube"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let channels = string_list(&query.config, "channels");
    if channels.is_empty() {
      return Ok(FetchPage::default());
    }

    let mut items = Vec::new();
    for channel_id in &channels {
      let url = format!("https://www.youtube.com/feeds/videos.xml?channel_id={channel_id}");
      let body = self
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| Error::fetch_failed("youtube", e))?
        .text()
        .await
        .map_err(|e| Error::fetch_failed("youtube", e))?;

      items.extend(parse_feed(&body, channel_id).into_iter().take(query.page_size.max(1)));
    }

    Ok(FetchPage {
      items,
      has_more: false,
      next_page: None,
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    Ok(Some(FeedItem {
      id: format!("youtube:{local_id}"),
      source: "youtube".to_string(),
      tier: Tier::Library,
      title: local_id.to_string(),
      body: None,
      image: None,
      link: Some(format!("https://www.youtube.com/watch?v={local_id}")),
      timestamp: chrono::Utc::now(),
      priority: 0,
      meta: MetaMap::new(),
      interaction: None,
      sections: None,
    }))
  }

  async fn get_detail(&self, local_id: &str, _meta: &MetaMap) -> Result<Vec<DetailSection>> {
    Ok(vec![DetailSection::Embed {
      provider: "youtube".to_string(),
      url: format!("https://www.youtube.com/embed/{local_id}"),
      aspect_ratio: Some(16.0 / 9.0),
    }])
  }
}

fn parse_feed(xml: &str, channel_id: &str) -> Vec<FeedItem> {
  let mut items = Vec::new();
  for entry in xml.split("<entry>").skip(1) {
    let video_id = extract_tag(entry, "yt:videoId");
    let title = extract_tag(entry, "title");
    let published = extract_tag(entry, "published");

    let (Some(video_id), Some(title)) = (video_id, title) else {
      continue;
    };

    let timestamp = published
      .as_deref()
      .and_then(|p| chrono::DateTime::parse_from_rfc3339(p).ok())
      .map(|t| t.with_timezone(&chrono::Utc))
      .unwrap_or_else(chrono::Utc::now);

    items.push(FeedItem {
      id: format!("youtube:{video_id}"),
      source: "youtube".to_string(),
      tier: Tier::Library,
      title,
      body: None,
      image: Some(format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")),
      link: Some(format!("https://www.youtube.com/watch?v={video_id}")),
      timestamp,
      priority: 0,
      meta: MetaMap::new().with("channelId", channel_id),
      interaction: None,
      sections: None,
    });
  }
  items
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
  let open = format!("<{tag}>");
  let close = format!("</{tag}>");
  let start = xml.find(&open)? + open.len();
  let end = xml[start..].find(&close)? + start;
  Some(xml[start..end].to_string())
}
