//! RSS/Atom podcast audio feed source. Library tier.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::string_list;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

pub struct PodcastAdapter {
  client: reqwest::Client,
}

impl Default for PodcastAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for PodcastAdapter {
  fn source_type(&self) -> &'static str {
    "podcast"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let feed_urls = string_list(&query.config, "feedUrls");
    if feed_urls.is_empty() {
      return Ok(FetchPage::default());
    }

    let mut items = Vec::new();
    for feed_url in &feed_urls {
      let body = self
        .client
        .get(feed_url)
        .send()
        .await
        .map_err(|e| Error::fetch_failed("podcast", e))?
        .text()
        .await
        .map_err(|e| Error::fetch_failed("podcast", e))?;

      items.extend(parse_rss(&body).into_iter().take(query.page_size.max(1)));
    }

    Ok(FetchPage {
      items,
      has_more: false,
      next_page: None,
    })
  }

  async fn get_item(&self, _local_id: &str) -> Result<Option<FeedItem>> {
    // Podcast episodes are not addressable without the feed they came
    // from; list views are the primary surface for this adapter.
    Ok(None)
  }

  async fn get_detail(&self, local_id: &str, meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let enclosure_url = meta.get("enclosureUrl").and_then(|v| v.as_str());
    Ok(vec![DetailSection::Player {
      content_id: enclosure_url.unwrap_or(local_id).to_string(),
    }])
  }
}

fn parse_rss(xml: &str) -> Vec<FeedItem> {
  let mut items = Vec::new();
  for entry in xml.split("<item>").skip(1) {
    let title = extract_tag(entry, "title");
    let guid = extract_tag(entry, "guid").or_else(|| title.clone());
    let enclosure_url = extract_attr(entry, "enclosure", "url");
    let pub_date = extract_tag(entry, "pubDate");

    let Some(title) = title else { continue };
    let local_id = guid.unwrap_or_else(|| title.clone());
    let hash = blake3::hash(local_id.as_bytes());
    let id_hex = &hash.to_hex()[..12];

    let timestamp = pub_date
      .as_deref()
      .and_then(|d| chrono::DateTime::parse_from_rfc2822(d).ok())
      .map(|t| t.with_timezone(&chrono::Utc))
      .unwrap_or_else(chrono::Utc::now);

    let mut meta = MetaMap::new();
    if let Some(url) = &enclosure_url {
      meta = meta.with("enclosureUrl", url.as_str());
    }

    items.push(FeedItem {
      id: format!("podcast:{id_hex}"),
      source: "podcast".to_string(),
      tier: Tier::Library,
      title,
      body: extract_tag(entry, "description"),
      image: None,
      link: enclosure_url,
      timestamp,
      priority: 0,
      meta,
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
  Some(xml[start..end].trim().to_string())
}

fn extract_attr(xml: &str, tag: &str, attr: &str) -> Option<String> {
  let tag_start = xml.find(&format!("<{tag}"))?;
  let tag_end = xml[tag_start..].find('>')? + tag_start;
  let tag_text = &xml[tag_start..tag_end];
  let attr_marker = format!("{attr}=\"");
  let attr_start = tag_text.find(&attr_marker)? + attr_marker.len();
  let attr_end = tag_text[attr_start..].find('"')? + attr_start;
  Some(tag_text[attr_start..attr_end].to_string())
}
