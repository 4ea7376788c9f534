//! Subreddit-list discussion source. Wire tier.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{DetailSection, FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::{get_json, string_list, string_opt};
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

pub struct RedditAdapter {
  client: reqwest::Client,
}

impl Default for RedditAdapter {
  fn default() -> Self {
    Self {
      client: reqwest::Client::new(),
    }
  }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
  fn source_type(&self) -> &'static str {
    "reddit"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let base_url = string_opt(&query.config, "baseUrl").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let subreddits = string_list(&query.config, "subreddits");
    if subreddits.is_empty() {
      return Ok(FetchPage::default());
    }

    let after = query.page.clone();
    let mut items = Vec::new();

    for subreddit in &subreddits {
      let mut url = format!(
        "{base_url}/r/{subreddit}/new.json?limit={}",
        query.page_size.max(1)
      );
      if let Some(after) = &after {
        url.push_str(&format!("&after={after}"));
      }

      let body = get_json(&self.client, &url, "reddit").await?;
      for child in body["data"]["children"].as_array().into_iter().flatten() {
        if let Some(item) = parse_listing_child(child, subreddit) {
          items.push(item);
        }
      }
    }

    Ok(FetchPage {
      items,
      has_more: false,
      next_page: None,
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let url = format!("{DEFAULT_BASE_URL}/comments/{local_id}.json");
    let body = get_json(&self.client, &url, "reddit").await?;
    let post = &body[0]["data"]["children"][0];
    if post.is_null() {
      return Ok(None);
    }
    Ok(parse_listing_child(post, post["data"]["subreddit"].as_str().unwrap_or("")))
  }

  async fn get_detail(&self, local_id: &str, _meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let url = format!("{DEFAULT_BASE_URL}/comments/{local_id}.json");
    let body = get_json(&self.client, &url, "reddit").await?;

    let post = &body[0]["data"]["children"][0]["data"];
    let article = DetailSection::Article {
      title: post["title"].as_str().unwrap_or_default().to_string(),
      html: post["selftext_html"]
        .as_str()
        .unwrap_or_default()
        .to_string(),
      word_count: post["selftext"]
        .as_str()
        .map(|s| s.split_whitespace().count() as u32)
        .unwrap_or(0),
    };

    let mut comments = Vec::new();
    for node in body[1]["data"]["children"].as_array().into_iter().flatten() {
      let data = &node["data"];
      if let Some(author) = data["author"].as_str() {
        comments.push(crate::model::CommentEntry {
          author: author.to_string(),
          body: data["body"].as_str().unwrap_or_default().to_string(),
          score: data["score"].as_i64().unwrap_or(0),
          depth: 0,
        });
      }
    }

    Ok(vec![article, DetailSection::Comments { comments }])
  }
}

fn parse_listing_child(child: &serde_json::Value, subreddit: &str) -> Option<FeedItem> {
  let data = &child["data"];
  let local_id = data["id"].as_str()?.to_string();
  let created_utc = data["created_utc"].as_f64().unwrap_or(0.0);
  let timestamp = chrono::DateTime::from_timestamp(created_utc as i64, 0).unwrap_or_else(chrono::Utc::now);

  Some(FeedItem {
    id: format!("reddit:{local_id}"),
    source: "reddit".to_string(),
    tier: Tier::Wire,
    title: data["title"].as_str().unwrap_or_default().to_string(),
    body: data["selftext"].as_str().filter(|s| !s.is_empty()).map(|s| {
      s.chars().take(280).collect()
    }),
    image: data["thumbnail"]
      .as_str()
      .filter(|s| s.starts_with("http"))
      .map(str::to_string),
    link: data["url"].as_str().map(str::to_string),
    timestamp,
    priority: data["score"].as_i64().unwrap_or(0),
    meta: MetaMap::new()
      .with("subreddit", subreddit)
      .with("numComments", data["num_comments"].as_i64().unwrap_or(0)),
    interaction: None,
    sections: None,
  })
}
