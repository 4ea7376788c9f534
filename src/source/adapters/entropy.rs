//! Built-in grounding-prompt pseudo-source. Compass tier.
//!
//! No backing store: each fetch deterministically selects one prompt from
//! a small fixed set, keyed by the page token, so a session scrolling past
//! entropy cards sees a different prompt each time without repeats until
//! the set is exhausted.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedItem, MetaMap, Tier};

use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

const PROMPTS: &[&str] = &[
  "Name one thing that went right today.",
  "Take three slow breaths before you keep scrolling.",
  "Who do you want to call this week?",
  "What's one task you've been avoiding?",
  "Drink some water.",
];

#[derive(Default)]
pub struct EntropyAdapter;

#[async_trait]
impl SourceAdapter for EntropyAdapter {
  fn source_type(&self) -> &'static str {
    "entropy"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let offset: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);
    if offset >= PROMPTS.len() {
      return Ok(FetchPage {
        items: Vec::new(),
        has_more: false,
        next_page: None,
      });
    }

    let prompt = PROMPTS[offset];
    let item = make_item(offset, prompt);
    let next = offset + 1;

    Ok(FetchPage {
      items: vec![item],
      has_more: next < PROMPTS.len(),
      next_page: Some(next.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let idx: usize = match local_id.parse() {
      Ok(i) => i,
      Err(_) => return Ok(None),
    };
    Ok(PROMPTS.get(idx).map(|p| make_item(idx, p)))
  }
}

fn make_item(idx: usize, prompt: &str) -> FeedItem {
  FeedItem {
    id: format!("entropy:{idx}"),
    source: "entropy".to_string(),
    tier: Tier::Compass,
    title: prompt.to_string(),
    body: None,
    image: None,
    link: None,
    timestamp: chrono::Utc::now(),
    priority: 0,
    meta: MetaMap::new(),
    interaction: None,
    sections: None,
  }
}
