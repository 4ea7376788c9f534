//! Personal habit-check pseudo-source. Compass tier.
//!
//! One card per configured habit, with a quick-reply interaction for
//! logging today's check-in.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedInteraction, FeedItem, MetaMap, MetaMapExt, Tier};

use super::http_util::string_list;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

#[derive(Default)]
pub struct HabitsAdapter;

#[async_trait]
impl SourceAdapter for HabitsAdapter {
  fn source_type(&self) -> &'static str {
    "habits"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let habits = string_list(&query.config, "habits");
    let offset: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);

    let page: Vec<&String> = habits.iter().skip(offset).take(query.page_size.max(1)).collect();
    let next = offset + page.len();
    let items = page.into_iter().enumerate().map(|(i, habit)| make_item(offset + i, habit)).collect();

    Ok(FetchPage {
      items,
      has_more: next < habits.len(),
      next_page: Some(next.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let idx: usize = local_id.parse().map_err(|_| crate::error::Error::NotFound(local_id.to_string()))?;
    Ok(Some(make_item(idx, "habit")))
  }
}

fn make_item(idx: usize, habit: &str) -> FeedItem {
  FeedItem {
    id: format!("habits:{idx}"),
    source: "habits".to_string(),
    tier: Tier::Compass,
    title: habit.to_string(),
    body: None,
    image: None,
    link: None,
    timestamp: chrono::Utc::now(),
    priority: 0,
    meta: MetaMap::new().with("habit", habit),
    interaction: Some(FeedInteraction::QuickReply {
      options: vec!["Done".to_string(), "Skip".to_string()],
    }),
    sections: None,
  }
}
