//! Personal task/todo pseudo-source. Compass tier.
//!
//! Config carries a static list of open task descriptions; each surfaces
//! as a card with a "mark done" button interaction.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeedInteraction, FeedItem, InteractionButton, MetaMap, Tier};

use super::http_util::string_list;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

#[derive(Default)]
pub struct TasksAdapter;

#[async_trait]
impl SourceAdapter for TasksAdapter {
  fn source_type(&self) -> &'static str {
    "tasks"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let tasks = string_list(&query.config, "openTasks");
    let offset: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);

    let page: Vec<&String> = tasks.iter().skip(offset).take(query.page_size.max(1)).collect();
    let next = offset + page.len();

    let items = page.into_iter().enumerate().map(|(i, task)| make_item(offset + i, task)).collect();

    Ok(FetchPage {
      items,
      has_more: next < tasks.len(),
      next_page: Some(next.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    let idx: usize = local_id.parse().map_err(|_| crate::error::Error::NotFound(local_id.to_string()))?;
    Ok(Some(make_item(idx, "open task")))
  }

  async fn mark_consumed(&self, _user: &str, _local_ids: &[String]) -> Result<()> {
    // A real deployment would write this back to the task store; the
    // external write-back collaborator is out of scope here.
    Ok(())
  }
}

fn make_item(idx: usize, description: &str) -> FeedItem {
  FeedItem {
    id: format!("tasks:{idx}"),
    source: "tasks".to_string(),
    tier: Tier::Compass,
    title: description.to_string(),
    body: None,
    image: None,
    link: None,
    timestamp: chrono::Utc::now(),
    priority: 0,
    meta: MetaMap::new(),
    interaction: Some(FeedInteraction::Buttons {
      buttons: vec![InteractionButton {
        label: "Mark done".to_string(),
        value: "done".to_string(),
        style: None,
      }],
    }),
    sections: None,
  }
}
