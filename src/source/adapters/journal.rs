//! Local journal-entry directory source. Scrapbook tier.
//!
//! Each plain-text file under the configured directory is one entry; the
//! first line becomes the title, the rest becomes the body summary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MetaMap, Tier};

use super::http_util::string_opt;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

#[derive(Default)]
pub struct JournalAdapter;

#[async_trait]
impl SourceAdapter for JournalAdapter {
  fn source_type(&self) -> &'static str {
    "journal"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let Some(root) = string_opt(&query.config, "path") else {
      return Ok(FetchPage::default());
    };
    let root = PathBuf::from(root);
    let skip: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);

    let mut entries: Vec<PathBuf> = tokio::task::spawn_blocking(move || scan(&root))
      .await
      .map_err(|e| Error::Other(format!("scan task panicked: {e}")))??;
    entries.sort();
    entries.reverse();

    let total = entries.len();
    let page: Vec<PathBuf> = entries.into_iter().skip(skip).take(query.page_size.max(1)).collect();
    let next_skip = skip + page.len();

    let items = page.iter().filter_map(|path| parse_entry(path)).collect();

    Ok(FetchPage {
      items,
      has_more: next_skip < total,
      next_page: Some(next_skip.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    Ok(parse_entry(Path::new(local_id)))
  }

  async fn get_detail(&self, local_id: &str, _meta: &MetaMap) -> Result<Vec<DetailSection>> {
    let text = std::fs::read_to_string(local_id).unwrap_or_default();
    let word_count = text.split_whitespace().count() as u32;
    Ok(vec![DetailSection::Article {
      title: Path::new(local_id)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default(),
      html: text.replace('\n', "<br/>"),
      word_count,
    }])
  }
}

fn scan(root: &Path) -> Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
    if entry.file_type().is_file()
      && entry.path().extension().and_then(|e| e.to_str()) == Some("txt")
    {
      found.push(entry.path().to_path_buf());
    }
  }
  Ok(found)
}

fn parse_entry(path: &Path) -> Option<FeedItem> {
  let metadata = std::fs::metadata(path).ok()?;
  let modified = metadata.modified().ok()?;
  let timestamp: chrono::DateTime<chrono::Utc> = modified.into();
  let text = std::fs::read_to_string(path).ok()?;
  let mut lines = text.lines();
  let title = lines.next().unwrap_or("Untitled").to_string();
  let body: String = lines.collect::<Vec<_>>().join(" ").chars().take(280).collect();
  let path_str = path.to_string_lossy().to_string();

  Some(FeedItem {
    id: format!("journal:{path_str}"),
    source: "journal".to_string(),
    tier: Tier::Scrapbook,
    title,
    body: Some(body),
    image: None,
    link: None,
    timestamp,
    priority: 0,
    meta: MetaMap::new(),
    interaction: None,
    sections: None,
  })
}
