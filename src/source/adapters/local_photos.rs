//! Local photo-library directory source. Scrapbook tier.
//!
//! Walks a configured directory, comparing mtime/size against the pool
//! manager's paging state to find files new since the last page.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{DetailSection, FeedItem, MediaEntry, MetaMap, MetaMapExt, Tier};

use super::http_util::string_opt;
use crate::source::adapter::SourceAdapter;
use crate::source::types::{FetchPage, FetchQuery};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic"];

#[derive(Default)]
pub struct LocalPhotosAdapter;

#[async_trait]
impl SourceAdapter for LocalPhotosAdapter {
  fn source_type(&self) -> &'static str {
    "local_photos"
  }

  async fn fetch(&self, query: &FetchQuery) -> Result<FetchPage> {
    let Some(root) = string_opt(&query.config, "path") else {
      return Ok(FetchPage::default());
    };
    let root = PathBuf::from(root);
    let skip: usize = query.page.as_deref().and_then(|p| p.parse().ok()).unwrap_or(0);

    let mut candidates: Vec<PathBuf> = tokio::task::spawn_blocking(move || scan(&root))
      .await
      .map_err(|e| Error::Other(format!("scan task panicked: {e}")))??;
    candidates.sort();

    let total = candidates.len();
    let page: Vec<PathBuf> = candidates.into_iter().skip(skip).take(query.page_size.max(1)).collect();
    let next_skip = skip + page.len();

    let items = page.iter().filter_map(|path| parse_file(path)).collect();

    Ok(FetchPage {
      items,
      has_more: next_skip < total,
      next_page: Some(next_skip.to_string()),
    })
  }

  async fn get_item(&self, local_id: &str) -> Result<Option<FeedItem>> {
    Ok(parse_file(Path::new(local_id)))
  }

  async fn get_detail(&self, local_id: &str, _meta: &MetaMap) -> Result<Vec<DetailSection>> {
    Ok(vec![DetailSection::Media {
      media: vec![MediaEntry {
        url: format!("file://{local_id}"),
        caption: None,
      }],
    }])
  }
}

fn scan(root: &Path) -> Result<Vec<PathBuf>> {
  let mut found = Vec::new();
  for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    let is_image = path
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
      .unwrap_or(false);
    if is_image {
      found.push(path.to_path_buf());
    }
  }
  Ok(found)
}

fn parse_file(path: &Path) -> Option<FeedItem> {
  let metadata = std::fs::metadata(path).ok()?;
  let modified = metadata.modified().ok()?;
  let timestamp: chrono::DateTime<chrono::Utc> = modified.into();
  let path_str = path.to_string_lossy().to_string();

  Some(FeedItem {
    id: format!("local_photos:{path_str}"),
    source: "local_photos".to_string(),
    tier: Tier::Scrapbook,
    title: path.file_name()?.to_string_lossy().to_string(),
    body: None,
    image: Some(format!("file://{path_str}")),
    link: None,
    timestamp,
    priority: 0,
    meta: MetaMap::new(),
    interaction: None,
    sections: None,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config_with_path(path: &Path) -> MetaMap {
    MetaMap::new().with("path", path.to_string_lossy().to_string())
  }

  #[tokio::test]
  async fn scan_finds_only_image_files_and_pages_them() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.jpg"), b"fake").unwrap();
    std::fs::write(dir.path().join("b.png"), b"fake").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

    let adapter = LocalPhotosAdapter;
    let query = FetchQuery::first_page(config_with_path(dir.path()), 10);
    let page = adapter.fetch(&query).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(!page.has_more);
    assert!(page.items.iter().all(|i| i.tier == Tier::Scrapbook));
  }

  #[tokio::test]
  async fn missing_path_config_yields_an_empty_page_not_an_error() {
    let adapter = LocalPhotosAdapter;
    let query = FetchQuery::first_page(MetaMap::new(), 10);
    let page = adapter.fetch(&query).await.unwrap();
    assert!(page.items.is_empty());
  }
}
