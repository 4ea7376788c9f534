//! Shared helpers for the adapters that speak HTTP.
//!
//! None of these adapters reimplement a full client for their upstream API
//! — that wire protocol detail is out of scope here. They demonstrate the
//! normalization contract against a minimal, configurable endpoint shape so
//! tier assembly and filter resolution have real adapters to exercise.

use std::time::Duration;

use crate::error::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Issue a GET request and parse the body as JSON, mapping transport and
/// parse failures onto `Error::FetchFailed` so callers can treat every
/// upstream hiccup uniformly.
pub async fn get_json(client: &reqwest::Client, url: &str, source: &str) -> Result<serde_json::Value> {
  let response = client
    .get(url)
    .timeout(DEFAULT_TIMEOUT)
    .send()
    .await
    .map_err(|e| Error::fetch_failed(source, e))?;

  if !response.status().is_success() {
    return Err(Error::fetch_failed(
      source,
      format!("upstream returned {}", response.status()),
    ));
  }

  response
    .json::<serde_json::Value>()
    .await
    .map_err(|e| Error::fetch_failed(source, e))
}

pub fn string_list(value: &crate::model::MetaMap, key: &str) -> Vec<String> {
  match value.get(key) {
    Some(crate::model::MetaValue::List(items)) => items
      .iter()
      .filter_map(|v| v.as_str().map(str::to_string))
      .collect(),
    Some(crate::model::MetaValue::String(s)) => vec![s.clone()],
    _ => Vec::new(),
  }
}

pub fn string_opt(value: &crate::model::MetaMap, key: &str) -> Option<String> {
  value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}
