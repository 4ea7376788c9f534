//! The universal card type and its supporting value types.
//!
//! Every [`SourceAdapter`](crate::source::SourceAdapter) normalizes whatever
//! it fetches into a [`FeedItem`]; everything downstream (pool, tier
//! assembly, filters, detail) operates on this one shape rather than on
//! per-source types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the four allocation buckets a [`FeedItem`] can belong to.
///
/// `wire` decays over a session (see [`crate::tier`]); the other three do
/// not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
  /// External novelty: discussion sites, social timelines, news.
  Wire,
  /// Curated deep content: video, long reads, podcasts.
  Library,
  /// Personal memories: photos, journal entries.
  Scrapbook,
  /// Grounding actions and checks: tasks, habits, scripture, prompts.
  Compass,
}

impl Tier {
  pub const ALL: [Tier; 4] = [Tier::Wire, Tier::Library, Tier::Scrapbook, Tier::Compass];

  pub fn as_str(self) -> &'static str {
    match self {
      Tier::Wire => "wire",
      Tier::Library => "library",
      Tier::Scrapbook => "scrapbook",
      Tier::Compass => "compass",
    }
  }

  pub fn parse(s: &str) -> Option<Tier> {
    match s {
      "wire" => Some(Tier::Wire),
      "library" => Some(Tier::Library),
      "scrapbook" => Some(Tier::Scrapbook),
      "compass" => Some(Tier::Compass),
      _ => None,
    }
  }
}

impl std::fmt::Display for Tier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A scalar or list-of-scalars value in a [`FeedItem::meta`] map.
///
/// Modeled as a small tagged variant rather than `serde_json::Value` so
/// adapters can't accidentally stash nested objects that downstream code
/// would have to guess the shape of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
  String(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  List(Vec<MetaValue>),
}

impl From<&str> for MetaValue {
  fn from(s: &str) -> Self {
    MetaValue::String(s.to_string())
  }
}

impl From<String> for MetaValue {
  fn from(s: String) -> Self {
    MetaValue::String(s)
  }
}

impl From<i64> for MetaValue {
  fn from(v: i64) -> Self {
    MetaValue::Int(v)
  }
}

impl From<bool> for MetaValue {
  fn from(v: bool) -> Self {
    MetaValue::Bool(v)
  }
}

impl MetaValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      MetaValue::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      MetaValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      MetaValue::Int(i) => Some(*i),
      _ => None,
    }
  }
}

/// Adapter-specific key/value hints (`subreddit`, `channelName`, `queryName`,
/// `eventKind`, `bridgeExists`, ...). Ordered (`BTreeMap`) so list ordering
/// that happens to depend on meta iteration stays deterministic.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// Helpers shared by adapters building a meta map without pulling in a
/// separate builder type.
pub trait MetaMapExt {
  fn with(self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self;
}

impl MetaMapExt for MetaMap {
  fn with(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
    self.insert(key.into(), value.into());
    self
  }
}

/// A button/text-input/rating/quick-reply affordance attached to a
/// [`FeedItem`], echoed back verbatim by the client on response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeedInteraction {
  Buttons { buttons: Vec<InteractionButton> },
  TextInput { placeholder: String, max_length: Option<u32> },
  Rating { scale: u8 },
  QuickReply { options: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionButton {
  pub label: String,
  pub value: String,
  pub style: Option<String>,
}

/// `FeedInteraction` is tagged with the endpoint the client posts its
/// response to, plus opaque context it must echo back unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEnvelope {
  pub endpoint: String,
  pub context: serde_json::Value,
  #[serde(flatten)]
  pub interaction: FeedInteraction,
}

/// A tagged section of a detail response. List views never carry these;
/// only [`crate::detail::DetailAssembler::get_detail`] output does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetailSection {
  Article { title: String, html: String, word_count: u32 },
  Comments { comments: Vec<CommentEntry> },
  Embed { provider: String, url: String, aspect_ratio: Option<f32> },
  Body { text: String },
  Stats { stats: Vec<StatEntry> },
  Metadata { stats: Vec<StatEntry> },
  Media { media: Vec<MediaEntry> },
  Actions { actions: Vec<InteractionEnvelope> },
  Player { content_id: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEntry {
  pub author: String,
  pub body: String,
  pub score: i64,
  pub depth: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatEntry {
  pub label: String,
  pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntry {
  pub url: String,
  pub caption: Option<String>,
}

/// The universal card.
///
/// `id` is always `"{source}:{localId}"`; the normalization contract that
/// every adapter upholds is checked centrally in
/// [`crate::source::registry::SourceRegistry::validate_item`] rather than
/// trusted to each adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
  pub id: String,
  pub source: String,
  pub tier: Tier,
  pub title: String,
  pub body: Option<String>,
  pub image: Option<String>,
  pub link: Option<String>,
  pub timestamp: chrono::DateTime<chrono::Utc>,
  pub priority: i64,
  #[serde(default)]
  pub meta: MetaMap,
  pub interaction: Option<FeedInteraction>,
  /// Never populated on list items; only [`crate::detail`] fills this in.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sections: Option<Vec<DetailSection>>,
}

impl FeedItem {
  /// Total order used for tier selection tie-breaks:
  /// `(priority desc, timestamp desc, id asc)`.
  pub fn selection_key(&self) -> (std::cmp::Reverse<i64>, std::cmp::Reverse<chrono::DateTime<chrono::Utc>>, &str) {
    (
      std::cmp::Reverse(self.priority),
      std::cmp::Reverse(self.timestamp),
      self.id.as_str(),
    )
  }

  pub fn local_id(&self) -> &str {
    self
      .id
      .split_once(':')
      .map(|(_, rest)| rest)
      .unwrap_or(self.id.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tier_round_trips_through_str() {
    for tier in Tier::ALL {
      assert_eq!(Tier::parse(tier.as_str()), Some(tier));
    }
  }

  #[test]
  fn meta_map_builder_chains() {
    let meta = MetaMap::new().with("subreddit", "worldnews").with("score", 42i64);
    assert_eq!(meta.get("subreddit").and_then(MetaValue::as_str), Some("worldnews"));
    assert_eq!(meta.get("score").and_then(MetaValue::as_int), Some(42));
  }

  #[test]
  fn selection_key_orders_priority_then_recency_then_id() {
    let now = chrono::Utc::now();
    let a = FeedItem {
      id: "reddit:a".into(),
      source: "reddit".into(),
      tier: Tier::Wire,
      title: "a".into(),
      body: None,
      image: None,
      link: None,
      timestamp: now,
      priority: 5,
      meta: MetaMap::new(),
      interaction: None,
      sections: None,
    };
    let mut b = a.clone();
    b.id = "reddit:b".into();
    b.priority = 10;

    let mut items = vec![a.clone(), b.clone()];
    items.sort_by(|x, y| x.selection_key().cmp(&y.selection_key()));
    assert_eq!(items[0].id, "reddit:b");
  }
}
