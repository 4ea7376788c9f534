//! End-to-end coverage of the scroll-engine scenarios: cold start with
//! default tiers, each filter kind, and detail-with-bridging.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use boonscroll::assembly::GetNextBatchOpts;
use boonscroll::bridge::{InMemorySocialProtocol, Visibility};
use boonscroll::config::{QueryConfig, RawScrollConfig, StaticConfigSource, TierConfig};
use boonscroll::model::{MetaMap, MetaValue, Tier};
use boonscroll::source::SourceRegistry;

use common::FixtureAdapter;

fn tiered_raw_config() -> RawScrollConfig {
  let mut tiers = HashMap::new();
  tiers.insert(
    Tier::Wire,
    TierConfig {
      allocation: 4,
      enabled_sources: vec!["reddit".to_string()],
      color: "#d94f4f".to_string(),
    },
  );
  tiers.insert(
    Tier::Library,
    TierConfig {
      allocation: 3,
      enabled_sources: vec!["youtube".to_string()],
      color: "#4f7fd9".to_string(),
    },
  );
  tiers.insert(
    Tier::Scrapbook,
    TierConfig {
      allocation: 2,
      enabled_sources: vec!["journal".to_string()],
      color: "#d9b64f".to_string(),
    },
  );
  tiers.insert(
    Tier::Compass,
    TierConfig {
      allocation: 1,
      enabled_sources: vec!["entropy".to_string()],
      color: "#4fd98c".to_string(),
    },
  );

  RawScrollConfig {
    batch_size: Some(10),
    wire_decay_batches: Some(10),
    tiers,
    ..Default::default()
  }
}

#[tokio::test]
async fn cold_start_default_tiers_interleaves_wire_first() {
  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(FixtureAdapter::new("reddit", Tier::Wire, 6)));
  registry.register(Arc::new(FixtureAdapter::new("youtube", Tier::Library, 6)));
  registry.register(Arc::new(FixtureAdapter::new("journal", Tier::Scrapbook, 6)));
  registry.register(Arc::new(FixtureAdapter::new("entropy", Tier::Compass, 6)));

  let engine = boonscroll::Engine::new(
    StaticConfigSource::new(tiered_raw_config()),
    registry,
    InMemorySocialProtocol::new(),
  );

  let batch = engine.get_next_batch("alice", GetNextBatchOpts::default()).await.unwrap();

  assert_eq!(batch.items.len(), 10);
  let tier_counts = |tier: Tier| batch.items.iter().filter(|i| i.tier == tier).count();
  assert_eq!(tier_counts(Tier::Wire), 4);
  assert_eq!(tier_counts(Tier::Library), 3);
  assert_eq!(tier_counts(Tier::Scrapbook), 2);
  assert_eq!(tier_counts(Tier::Compass), 1);
  assert_eq!(batch.items[0].tier, Tier::Wire);
}

#[tokio::test]
async fn filter_by_tier_skips_tier_assembly_and_sorts_by_recency() {
  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(FixtureAdapter::new("reddit", Tier::Wire, 4)));
  registry.register(Arc::new(FixtureAdapter::new("entropy", Tier::Compass, 4)));

  let engine = boonscroll::Engine::new(
    StaticConfigSource::new(tiered_raw_config()),
    registry,
    InMemorySocialProtocol::new(),
  );

  let opts = GetNextBatchOpts {
    filter: Some("compass".to_string()),
    limit: Some(5),
    ..Default::default()
  };
  let batch = engine.get_next_batch("alice", opts).await.unwrap();

  assert!(batch.items.len() <= 5);
  assert!(batch.items.iter().all(|i| i.tier == Tier::Compass));
  let timestamps: Vec<_> = batch.items.iter().map(|i| i.timestamp).collect();
  let mut sorted = timestamps.clone();
  sorted.sort_by(|a, b| b.cmp(a));
  assert_eq!(timestamps, sorted);
}

#[tokio::test]
async fn filter_by_source_with_subsources_excludes_non_matching_subreddits() {
  let adapter = FixtureAdapter::new("reddit", Tier::Wire, 6).with_meta("subreddit", |i| {
    Some(MetaValue::String(
      match i % 3 {
        0 => "worldnews",
        1 => "usnews",
        _ => "funny",
      }
      .to_string(),
    ))
  });

  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(adapter));

  let engine = boonscroll::Engine::new(
    StaticConfigSource::new(tiered_raw_config()),
    registry,
    InMemorySocialProtocol::new(),
  );

  let opts = GetNextBatchOpts {
    filter: Some("reddit:worldnews,usnews".to_string()),
    ..Default::default()
  };
  let batch = engine.get_next_batch("alice", opts).await.unwrap();

  assert!(!batch.items.is_empty());
  for item in &batch.items {
    assert_eq!(item.source, "reddit");
    let subreddit = item.meta.get("subreddit").and_then(MetaValue::as_str).unwrap();
    assert!(subreddit == "worldnews" || subreddit == "usnews");
  }
}

#[tokio::test]
async fn filter_alias_resolves_to_named_query() {
  let adapter = FixtureAdapter::new("scripture", Tier::Compass, 3)
    .with_meta("queryName", |_| Some(MetaValue::String("scripture-bom".to_string())));

  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(adapter));

  let mut raw = tiered_raw_config();
  raw.aliases.insert("scripture".to_string(), "scripture-bom".to_string());
  raw.query_configs.insert(
    "scripture-bom".to_string(),
    QueryConfig {
      source_type: "scripture".to_string(),
      params: HashMap::new(),
    },
  );

  let engine = boonscroll::Engine::new(StaticConfigSource::new(raw), registry, InMemorySocialProtocol::new());

  let opts = GetNextBatchOpts {
    filter: Some("scripture".to_string()),
    ..Default::default()
  };
  let batch = engine.get_next_batch("alice", opts).await.unwrap();

  assert_eq!(batch.items.len(), 3);
  for item in &batch.items {
    assert_eq!(item.meta.get("queryName").and_then(MetaValue::as_str), Some("scripture-bom"));
  }
}

#[tokio::test]
async fn detail_with_bridging_reports_comment_count_after_reply() {
  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(FixtureAdapter::new("reddit", Tier::Wire, 1)));

  let protocol = InMemorySocialProtocol::new();
  let engine = boonscroll::Engine::new(StaticConfigSource::new(tiered_raw_config()), registry, protocol);

  let sections = engine.get_detail("reddit:0", &MetaMap::new()).await.unwrap();
  assert!(sections.iter().any(|s| matches!(s, boonscroll::model::DetailSection::Body { .. })));

  let item = boonscroll::model::FeedItem {
    id: "reddit:0".to_string(),
    source: "reddit".to_string(),
    tier: Tier::Wire,
    title: "reddit item 0".to_string(),
    body: Some("body text".to_string()),
    image: None,
    link: Some("https://example.com/reddit/0".to_string()),
    timestamp: chrono::Utc::now(),
    priority: 1,
    meta: MetaMap::new(),
    interaction: None,
    sections: None,
  };

  engine
    .bridge()
    .comment("alice", &item, "hello", Visibility::Public)
    .await
    .unwrap();

  let stats = engine.bridge().get_bridge_stats(&item).await.unwrap();
  assert!(stats.exists);
  assert_eq!(stats.comment_count, 1);
}

#[tokio::test]
async fn uniqueness_holds_across_a_scrolling_session() {
  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(FixtureAdapter::new("reddit", Tier::Wire, 40)));
  registry.register(Arc::new(FixtureAdapter::new("youtube", Tier::Library, 40)));
  registry.register(Arc::new(FixtureAdapter::new("journal", Tier::Scrapbook, 40)));
  registry.register(Arc::new(FixtureAdapter::new("entropy", Tier::Compass, 40)));

  let engine = boonscroll::Engine::new(
    StaticConfigSource::new(tiered_raw_config()),
    registry,
    InMemorySocialProtocol::new(),
  );

  let mut cursor = None;
  let mut seen = std::collections::HashSet::new();

  for _ in 0..5 {
    let opts = GetNextBatchOpts {
      cursor: cursor.clone(),
      ..Default::default()
    };
    let batch = engine.get_next_batch("alice", opts).await.unwrap();
    for item in &batch.items {
      assert!(seen.insert(item.id.clone()), "duplicate id {} across batches", item.id);
    }
    cursor = Some(batch.cursor);
  }
}
