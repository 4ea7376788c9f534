//! Property tests for the invariants that must hold for any batch number
//! and any sequence of scroll requests, not just the handful of scenarios
//! exercised elsewhere.

mod common;

use std::sync::Arc;

use boonscroll::config::ScrollConfig;
use boonscroll::model::Tier;
use boonscroll::tier::TierAssemblyService;
use proptest::prelude::*;

proptest! {
  /// Decay monotonicity: wireEff(B+1) <= wireEff(B) for B in [1, wireDecayBatches],
  /// and wireEff(B) == 0 once B exceeds the decay horizon.
  #[test]
  fn decay_is_monotone_and_bottoms_out_at_zero(batch_number in 1u32..40) {
    let config = ScrollConfig::default_config();
    let this = TierAssemblyService::compute_allocation(&config, batch_number);
    let next = TierAssemblyService::compute_allocation(&config, batch_number + 1);

    prop_assert!(next.slots_for(Tier::Wire) <= this.slots_for(Tier::Wire));

    if batch_number >= config.wire_decay_batches + 1 {
      prop_assert_eq!(this.slots_for(Tier::Wire), 0);
    }
  }

  /// Allocation conservation: the total slots handed out never exceed the
  /// sum of configured allocations, and freed wire slots are fully
  /// redistributed rather than lost.
  #[test]
  fn allocation_is_conserved(batch_number in 1u32..40) {
    let config = ScrollConfig::default_config();
    let allocation = TierAssemblyService::compute_allocation(&config, batch_number);

    let total_configured: u32 = config.tiers.values().map(|t| t.allocation).sum();
    let total_effective: u32 = Tier::ALL.iter().map(|t| allocation.slots_for(*t)).sum();

    prop_assert_eq!(total_effective, total_configured);
  }
}

#[tokio::test]
async fn ownership_holds_for_every_item_every_adapter_produces() {
  use boonscroll::config::{RawScrollConfig, StaticConfigSource, TierConfig};
  use boonscroll::source::SourceRegistry;
  use common::FixtureAdapter;

  let mut registry = SourceRegistry::new();
  registry.register(Arc::new(FixtureAdapter::new("reddit", Tier::Wire, 5)));
  registry.register(Arc::new(FixtureAdapter::new("youtube", Tier::Library, 5)));

  let mut tiers = std::collections::HashMap::new();
  tiers.insert(
    Tier::Wire,
    TierConfig {
      allocation: 4,
      enabled_sources: vec!["reddit".to_string()],
      color: "#fff".to_string(),
    },
  );
  tiers.insert(
    Tier::Library,
    TierConfig {
      allocation: 3,
      enabled_sources: vec!["youtube".to_string()],
      color: "#fff".to_string(),
    },
  );

  let raw = RawScrollConfig {
    tiers,
    ..Default::default()
  };

  let engine = boonscroll::Engine::new(
    StaticConfigSource::new(raw),
    registry,
    boonscroll::bridge::InMemorySocialProtocol::new(),
  );

  let batch = engine
    .get_next_batch("alice", boonscroll::assembly::GetNextBatchOpts::default())
    .await
    .unwrap();

  // every item's id carries its own source as the compound-id prefix,
  // which is the normalization contract the registry enforces on every
  // adapter at registration time.
  assert!(!batch.items.is_empty());
  for item in &batch.items {
    assert!(item.id.starts_with(&format!("{}:", item.source)));
  }
}
