//! `TierAssemblyService`: wire decay and tiered batch assembly.

use std::collections::HashMap;

use crate::config::ScrollConfig;
use crate::model::{FeedItem, Tier};

/// Per-tier slot counts for one batch, after decay and redistribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierAllocation {
  pub slots: HashMap<Tier, u32>,
}

impl TierAllocation {
  pub fn slots_for(&self, tier: Tier) -> u32 {
    self.slots.get(&tier).copied().unwrap_or(0)
  }
}

/// Computes effective per-tier slot counts and assembles one batch from a
/// candidate pool.
pub struct TierAssemblyService;

impl TierAssemblyService {
  /// `decayFactor = clamp(1 - (batchNumber - 1) / wireDecayBatches, 0, 1)`;
  /// `wireEff = floor(wire.allocation * decayFactor)`. Slots freed from wire
  /// decay are redistributed to the other three tiers by largest remainder,
  /// in proportion to their own configured allocations, in canonical tier
  /// order (library, scrapbook, compass) on ties.
  pub fn compute_allocation(config: &ScrollConfig, batch_number: u32) -> TierAllocation {
    let wire_config = config.tiers.get(&Tier::Wire);
    let wire_allocation = wire_config.map(|t| t.allocation).unwrap_or(0);

    let decay_factor = if config.wire_decay_batches == 0 {
      1.0
    } else {
      let raw = 1.0 - (batch_number.saturating_sub(1)) as f64 / config.wire_decay_batches as f64;
      raw.clamp(0.0, 1.0)
    };

    let wire_eff = (wire_allocation as f64 * decay_factor).floor() as u32;
    let freed = wire_allocation.saturating_sub(wire_eff);

    let non_wire_tiers = [Tier::Library, Tier::Scrapbook, Tier::Compass];
    let base_allocations: HashMap<Tier, u32> = non_wire_tiers
      .iter()
      .map(|t| (*t, config.tiers.get(t).map(|c| c.allocation).unwrap_or(0)))
      .collect();

    let total_base: u32 = base_allocations.values().sum();
    let redistributed = redistribute(freed, &non_wire_tiers, &base_allocations, total_base);

    let mut slots = HashMap::new();
    slots.insert(Tier::Wire, wire_eff);
    for tier in non_wire_tiers {
      let bonus = redistributed.get(&tier).copied().unwrap_or(0);
      slots.insert(tier, base_allocations[&tier] + bonus);
    }

    TierAllocation { slots }
  }

  /// Selects eligible items per tier (matching tier, source enabled for
  /// that tier, sorted by `FeedItem::selection_key()`, truncated to that
  /// tier's slot count) then interleaves them deterministically in wire,
  /// library, scrapbook, compass order.
  ///
  /// An empty `enabledSources` list for a tier is treated as "no
  /// restriction" (every source eligible) rather than "nothing eligible" —
  /// the natural reading for a freshly merged default config that hasn't
  /// had its tiers' source lists configured yet.
  pub fn assemble_batch(pool: &[FeedItem], allocation: &TierAllocation, config: &ScrollConfig) -> Vec<FeedItem> {
    let mut by_tier: HashMap<Tier, Vec<&FeedItem>> = HashMap::new();
    for item in pool {
      by_tier.entry(item.tier).or_default().push(item);
    }

    let mut selected: HashMap<Tier, Vec<FeedItem>> = HashMap::new();
    for tier in Tier::ALL {
      let enabled_sources = config.tiers.get(&tier).map(|t| t.enabled_sources.as_slice()).unwrap_or(&[]);
      let mut items: Vec<&FeedItem> = by_tier
        .remove(&tier)
        .unwrap_or_default()
        .into_iter()
        .filter(|item| enabled_sources.is_empty() || enabled_sources.iter().any(|s| s == &item.source))
        .collect();
      items.sort_by(|a, b| a.selection_key().cmp(&b.selection_key()));
      let slots = allocation.slots_for(tier) as usize;
      selected.insert(tier, items.into_iter().take(slots).cloned().collect());
    }

    interleave(&selected)
  }
}

/// Largest-remainder apportionment of `freed` slots across `tiers`,
/// weighted by each tier's base allocation. Falls back to an even split
/// across all listed tiers if every base allocation is zero.
fn redistribute(
  freed: u32,
  tiers: &[Tier],
  base_allocations: &HashMap<Tier, u32>,
  total_base: u32,
) -> HashMap<Tier, u32> {
  let mut result: HashMap<Tier, u32> = tiers.iter().map(|t| (*t, 0)).collect();
  if freed == 0 || tiers.is_empty() {
    return result;
  }

  if total_base == 0 {
    let share = freed / tiers.len() as u32;
    let mut remainder = freed % tiers.len() as u32;
    for tier in tiers {
      let mut amount = share;
      if remainder > 0 {
        amount += 1;
        remainder -= 1;
      }
      result.insert(*tier, amount);
    }
    return result;
  }

  let mut exact: Vec<(Tier, f64)> = tiers
    .iter()
    .map(|t| {
      let base = base_allocations.get(t).copied().unwrap_or(0) as f64;
      (*t, freed as f64 * base / total_base as f64)
    })
    .collect();

  let mut allocated_total = 0u32;
  for (tier, value) in &exact {
    let floor = value.floor() as u32;
    result.insert(*tier, floor);
    allocated_total += floor;
  }

  let mut remaining = freed.saturating_sub(allocated_total);
  exact.sort_by(|a, b| {
    let rem_a = a.1 - a.1.floor();
    let rem_b = b.1 - b.1.floor();
    rem_b.partial_cmp(&rem_a).unwrap_or(std::cmp::Ordering::Equal)
  });

  for (tier, _) in exact {
    if remaining == 0 {
      break;
    }
    *result.entry(tier).or_insert(0) += 1;
    remaining -= 1;
  }

  result
}

fn interleave(selected: &HashMap<Tier, Vec<FeedItem>>) -> Vec<FeedItem> {
  let mut cursors: HashMap<Tier, usize> = Tier::ALL.iter().map(|t| (*t, 0)).collect();
  let mut out = Vec::new();

  loop {
    let mut advanced = false;
    for tier in Tier::ALL {
      let items = match selected.get(&tier) {
        Some(items) => items,
        None => continue,
      };
      let cursor = cursors.get_mut(&tier).unwrap();
      if *cursor < items.len() {
        out.push(items[*cursor].clone());
        *cursor += 1;
        advanced = true;
      }
    }
    if !advanced {
      break;
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn item(tier: Tier, id: &str, priority: i64) -> FeedItem {
    let source = id.split_once(':').map(|(s, _)| s.to_string()).unwrap_or_else(|| "x".to_string());
    FeedItem {
      id: id.to_string(),
      source,
      tier,
      title: id.to_string(),
      body: None,
      image: None,
      link: None,
      timestamp: Utc::now(),
      priority,
      meta: Default::default(),
      interaction: None,
      sections: None,
    }
  }

  #[test]
  fn decay_reaches_zero_at_horizon() {
    let config = ScrollConfig::default_config();
    let allocation = TierAssemblyService::compute_allocation(&config, config.wire_decay_batches + 1);
    assert_eq!(allocation.slots_for(Tier::Wire), 0);
  }

  #[test]
  fn decay_is_full_on_first_batch() {
    let config = ScrollConfig::default_config();
    let allocation = TierAssemblyService::compute_allocation(&config, 1);
    assert_eq!(allocation.slots_for(Tier::Wire), 4);
  }

  #[test]
  fn freed_wire_slots_are_conserved_across_tiers() {
    let config = ScrollConfig::default_config();
    let total_base: u32 = [Tier::Library, Tier::Scrapbook, Tier::Compass]
      .iter()
      .map(|t| config.tiers[t].allocation)
      .sum();

    for batch_number in 1..=config.wire_decay_batches + 2 {
      let allocation = TierAssemblyService::compute_allocation(&config, batch_number);
      let wire_slots = allocation.slots_for(Tier::Wire);
      let wire_base = config.tiers[&Tier::Wire].allocation;
      let freed = wire_base - wire_slots;

      let redistributed_total: u32 = [Tier::Library, Tier::Scrapbook, Tier::Compass]
        .iter()
        .map(|t| allocation.slots_for(*t))
        .sum::<u32>()
        - total_base;

      assert_eq!(freed, redistributed_total);
    }
  }

  #[test]
  fn decayed_batch_redistributes_freed_wire_slots_by_largest_remainder() {
    let config = ScrollConfig::default_config();
    let allocation = TierAssemblyService::compute_allocation(&config, config.wire_decay_batches + 1);

    let mut expected_slots = HashMap::new();
    expected_slots.insert(Tier::Wire, 0);
    expected_slots.insert(Tier::Library, 5);
    expected_slots.insert(Tier::Scrapbook, 3);
    expected_slots.insert(Tier::Compass, 2);

    pretty_assertions::assert_eq!(allocation, TierAllocation { slots: expected_slots });
  }

  #[test]
  fn assemble_batch_respects_per_tier_slots_and_priority_order() {
    let mut slots = HashMap::new();
    slots.insert(Tier::Wire, 1);
    slots.insert(Tier::Library, 1);
    slots.insert(Tier::Scrapbook, 0);
    slots.insert(Tier::Compass, 0);
    let allocation = TierAllocation { slots };

    let pool = vec![
      item(Tier::Wire, "w1", 1),
      item(Tier::Wire, "w2", 10),
      item(Tier::Library, "l1", 5),
    ];

    let batch = TierAssemblyService::assemble_batch(&pool, &allocation, &ScrollConfig::default_config());
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].id, "w2");
    assert_eq!(batch[1].id, "l1");
  }

  #[test]
  fn assemble_batch_excludes_items_whose_source_is_not_enabled_for_their_tier() {
    let mut slots = HashMap::new();
    slots.insert(Tier::Wire, 2);
    slots.insert(Tier::Library, 0);
    slots.insert(Tier::Scrapbook, 0);
    slots.insert(Tier::Compass, 0);
    let allocation = TierAllocation { slots };

    let mut config = ScrollConfig::default_config();
    config.tiers.get_mut(&Tier::Wire).unwrap().enabled_sources = vec!["reddit".to_string()];

    let pool = vec![
      item(Tier::Wire, "reddit:1", 1),
      item(Tier::Wire, "mastodon:1", 10),
    ];

    let batch = TierAssemblyService::assemble_batch(&pool, &allocation, &config);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, "reddit:1");
  }

  #[test]
  fn interleave_order_is_wire_library_scrapbook_compass() {
    let mut slots = HashMap::new();
    slots.insert(Tier::Wire, 1);
    slots.insert(Tier::Library, 1);
    slots.insert(Tier::Scrapbook, 1);
    slots.insert(Tier::Compass, 1);
    let allocation = TierAllocation { slots };

    let pool = vec![
      item(Tier::Compass, "c1", 1),
      item(Tier::Scrapbook, "s1", 1),
      item(Tier::Library, "l1", 1),
      item(Tier::Wire, "w1", 1),
    ];

    let batch = TierAssemblyService::assemble_batch(&pool, &allocation, &ScrollConfig::default_config());
    assert_eq!(
      batch.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(),
      vec!["w1", "l1", "s1", "c1"]
    );
  }
}
