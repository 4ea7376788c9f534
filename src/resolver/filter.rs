//! `FeedFilterResolver`: parses `?filter=` expressions via a 4-layer chain
//! (tier → source type → named query → alias), tier winning ties.

use std::collections::{HashMap, HashSet};

use crate::model::Tier;

/// A resolved filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedFilter {
  Tier(Tier),
  Source {
    source_type: String,
    subsources: Option<Vec<String>>,
  },
  Query(String),
}

/// Constructed once per request context with the set of registered source
/// types, named-query names, and the configured alias map.
pub struct FeedFilterResolver {
  source_types: HashSet<String>,
  query_names: HashSet<String>,
  aliases: HashMap<String, String>,
}

impl FeedFilterResolver {
  pub fn new(
    source_types: HashSet<String>,
    query_names: HashSet<String>,
    aliases: HashMap<String, String>,
  ) -> Self {
    Self {
      source_types,
      query_names,
      aliases,
    }
  }

  /// Rules, first match wins: empty → `None`; canonical tier name → tier;
  /// registered source type → source (with subsources split on the
  /// comma-separated tail); exact query name → query; alias target →
  /// whichever of the two the target resolves to; otherwise `None`.
  pub fn resolve(&self, expression: &str) -> Option<ResolvedFilter> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
      return None;
    }

    let prefix = trimmed.split_once(':').map(|(p, _)| p).unwrap_or(trimmed);
    let lower_prefix = prefix.to_lowercase();

    if let Some(tier) = Tier::parse(&lower_prefix) {
      return Some(ResolvedFilter::Tier(tier));
    }

    if self.source_types.contains(prefix) {
      return Some(ResolvedFilter::Source {
        source_type: prefix.to_string(),
        subsources: subsources_of(trimmed),
      });
    }

    if self.query_names.contains(trimmed) {
      // Exact match only — a query name never takes a `:subsources` tail.
      return Some(ResolvedFilter::Query(trimmed.to_string()));
    }

    if let Some(target) = self.aliases.get(prefix) {
      if self.source_types.contains(target) {
        return Some(ResolvedFilter::Source {
          source_type: target.clone(),
          subsources: subsources_of(trimmed),
        });
      }
      if self.query_names.contains(target) {
        return Some(ResolvedFilter::Query(target.clone()));
      }
    }

    None
  }
}

fn subsources_of(expression: &str) -> Option<Vec<String>> {
  let (_, tail) = expression.split_once(':')?;
  if tail.is_empty() {
    return None;
  }
  Some(tail.split(',').map(|s| s.trim().to_string()).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn resolver() -> FeedFilterResolver {
    FeedFilterResolver::new(
      ["reddit".to_string(), "youtube".to_string()].into_iter().collect(),
      ["scripture-bom".to_string()].into_iter().collect(),
      [("scripture".to_string(), "scripture-bom".to_string())].into_iter().collect(),
    )
  }

  #[test]
  fn empty_or_whitespace_resolves_to_none() {
    let r = resolver();
    assert_eq!(r.resolve(""), None);
    assert_eq!(r.resolve("   "), None);
  }

  #[test]
  fn canonical_tier_names_resolve_to_tier() {
    let r = resolver();
    for (name, tier) in [
      ("wire", Tier::Wire),
      ("library", Tier::Library),
      ("scrapbook", Tier::Scrapbook),
      ("compass", Tier::Compass),
    ] {
      assert_eq!(r.resolve(name), Some(ResolvedFilter::Tier(tier)));
    }
  }

  #[test]
  fn source_with_subsources() {
    let r = resolver();
    assert_eq!(
      r.resolve("reddit:worldnews,usnews"),
      Some(ResolvedFilter::Source {
        source_type: "reddit".to_string(),
        subsources: Some(vec!["worldnews".to_string(), "usnews".to_string()]),
      })
    );
  }

  #[test]
  fn alias_to_query_resolves_through() {
    let r = resolver();
    assert_eq!(r.resolve("scripture"), Some(ResolvedFilter::Query("scripture-bom".to_string())));
  }

  #[test]
  fn tier_beats_source_beats_query_beats_alias_at_equal_literal() {
    // a source type and a tier name collide on the literal "wire":
    // tier must win even if "wire" were also a registered source type.
    let r = FeedFilterResolver::new(
      ["wire".to_string()].into_iter().collect(),
      HashSet::new(),
      HashMap::new(),
    );
    assert_eq!(r.resolve("wire"), Some(ResolvedFilter::Tier(Tier::Wire)));
  }

  #[test]
  fn unmatched_prefix_resolves_to_none() {
    let r = resolver();
    assert_eq!(r.resolve("nonexistent"), None);
  }
}
