//! `ContentIdResolver`: compound id → owning adapter + local id.

use regex::Regex;

use crate::source::SourceRegistry;

/// An ordered `{regex, sourceType}` pair consulted when a bare id (no
/// `:`) doesn't match any adapter prefix.
pub struct FallbackPattern {
  pub regex: Regex,
  pub source_type: String,
}

/// Result of resolving a compound id.
pub struct Resolved {
  pub source_type: String,
  pub local_id: String,
}

/// Parses compound ids (`"{source}:{localId}"`) into `(adapter, localId)`
/// pairs, applying prefix aliases and fallback patterns for bare ids.
pub struct ContentIdResolver {
  fallback_patterns: Vec<FallbackPattern>,
  default_source: Option<String>,
}

impl ContentIdResolver {
  pub fn new(fallback_patterns: Vec<FallbackPattern>, default_source: Option<String>) -> Self {
    Self {
      fallback_patterns,
      default_source,
    }
  }

  /// `Resolve(compoundId)` per the four-step procedure: no-colon ids go
  /// through fallback patterns then the default source; ids with a colon
  /// are split on the first one and the prefix looked up in `registry`.
  pub fn resolve(&self, registry: &SourceRegistry, compound_id: &str) -> Option<Resolved> {
    let Some((prefix, rest)) = compound_id.split_once(':') else {
      return self.resolve_bare(compound_id);
    };

    for (source_type, adapter) in registry.iter() {
      if source_type == prefix {
        return Some(Resolved {
          source_type: source_type.to_string(),
          local_id: rest.to_string(),
        });
      }
      for declared in adapter.prefixes() {
        if declared.prefix == prefix {
          return Some(Resolved {
            source_type: source_type.to_string(),
            local_id: declared.apply(rest),
          });
        }
      }
    }
    None
  }

  fn resolve_bare(&self, compound_id: &str) -> Option<Resolved> {
    for pattern in &self.fallback_patterns {
      if pattern.regex.is_match(compound_id) {
        return Some(Resolved {
          source_type: pattern.source_type.clone(),
          local_id: compound_id.to_string(),
        });
      }
    }

    self.default_source.as_ref().map(|source_type| Resolved {
      source_type: source_type.clone(),
      local_id: compound_id.to_string(),
    })
  }
}
