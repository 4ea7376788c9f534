//! Crate-wide error taxonomy.
//!
//! Mirrors the error kinds in the design doc's disposition table: adapter
//! failures degrade gracefully and never propagate as an `Err` out of a
//! batch assembly (see [`crate::pool`]); the variants below are for cases
//! that do need to surface to a caller, plus the usual I/O/HTTP/serialization
//! boundary errors.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
  /// An adapter's `Fetch`/`GetItem`/`GetDetail` call failed (I/O, timeout, upstream 5xx).
  #[error("fetch failed for source {source}: {message}")]
  FetchFailed { source: String, message: String },

  /// A source is not configured, or has failed persistently enough to be
  /// marked degraded for the session.
  #[error("source unavailable: {0}")]
  FetchUnavailable(String),

  /// `ContentIdResolver::resolve` returned `None`, or the compound id was malformed.
  #[error("invalid content id: {0}")]
  InvalidId(String),

  /// A valid id resolved to an adapter, but the adapter found nothing.
  #[error("not found: {0}")]
  NotFound(String),

  /// `FeedFilterResolver::resolve` returned `None` for a non-empty filter
  /// expression. Per design, this does not abort a request — callers fall
  /// through to the tier path — the variant exists for logging/diagnostics.
  #[error("invalid filter expression: {0}")]
  InvalidFilter(String),

  /// Scroll configuration failed validation (bad allocation, decay horizon, tier name).
  #[error("invalid scroll config: {0}")]
  ConfigError(String),

  /// The social-protocol collaborator failed to publish a bridge anchor or comment.
  #[error("bridge operation failed: {0}")]
  BridgeError(String),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("http request failed: {0}")]
  Reqwest(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid regex: {0}")]
  Regex(#[from] regex::Error),

  #[error("{0}")]
  Other(String),
}

impl Error {
  pub fn fetch_failed(source: impl Into<String>, message: impl std::fmt::Display) -> Self {
    Error::FetchFailed {
      source: source.into(),
      message: message.to_string(),
    }
  }
}
