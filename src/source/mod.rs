//! Source adapters: the one extension point in the engine.
//!
//! # Module structure
//!
//! - `adapter`: the `SourceAdapter` trait.
//! - `types`: `FetchQuery`/`FetchPage`/`IdPrefix`, the small vocabulary
//!   adapters and the registry share.
//! - `registry`: `SourceRegistry`, the startup-constructed, shared-across-
//!   users adapter directory.
//! - `adapters`: concrete implementations.

pub mod adapter;
pub mod adapters;
pub mod registry;
pub mod types;

pub use adapter::SourceAdapter;
pub use registry::SourceRegistry;
pub use types::{FetchPage, FetchQuery, IdPrefix, PageToken};
