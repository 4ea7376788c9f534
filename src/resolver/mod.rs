//! Id and filter resolution.

pub mod content_id;
pub mod filter;

pub use content_id::{ContentIdResolver, FallbackPattern, Resolved};
pub use filter::{FeedFilterResolver, ResolvedFilter};
