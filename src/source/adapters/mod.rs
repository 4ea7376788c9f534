//! Concrete `SourceAdapter` implementations.
//!
//! Each adapter is intentionally thin: it demonstrates the normalization
//! contract and plugs into the registry rather than reimplementing a full
//! client for its upstream API (those wire protocols are out of scope).

mod http_util;

pub mod entropy;
pub mod freshrss;
pub mod habits;
pub mod hackernews;
pub mod headlines;
pub mod immich;
pub mod journal;
pub mod local_photos;
pub mod mastodon;
pub mod podcast;
pub mod reddit;
pub mod scripture;
pub mod tasks;
pub mod youtube;

pub use entropy::EntropyAdapter;
pub use freshrss::FreshRssAdapter;
pub use habits::HabitsAdapter;
pub use hackernews::HackerNewsAdapter;
pub use headlines::HeadlinesAdapter;
pub use immich::ImmichAdapter;
pub use journal::JournalAdapter;
pub use local_photos::LocalPhotosAdapter;
pub use mastodon::MastodonAdapter;
pub use podcast::PodcastAdapter;
pub use reddit::RedditAdapter;
pub use scripture::ScriptureAdapter;
pub use tasks::TasksAdapter;
pub use youtube::YoutubeAdapter;
