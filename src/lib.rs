//! Listening statistics aggregation for Spotify top-played history.
//!
//! Fetches a user's top artists and tracks, derives genre rankings, a
//! release-year histogram and an averaged audio-feature profile, and caches
//! the result in a local sqlite database keyed by time range.

pub mod aggregate;
pub mod config;
pub mod pipeline;
pub mod spotify;
pub mod sqlite_persistence;
pub mod stats_store;

pub use pipeline::{PageCacheRegistry, StatsPipeline, StatsView};
pub use spotify::{ApiClient, SpotifyClient, TimeRange};
pub use stats_store::{SqliteStatsStore, StatsStore};
