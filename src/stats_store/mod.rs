//! Persistent cache tier for aggregated statistics.

mod schema;
mod sqlite_stats_store;

pub use sqlite_stats_store::SqliteStatsStore;

use crate::spotify::TimeRange;
use anyhow::Result;

/// Key under which the serialized aggregation result for a time range is
/// cached.
pub fn cache_key(range: TimeRange) -> String {
    format!("stats:top-genres:{}", range.as_str())
}

/// Durable key-value storage for serialized aggregation results.
///
/// Entries are created or overwritten on every successful fetch cycle and
/// never deleted by the pipeline.
pub trait StatsStore: Send + Sync {
    /// Returns the cached value for `key`, or None when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
