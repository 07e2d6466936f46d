//! SQLite schema for the stats cache database.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

/// Cached aggregation results, one row per `(statistic-kind, time-range)` key.
const STATS_CACHE_TABLE_V1: Table = Table {
    name: "stats_cache",
    columns: &[
        sqlite_column!("key", SqlType::Text, is_primary_key = true),
        sqlite_column!("value", SqlType::Text, non_null = true),
        sqlite_column!(
            "updated_at",
            SqlType::Text,
            non_null = true,
            default_value = Some("(datetime('now'))")
        ),
    ],
    indices: &[],
};

pub const STATS_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[STATS_CACHE_TABLE_V1],
    migration: None,
}];
