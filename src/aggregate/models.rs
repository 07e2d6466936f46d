//! Data models for aggregated listening statistics.

use serde::{Deserialize, Serialize};

/// Insertion-ordered key/count pairs.
///
/// Keys are unique, first-seen order is preserved, and counts only grow while
/// an aggregation pass runs. Serializes as an array of `[key, count]` pairs,
/// the shape stored in the persistent cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedTally(Vec<(String, u64)>);

impl OrderedTally {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add `amount` to `key`, appending a new entry on first sight.
    pub fn bump(&mut self, key: &str, amount: u64) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => *count += amount,
            None => self.0.push((key.to_string(), amount)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, u64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Weighted genre frequency, most-relevant-first insertion order.
pub type GenreTally = OrderedTally;

/// Release-year counts keyed by 4-digit year string.
pub type YearHistogram = OrderedTally;

/// Per-track averages over one fetched page.
///
/// popularity and explicitness start out as running sums from the track pass;
/// the nine audio fields are filled in by the feature reduction. All eleven
/// are divided by the fixed page size at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub popularity: f64,
    pub explicitness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub tempo: f64,
    pub loudness: f64,
}

impl FeatureSummary {
    /// Divide every field by the configured page size to get per-track
    /// averages. The divisor is the page size even when fewer tracks were
    /// returned.
    pub(crate) fn divide_by(&mut self, page_size: usize) {
        let divisor = page_size as f64;
        self.popularity /= divisor;
        self.explicitness /= divisor;
        self.danceability /= divisor;
        self.energy /= divisor;
        self.valence /= divisor;
        self.speechiness /= divisor;
        self.acousticness /= divisor;
        self.instrumentalness /= divisor;
        self.liveness /= divisor;
        self.tempo /= divisor;
        self.loudness /= divisor;
    }
}

/// The unit handed to presentation and persisted to the cache. Constructed
/// fresh per fetch cycle, immutable once returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub genres: GenreTally,
    pub features: FeatureSummary,
    pub years: YearHistogram,
}
