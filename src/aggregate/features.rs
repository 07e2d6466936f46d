//! Reduction of per-track audio-feature records into page-wide averages.

use super::models::FeatureSummary;
use super::tracks::TrackStats;
use crate::spotify::TrackFeatures;

/// Reduce feature records into a single averaged summary.
///
/// The accumulator is pre-seeded with the popularity/explicitness sums from
/// the track pass; every returned record adds its nine audio fields. `null`
/// records (unknown IDs) contribute nothing. All eleven fields are then
/// divided by the fixed page size, never by the number of records that
/// actually came back.
pub fn reduce_features(
    stats: &TrackStats,
    records: &[Option<TrackFeatures>],
    page_size: usize,
) -> FeatureSummary {
    let mut summary = FeatureSummary {
        popularity: stats.popularity_sum as f64,
        explicitness: stats.explicit_count as f64,
        ..Default::default()
    };

    for record in records.iter().flatten() {
        summary.danceability += record.danceability;
        summary.energy += record.energy;
        summary.valence += record.valence;
        summary.speechiness += record.speechiness;
        summary.acousticness += record.acousticness;
        summary.instrumentalness += record.instrumentalness;
        summary.liveness += record.liveness;
        summary.tempo += record.tempo;
        summary.loudness += record.loudness;
    }

    summary.divide_by(page_size);
    summary
}
