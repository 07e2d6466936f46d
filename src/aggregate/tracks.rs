//! Single-pass aggregation over a ranked track page.

use super::models::YearHistogram;
use crate::spotify::TopTrack;

/// Counters and histogram produced by one pass over the ranked tracks.
#[derive(Debug, Clone, Default)]
pub struct TrackStats {
    pub popularity_sum: u64,
    pub explicit_count: u64,
    pub years: YearHistogram,
    /// IDs in ranked order, input to the follow-up audio-features fetch.
    /// Not part of the final result.
    pub track_ids: Vec<String>,
}

/// Sum popularity, count explicit tracks, histogram release years and collect
/// track IDs in ranked order.
pub fn aggregate_tracks(tracks: &[TopTrack]) -> TrackStats {
    let mut stats = TrackStats::default();
    for track in tracks {
        stats.popularity_sum += u64::from(track.popularity);
        if track.explicit {
            stats.explicit_count += 1;
        }
        if let Some(release_date) = &track.album.release_date {
            // Leading 4-character year of `YYYY-MM-DD` or bare `YYYY`.
            if let Some(year) = release_date.get(..4) {
                stats.years.bump(year, 1);
            }
        }
        stats.track_ids.push(track.id.clone());
    }
    stats
}
