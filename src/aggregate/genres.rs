//! Weighted genre aggregation over a ranked artist page.

use super::models::GenreTally;
use crate::spotify::TopArtist;

/// Weight carried by the artist at `index` of the ranked page: the distance
/// from the page size, so index 0 weighs `page_size` and the last slot of a
/// full page weighs 1.
fn rank_weight(index: usize, page_size: usize) -> u64 {
    (index as i64 - page_size as i64).unsigned_abs()
}

/// Fold a ranked artist page into a weighted genre tally.
///
/// Weights derive from each artist's position in the original ranked list;
/// an artist with no genres contributes nothing. Pure and idempotent.
pub fn aggregate_genres(artists: &[TopArtist], page_size: usize) -> GenreTally {
    let mut tally = GenreTally::new();
    for (index, artist) in artists.iter().enumerate() {
        let weight = rank_weight(index, page_size);
        for genre in &artist.genres {
            tally.bump(genre, weight);
        }
    }
    tally
}
