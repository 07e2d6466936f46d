//! Wire models for the Spotify Web API endpoints the stats pipeline reads.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of items requested per top-list page.
///
/// Feature averages are divided by this fixed size, not by the number of
/// records actually returned (part of the numeric contract).
pub const PAGE_SIZE: usize = 50;

/// Lookback window for the top-artists and top-tracks endpoints.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TimeRange {
    #[default]
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    /// The wire string used in endpoint URLs and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a ranked listing, ordered most-to-least relevant.
#[derive(Debug, Clone, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopArtist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub explicit: bool,
    pub album: AlbumRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumRef {
    /// `YYYY-MM-DD`, or a bare `YYYY` for old releases.
    pub release_date: Option<String>,
}

/// Batched audio-features response.
///
/// The API returns `null` in place of a record for IDs it does not recognize,
/// hence the inner `Option`.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioFeaturesPage {
    pub audio_features: Vec<Option<TrackFeatures>>,
}

/// The nine numeric descriptors returned per track.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackFeatures {
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
