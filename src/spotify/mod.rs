//! Spotify Web API surface: wire models, the request client, and track ID
//! validation.

mod client;
mod ids;
mod models;

pub use client::{
    audio_features_url, top_artists_url, top_tracks_url, ApiClient, ApiError, SpotifyClient,
    AUDIO_FEATURES, TOP_ARTISTS, TOP_TRACKS,
};
pub use ids::filter_valid_track_ids;
pub use models::{
    AlbumRef, AudioFeaturesPage, Paged, TimeRange, TopArtist, TopTrack, TrackFeatures, PAGE_SIZE,
};
