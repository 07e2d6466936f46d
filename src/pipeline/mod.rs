//! Fetch-cycle orchestration.
//!
//! A cycle for a time range runs: persistent-cache read (unless forced) →
//! concurrent artist and track fetches → genre/track aggregation → batched
//! audio-features fetch for the validated IDs → feature reduction →
//! unconditional cache write → generation-guarded publication of the
//! consumer-visible view.

mod page_cache;

pub use page_cache::{PageCacheRegistry, RefreshFn};

use crate::aggregate::{
    aggregate_genres, aggregate_tracks, reduce_features, AggregationResult,
};
use crate::spotify::{
    audio_features_url, filter_valid_track_ids, top_artists_url, top_tracks_url, ApiClient,
    ApiError, AudioFeaturesPage, Paged, TimeRange, TopArtist, TopTrack, AUDIO_FEATURES,
    PAGE_SIZE, TOP_ARTISTS, TOP_TRACKS,
};
use crate::stats_store::{cache_key, StatsStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsView {
    /// Nothing to render: the initial state, or a valid fetch that found no
    /// listening history.
    Empty,
    /// Aggregated statistics ready to render.
    Ready(Arc<AggregationResult>),
    /// The last cycle failed; render the error state.
    Failed,
}

/// Terminal failure of a single fetch cycle. Never crashes the pipeline or
/// touches the cache; the last successful value stays available.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("malformed {0} payload: {1}")]
    Decode(&'static str, serde_json::Error),
}

pub struct StatsPipeline {
    client: Arc<dyn ApiClient>,
    store: Arc<dyn StatsStore>,
    api_base_url: String,
    page_size: usize,
    generation: AtomicU64,
    view: Mutex<StatsView>,
}

impl StatsPipeline {
    pub fn new(client: Arc<dyn ApiClient>, store: Arc<dyn StatsStore>, api_base_url: &str) -> Self {
        Self {
            client,
            store,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            page_size: PAGE_SIZE,
            generation: AtomicU64::new(0),
            view: Mutex::new(StatsView::Empty),
        }
    }

    /// The currently visible view.
    pub fn view(&self) -> StatsView {
        self.view.lock().unwrap().clone()
    }

    /// Run one fetch cycle for `range` and return its view.
    ///
    /// Unless `force` is set, a persistent-cache hit short-circuits the cycle
    /// with zero network calls. A successful cycle always rewrites the cache
    /// entry, stale cycles included; only the visible view is guarded so a
    /// stale cycle cannot overwrite the latest selection's state.
    pub async fn refresh(&self, range: TimeRange, force: bool) -> StatsView {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if !force {
            match self.read_cache(range) {
                Ok(Some(result)) => {
                    debug!("Cache hit for {}", cache_key(range));
                    let view = Self::view_of(result);
                    self.publish(generation, &view);
                    return view;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to read stats cache for {}: {:#}", range, e),
            }
        }

        let started = Instant::now();
        match self.run_cycle(range).await {
            Ok(result) => {
                info!(
                    "Aggregated {} stats in {}ms",
                    range,
                    started.elapsed().as_millis()
                );
                self.write_cache(range, &result);
                let view = Self::view_of(result);
                self.publish(generation, &view);
                view
            }
            Err(e) => {
                warn!("Stats fetch cycle for {} failed: {}", range, e);
                let view = StatsView::Failed;
                self.publish(generation, &view);
                view
            }
        }
    }

    async fn run_cycle(&self, range: TimeRange) -> Result<AggregationResult, CycleError> {
        let artists_url = top_artists_url(&self.api_base_url, range);
        let tracks_url = top_tracks_url(&self.api_base_url, range);

        // All-or-nothing join: either failure fails the cycle.
        let (artists_json, tracks_json) = tokio::try_join!(
            self.client.request(TOP_ARTISTS, &artists_url),
            self.client.request(TOP_TRACKS, &tracks_url),
        )?;

        let artists: Paged<TopArtist> = serde_json::from_value(artists_json)
            .map_err(|e| CycleError::Decode(TOP_ARTISTS, e))?;
        let tracks: Paged<TopTrack> = serde_json::from_value(tracks_json)
            .map_err(|e| CycleError::Decode(TOP_TRACKS, e))?;

        let genres = aggregate_genres(&artists.items, self.page_size);
        let track_stats = aggregate_tracks(&tracks.items);

        let ids = filter_valid_track_ids(&track_stats.track_ids);
        let records = if ids.is_empty() {
            // Nothing valid to look up; skip the batched request entirely.
            Vec::new()
        } else {
            let features_url = audio_features_url(&self.api_base_url, &ids);
            let features_json = self.client.request(AUDIO_FEATURES, &features_url).await?;
            let page: AudioFeaturesPage = serde_json::from_value(features_json)
                .map_err(|e| CycleError::Decode(AUDIO_FEATURES, e))?;
            page.audio_features
        };

        let features = reduce_features(&track_stats, &records, self.page_size);

        Ok(AggregationResult {
            genres,
            features,
            years: track_stats.years,
        })
    }

    fn view_of(result: AggregationResult) -> StatsView {
        if result.genres.is_empty() {
            StatsView::Empty
        } else {
            StatsView::Ready(Arc::new(result))
        }
    }

    /// Apply a cycle's outcome to the visible state only if no newer cycle
    /// has started since.
    fn publish(&self, generation: u64, view: &StatsView) {
        if self.generation.load(Ordering::SeqCst) == generation {
            *self.view.lock().unwrap() = view.clone();
        }
    }

    fn read_cache(&self, range: TimeRange) -> anyhow::Result<Option<AggregationResult>> {
        let key = cache_key(range);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                warn!("Discarding malformed cache entry for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    fn write_cache(&self, range: TimeRange, result: &AggregationResult) {
        let key = cache_key(range);
        match serde_json::to_string(result) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key, &raw) {
                    warn!("Failed to write stats cache for {}: {:#}", key, e);
                }
            }
            Err(e) => warn!("Failed to serialize stats for {}: {}", key, e),
        }
    }
}
