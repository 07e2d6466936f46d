//! End-to-end tests for the stats pipeline.
//!
//! Drive full fetch cycles against a scripted API client and a real sqlite
//! stats store, and assert on the aggregated output, the cache behavior and
//! the failure handling.

use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tunestats::pipeline::{StatsPipeline, StatsView};
use tunestats::spotify::{ApiError, TimeRange, AUDIO_FEATURES, TOP_ARTISTS, TOP_TRACKS};
use tunestats::stats_store::{cache_key, StatsStore};
use tunestats::{ApiClient, SqliteStatsStore};

const API_BASE_URL: &str = "https://api.example.com/v1";

/// API client that serves scripted responses by request name and records
/// every call it receives.
#[derive(Default)]
struct FakeClient {
    responses: Mutex<HashMap<String, Value>>,
    fail_names: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeClient {
    fn respond(&self, name: &str, body: Value) {
        self.responses.lock().unwrap().insert(name.to_string(), body);
    }

    fn fail(&self, name: &str) {
        self.fail_names.lock().unwrap().insert(name.to_string());
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ApiClient for FakeClient {
    async fn request(&self, name: &str, url: &str) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), url.to_string()));

        if self.fail_names.lock().unwrap().contains(name) {
            return Err(ApiError {
                name: name.to_string(),
                message: "scripted failure".to_string(),
            });
        }

        self.responses
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError {
                name: name.to_string(),
                message: "no scripted response".to_string(),
            })
    }
}

struct TestHarness {
    _temp_dir: TempDir,
    client: Arc<FakeClient>,
    store: Arc<SqliteStatsStore>,
    pipeline: StatsPipeline,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStatsStore::new(temp_dir.path().join("stats.db")).unwrap());
        let client = Arc::new(FakeClient::default());
        let pipeline = StatsPipeline::new(client.clone(), store.clone(), API_BASE_URL);
        Self {
            _temp_dir: temp_dir,
            client,
            store,
            pipeline,
        }
    }

    /// Reuse the harness database with a fresh client and pipeline, as a new
    /// process would after a restart.
    fn reopened(&self) -> (Arc<FakeClient>, StatsPipeline) {
        let client = Arc::new(FakeClient::default());
        let pipeline = StatsPipeline::new(client.clone(), self.store.clone(), API_BASE_URL);
        (client, pipeline)
    }

    fn cached_json(&self, range: TimeRange) -> Option<Value> {
        self.store
            .get(&cache_key(range))
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }
}

fn track_id(c: char) -> String {
    c.to_string().repeat(22)
}

fn artists_page() -> Value {
    json!({
        "items": [
            { "id": "artist-1", "name": "First", "genres": ["pop", "rock"] },
            { "id": "artist-2", "name": "Second", "genres": ["pop"] }
        ]
    })
}

fn tracks_page() -> Value {
    json!({
        "items": [
            {
                "id": track_id('a'),
                "name": "Track A",
                "popularity": 100,
                "explicit": true,
                "album": { "release_date": "2019-03-01" }
            },
            {
                "id": track_id('b'),
                "name": "Track B",
                "popularity": 80,
                "explicit": true,
                "album": { "release_date": "2019-11-20" }
            }
        ]
    })
}

fn feature_record(tempo: f64) -> Value {
    json!({
        "danceability": 0.5, "energy": 0.5, "valence": 0.5,
        "speechiness": 0.1, "acousticness": 0.1,
        "instrumentalness": 0.0, "liveness": 0.1,
        "tempo": tempo, "loudness": -6.0
    })
}

fn features_page() -> Value {
    json!({ "audio_features": [feature_record(100.0), feature_record(120.0)] })
}

fn script_happy_path(client: &FakeClient) {
    client.respond(TOP_ARTISTS, artists_page());
    client.respond(TOP_TRACKS, tracks_page());
    client.respond(AUDIO_FEATURES, features_page());
}

// =============================================================================
// Full cycle aggregation
// =============================================================================

#[tokio::test]
async fn test_full_cycle_aggregates_and_caches() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    let StatsView::Ready(result) = view else {
        panic!("expected Ready, got {:?}", harness.pipeline.view());
    };

    // "pop" appears at ranks 0 and 1 (weights 50 + 49), "rock" at rank 0.
    let genres: Vec<_> = result.genres.iter().cloned().collect();
    assert_eq!(
        genres,
        vec![("pop".to_string(), 99), ("rock".to_string(), 50)]
    );

    // Both tracks released in 2019.
    let years: Vec<_> = result.years.iter().cloned().collect();
    assert_eq!(years, vec![("2019".to_string(), 2)]);

    // Sums divided by the fixed page size of 50, not by the 2 records.
    assert_eq!(result.features.popularity, 180.0 / 50.0);
    assert_eq!(result.features.explicitness, 2.0 / 50.0);
    assert_eq!(result.features.tempo, 220.0 / 50.0);
    assert_eq!(result.features.loudness, -12.0 / 50.0);

    // The same result landed in the persistent cache.
    let cached = harness.cached_json(TimeRange::ShortTerm).unwrap();
    assert_eq!(cached["genres"], json!([["pop", 99], ["rock", 50]]));
}

#[tokio::test]
async fn test_requested_urls_carry_range_and_ids() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);

    harness.pipeline.refresh(TimeRange::MediumTerm, false).await;

    let calls = harness.client.calls();
    assert_eq!(calls.len(), 3);
    let url_of = |name: &str| {
        calls
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, url)| url.clone())
            .unwrap()
    };
    assert!(url_of(TOP_ARTISTS).contains("time_range=medium_term"));
    assert!(url_of(TOP_TRACKS).contains("time_range=medium_term"));
    assert_eq!(
        url_of(AUDIO_FEATURES),
        format!(
            "{}/audio-features?ids={},{}",
            API_BASE_URL,
            track_id('a'),
            track_id('b')
        )
    );
}

// =============================================================================
// Cache behavior
// =============================================================================

#[tokio::test]
async fn test_cache_hit_serves_without_network() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    // A fresh process against the same database.
    let (client, pipeline) = harness.reopened();
    let view = pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert!(matches!(view, StatsView::Ready(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_cache_is_keyed_per_range() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    // Another range misses the cache and hits the network.
    let (client, pipeline) = harness.reopened();
    script_happy_path(&client);
    pipeline.refresh(TimeRange::LongTerm, false).await;
    assert_eq!(client.calls().len(), 3);
    assert!(harness.cached_json(TimeRange::LongTerm).is_some());
}

#[tokio::test]
async fn test_forced_refresh_bypasses_and_overwrites_cache() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    let (client, pipeline) = harness.reopened();
    client.respond(
        TOP_ARTISTS,
        json!({ "items": [ { "id": "artist-3", "name": "Third", "genres": ["jazz"] } ] }),
    );
    client.respond(TOP_TRACKS, tracks_page());
    client.respond(AUDIO_FEATURES, features_page());

    let view = pipeline.refresh(TimeRange::ShortTerm, true).await;

    // Network was used despite the warm cache, and the entry was rewritten.
    assert!(!client.calls().is_empty());
    assert!(matches!(view, StatsView::Ready(_)));
    let cached = harness.cached_json(TimeRange::ShortTerm).unwrap();
    assert_eq!(cached["genres"], json!([["jazz", 50]]));
}

// =============================================================================
// Failure handling
// =============================================================================

#[tokio::test]
async fn test_primary_fetch_failure_fails_cycle_without_cache_write() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.client.fail(TOP_TRACKS);

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert_eq!(view, StatsView::Failed);
    assert!(harness.cached_json(TimeRange::ShortTerm).is_none());
}

#[tokio::test]
async fn test_feature_fetch_failure_fails_cycle_without_cache_write() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.client.fail(AUDIO_FEATURES);

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert_eq!(view, StatsView::Failed);
    assert!(harness.cached_json(TimeRange::ShortTerm).is_none());
}

#[tokio::test]
async fn test_malformed_payload_fails_cycle() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.client.respond(TOP_ARTISTS, json!({ "unexpected": true }));

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert_eq!(view, StatsView::Failed);
    assert!(harness.cached_json(TimeRange::ShortTerm).is_none());
}

// =============================================================================
// Track ID validation
// =============================================================================

#[tokio::test]
async fn test_malformed_track_ids_are_excluded_from_features_lookup() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.client.respond(
        TOP_TRACKS,
        json!({
            "items": [
                {
                    "id": track_id('a'),
                    "name": "Valid",
                    "popularity": 50,
                    "album": { "release_date": "2020-01-01" }
                },
                {
                    "id": "local-file-id",
                    "name": "Local",
                    "popularity": 10,
                    "album": { "release_date": "2021-01-01" }
                }
            ]
        }),
    );
    harness
        .client
        .respond(AUDIO_FEATURES, json!({ "audio_features": [feature_record(100.0)] }));

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert!(matches!(view, StatsView::Ready(_)));
    let features_url = harness
        .client
        .calls()
        .into_iter()
        .find(|(name, _)| name == AUDIO_FEATURES)
        .map(|(_, url)| url)
        .unwrap();
    assert!(features_url.contains(&track_id('a')));
    assert!(!features_url.contains("local-file-id"));
}

#[tokio::test]
async fn test_all_invalid_ids_skip_features_request() {
    let harness = TestHarness::new();
    script_happy_path(&harness.client);
    harness.client.respond(
        TOP_TRACKS,
        json!({
            "items": [
                {
                    "id": "not-a-spotify-id",
                    "name": "Local",
                    "popularity": 50,
                    "explicit": true,
                    "album": { "release_date": "2020-06-15" }
                }
            ]
        }),
    );

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    // The cycle still succeeds; the tally from tracks survives.
    let StatsView::Ready(result) = view else {
        panic!("expected Ready");
    };
    assert_eq!(result.features.popularity, 50.0 / 50.0);
    assert_eq!(result.features.danceability, 0.0);
    let names: Vec<_> = harness
        .client
        .calls()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert!(!names.contains(&AUDIO_FEATURES.to_string()));
}

// =============================================================================
// Empty listening history
// =============================================================================

#[tokio::test]
async fn test_empty_history_yields_empty_view() {
    let harness = TestHarness::new();
    harness.client.respond(TOP_ARTISTS, json!({ "items": [] }));
    harness.client.respond(TOP_TRACKS, json!({ "items": [] }));

    let view = harness.pipeline.refresh(TimeRange::ShortTerm, false).await;

    assert_eq!(view, StatsView::Empty);
    // The (empty) result is still cached so the next visit resolves locally.
    assert!(harness.cached_json(TimeRange::ShortTerm).is_some());
    // No IDs means no audio-features request.
    assert_eq!(harness.client.calls().len(), 2);
}
