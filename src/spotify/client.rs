//! Spotify Web API client with named in-flight request deduplication.
//!
//! Requests are keyed by a stable name per logical resource ("topArtists",
//! "topTracks", "audioFeatures"); concurrent calls with the same name share
//! one underlying HTTP request.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::{TimeRange, PAGE_SIZE};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request name for the top-artists listing.
pub const TOP_ARTISTS: &str = "topArtists";
/// Request name for the top-tracks listing.
pub const TOP_TRACKS: &str = "topTracks";
/// Request name for the batched audio-features lookup.
pub const AUDIO_FEATURES: &str = "audioFeatures";

pub fn top_artists_url(base_url: &str, range: TimeRange) -> String {
    format!(
        "{}/me/top/artists?limit={}&offset=0&time_range={}",
        base_url,
        PAGE_SIZE,
        range.as_str()
    )
}

pub fn top_tracks_url(base_url: &str, range: TimeRange) -> String {
    format!(
        "{}/me/top/tracks?limit={}&offset=0&time_range={}",
        base_url,
        PAGE_SIZE,
        range.as_str()
    )
}

pub fn audio_features_url(base_url: &str, ids: &[String]) -> String {
    format!("{}/audio-features?ids={}", base_url, ids.join(","))
}

/// Failure of a named API request.
#[derive(Debug, Clone, Error)]
#[error("{name} request failed: {message}")]
pub struct ApiError {
    pub name: String,
    pub message: String,
}

/// A named, deduplicated JSON request against the upstream API.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn request(&self, name: &str, url: &str) -> Result<Value, ApiError>;
}

type SharedRequest = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

/// Tracks running requests by name so concurrent callers share a response.
struct InFlight {
    requests: Mutex<HashMap<String, SharedRequest>>,
}

impl InFlight {
    fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Join the named request if one is running, otherwise start `make`.
    /// The bool is true when an existing request was joined.
    fn join_or_start<F>(&self, name: &str, make: F) -> (SharedRequest, bool)
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value, ApiError>>,
    {
        let mut requests = self.requests.lock().unwrap();
        if let Some(existing) = requests.get(name) {
            return (existing.clone(), true);
        }
        let request = make().shared();
        requests.insert(name.to_string(), request.clone());
        (request, false)
    }

    /// Forget the named request once its result has been observed. Only the
    /// exact request is removed; a newer one under the same name stays.
    fn finish(&self, name: &str, request: &SharedRequest) {
        let mut requests = self.requests.lock().unwrap();
        if let Some(current) = requests.get(name) {
            if current.ptr_eq(request) {
                requests.remove(name);
            }
        }
    }
}

/// Bearer-authenticated reqwest client for the Spotify Web API.
pub struct SpotifyClient {
    client: reqwest::Client,
    token: String,
    in_flight: InFlight,
}

impl SpotifyClient {
    pub fn new(token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            in_flight: InFlight::new(),
        })
    }
}

async fn fetch_json(
    client: reqwest::Client,
    name: String,
    token: String,
    url: String,
) -> Result<Value, ApiError> {
    let err = |message: String| ApiError {
        name: name.clone(),
        message,
    };

    let response = client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await
        .map_err(|e| err(e.to_string()))?;

    if !response.status().is_success() {
        return Err(err(format!("status {}", response.status())));
    }

    response.json().await.map_err(|e| err(e.to_string()))
}

#[async_trait]
impl ApiClient for SpotifyClient {
    async fn request(&self, name: &str, url: &str) -> Result<Value, ApiError> {
        let client = self.client.clone();
        let token = self.token.clone();
        let owned_name = name.to_string();
        let owned_url = url.to_string();

        let (request, joined) = self
            .in_flight
            .join_or_start(name, move || {
                fetch_json(client, owned_name, token, owned_url).boxed()
            });
        if joined {
            debug!("Joining in-flight {} request", name);
        }

        let result = request.clone().await;
        self.in_flight.finish(name, &request);
        result
    }
}
