//! Pure aggregation of ranked listings into summary statistics.
//!
//! Nothing in here performs I/O; the pipeline feeds fetched pages in and
//! persists the assembled result, so every step is testable without a client
//! or a store.

mod features;
mod genres;
mod models;
mod tracks;

pub use features::reduce_features;
pub use genres::aggregate_genres;
pub use models::{AggregationResult, FeatureSummary, GenreTally, OrderedTally, YearHistogram};
pub use tracks::{aggregate_tracks, TrackStats};
