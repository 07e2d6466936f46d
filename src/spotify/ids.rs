//! Track identifier validation.
//!
//! A single malformed ID fails the whole batched audio-features request, so
//! candidates are filtered down to the known ID shape before a batch is built.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRACK_ID: Regex = Regex::new("^[a-zA-Z0-9]{22}$").unwrap();
}

/// Returns the candidates matching the 22-character alphanumeric track ID
/// shape, preserving input order.
pub fn filter_valid_track_ids<S: AsRef<str>>(candidates: &[S]) -> Vec<String> {
    candidates
        .iter()
        .map(|c| c.as_ref())
        .filter(|id| TRACK_ID.is_match(id))
        .map(str::to_string)
        .collect()
}
