//! Session-tier page cache.
//!
//! An explicit context object handed to each logical page: it remembers the
//! page's refresh callback, the last selected time range and the last
//! published view, so a remounting page with an unchanged selection
//! re-displays without starting a fetch cycle. Process lifetime only; the
//! durable tier lives in `stats_store`.

use super::StatsView;
use crate::spotify::TimeRange;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The page's fetch cycle, re-invocable with a new time range.
pub type RefreshFn = Arc<dyn Fn(TimeRange) -> BoxFuture<'static, StatsView> + Send + Sync>;

struct PageCacheEntry {
    refresh: RefreshFn,
    range: TimeRange,
    view: StatsView,
}

#[derive(Default)]
pub struct PageCacheRegistry {
    entries: Mutex<HashMap<String, PageCacheEntry>>,
}

impl PageCacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page's refresh callback along with the selection and view
    /// of its latest completed cycle. Called on mount and after each cycle.
    pub fn register(&self, page_id: &str, refresh: RefreshFn, range: TimeRange, view: StatsView) {
        self.entries.lock().unwrap().insert(
            page_id.to_string(),
            PageCacheEntry {
                refresh,
                range,
                view,
            },
        );
    }

    /// Resume a previously registered page with the given selection.
    ///
    /// An unchanged selection returns the remembered view without invoking
    /// the callback; a changed one re-invokes the callback with the new
    /// range and remembers its outcome. Returns None for unknown pages.
    pub async fn resume(&self, page_id: &str, range: TimeRange) -> Option<StatsView> {
        let refresh = {
            let entries = self.entries.lock().unwrap();
            let entry = entries.get(page_id)?;
            if entry.range == range {
                return Some(entry.view.clone());
            }
            entry.refresh.clone()
        };

        let view = refresh(range).await;
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(page_id) {
            entry.range = range;
            entry.view = view.clone();
        }
        Some(view)
    }

    /// The remembered selection for a page, if it was mounted before.
    pub fn last_range(&self, page_id: &str) -> Option<TimeRange> {
        self.entries.lock().unwrap().get(page_id).map(|e| e.range)
    }

    /// Drop a page's entry when it unmounts for good.
    pub fn evict(&self, page_id: &str) {
        self.entries.lock().unwrap().remove(page_id);
    }
}
