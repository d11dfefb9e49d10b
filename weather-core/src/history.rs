//! Bounded, most-recent-first list of searched locations.
//!
//! Every mutation holds the lock across read, modify and persist, so
//! concurrent visits cannot interleave. Persistence is best-effort: a failed
//! save is returned to the caller but the in-memory change stays applied.
//!
//! Mutations block on the store write; async callers run them on the
//! blocking pool.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{error::WeatherError, location::Location, store::StateStore};

#[derive(Debug)]
pub struct HistoryCache {
    limit: usize,
    entries: Mutex<Vec<Location>>,
    store: Arc<dyn StateStore>,
}

impl HistoryCache {
    /// An empty cache backed by `store`. A limit of zero is raised to one.
    pub fn new(store: Arc<dyn StateStore>, limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            entries: Mutex::new(Vec::new()),
            store,
        }
    }

    /// Restore from `store`, dropping duplicates and anything past `limit`.
    pub fn load(store: Arc<dyn StateStore>, limit: usize) -> Result<Self, WeatherError> {
        let cache = Self::new(store, limit);
        let mut restored: Vec<Location> = Vec::new();
        for loc in cache.store.load_history()? {
            if restored.len() == cache.limit {
                break;
            }
            if !restored.iter().any(|seen| seen.same_place(&loc)) {
                restored.push(loc);
            }
        }
        *cache.entries.lock() = restored;
        Ok(cache)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Insert or promote `location` to the front, evicting the oldest entry
    /// when the bound is exceeded.
    pub fn record_visit(&self, location: &str) -> Result<(), WeatherError> {
        let location = Location::parse(location)?;

        let mut entries = self.entries.lock();
        entries.retain(|existing| !existing.same_place(&location));
        entries.insert(0, location);
        entries.truncate(self.limit);

        self.store.save_history(&entries).inspect_err(|e| {
            tracing::warn!("history updated in memory only: {e}");
        })
    }

    /// Snapshot, most recent first.
    pub fn recent(&self) -> Vec<Location> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) -> Result<(), WeatherError> {
        let mut entries = self.entries.lock();
        entries.clear();
        self.store.save_history(&entries)
    }
}
