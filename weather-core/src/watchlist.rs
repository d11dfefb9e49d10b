//! User-curated set of locations for side-by-side comparison.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::{error::WeatherError, location::Location, store::StateStore};

/// Unbounded set of locations, de-duplicated case-insensitively.
///
/// Entries keep insertion order so that a comparison over the watchlist is
/// reproducible, though callers should not rely on any particular order.
#[derive(Debug)]
pub struct WatchlistStore {
    entries: Mutex<Vec<Location>>,
    store: Arc<dyn StateStore>,
}

impl WatchlistStore {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            store,
        }
    }

    pub fn load(store: Arc<dyn StateStore>) -> Result<Self, WeatherError> {
        let mut restored: Vec<Location> = Vec::new();
        for loc in store.load_watchlist()? {
            if !restored.iter().any(|seen| seen.same_place(&loc)) {
                restored.push(loc);
            }
        }

        Ok(Self {
            entries: Mutex::new(restored),
            store,
        })
    }

    /// Returns whether the location was newly added; re-adding is a no-op.
    pub fn add(&self, location: &str) -> Result<bool, WeatherError> {
        let location = Location::parse(location)?;

        let mut entries = self.entries.lock();
        if entries.iter().any(|existing| existing.same_place(&location)) {
            return Ok(false);
        }
        entries.push(location);
        self.store.save_watchlist(&entries)?;
        Ok(true)
    }

    /// Returns whether anything was removed; removing an absent location is a no-op.
    pub fn remove(&self, location: &str) -> Result<bool, WeatherError> {
        let Ok(location) = Location::parse(location) else {
            return Ok(false);
        };

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|existing| !existing.same_place(&location));
        if entries.len() == before {
            return Ok(false);
        }
        self.store.save_watchlist(&entries)?;
        Ok(true)
    }

    /// Snapshot of the watchlist. Empty means "nothing to compare".
    pub fn list(&self) -> Vec<Location> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, location: &str) -> bool {
        Location::parse(location)
            .map(|loc| self.entries.lock().iter().any(|e| e.same_place(&loc)))
            .unwrap_or(false)
    }
}
