//! Persistence for the history list and the watchlist.

use parking_lot::Mutex;
use std::{fmt::Debug, fs, path::PathBuf};

use crate::{error::WeatherError, location::Location};

const HISTORY_FILE: &str = "history.json";
const WATCHLIST_FILE: &str = "watchlist.json";

/// Load/save of the ordered history list and the watchlist set.
///
/// Whatever is saved must load back exactly, including order.
pub trait StateStore: Send + Sync + Debug {
    fn load_history(&self) -> Result<Vec<Location>, WeatherError>;
    fn save_history(&self, entries: &[Location]) -> Result<(), WeatherError>;
    fn load_watchlist(&self) -> Result<Vec<Location>, WeatherError>;
    fn save_watchlist(&self, entries: &[Location]) -> Result<(), WeatherError>;
}

/// One pretty-printed JSON array per file in a state directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, file: &str, what: &'static str) -> Result<Vec<Location>, WeatherError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| WeatherError::persistence(what, format!("{}: {e}", path.display())))?;

        serde_json::from_str(&contents)
            .map_err(|e| WeatherError::persistence(what, format!("{}: {e}", path.display())))
    }

    /// Write to a sibling temp file and rename over the target.
    fn write(&self, file: &str, what: &'static str, entries: &[Location]) -> Result<(), WeatherError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            WeatherError::persistence(what, format!("{}: {e}", self.dir.display()))
        })?;

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{file}.tmp"));
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| WeatherError::persistence(what, e))?;

        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| WeatherError::persistence(what, format!("{}: {e}", path.display())))
    }
}

impl StateStore for JsonFileStore {
    fn load_history(&self) -> Result<Vec<Location>, WeatherError> {
        self.read(HISTORY_FILE, "history")
    }

    fn save_history(&self, entries: &[Location]) -> Result<(), WeatherError> {
        self.write(HISTORY_FILE, "history", entries)
    }

    fn load_watchlist(&self) -> Result<Vec<Location>, WeatherError> {
        self.read(WATCHLIST_FILE, "watchlist")
    }

    fn save_watchlist(&self, entries: &[Location]) -> Result<(), WeatherError> {
        self.write(WATCHLIST_FILE, "watchlist", entries)
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<Vec<Location>>,
    watchlist: Mutex<Vec<Location>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load_history(&self) -> Result<Vec<Location>, WeatherError> {
        Ok(self.history.lock().clone())
    }

    fn save_history(&self, entries: &[Location]) -> Result<(), WeatherError> {
        *self.history.lock() = entries.to_vec();
        Ok(())
    }

    fn load_watchlist(&self) -> Result<Vec<Location>, WeatherError> {
        Ok(self.watchlist.lock().clone())
    }

    fn save_watchlist(&self, entries: &[Location]) -> Result<(), WeatherError> {
        *self.watchlist.lock() = entries.to_vec();
        Ok(())
    }
}
