//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers and a fail-fast client around them
//! - Bounded search history and a persisted watchlist
//! - Concurrent watchlist comparison with per-location failure isolation
//! - Reduction of forecast series to one entry per day
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod alert;
pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod history;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;
pub mod units;
pub mod watchlist;

pub use aggregate::{AggregateOptions, AggregationEngine, RetryPolicy};
pub use alert::WeatherAlert;
pub use client::WeatherClient;
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use history::HistoryCache;
pub use location::Location;
pub use model::{Comparison, CurrentConditions, DailyForecast, ForecastPoint};
pub use provider::{ProviderId, WeatherProvider};
pub use service::{Lookup, WeatherService};
pub use store::{JsonFileStore, MemoryStore, StateStore};
pub use units::{Units, UnitsSetting};
pub use watchlist::WatchlistStore;
