//! Wires the client, caches and aggregation engine together.

use anyhow::Context;
use std::sync::Arc;

use crate::{
    aggregate::{AggregateOptions, AggregationEngine},
    alert::WeatherAlert,
    client::WeatherClient,
    config::Config,
    error::WeatherError,
    forecast,
    history::HistoryCache,
    location::Location,
    model::{Comparison, CurrentConditions, DailyForecast},
    provider::{WeatherProvider, default_provider_from_config},
    store::{JsonFileStore, StateStore},
    units::UnitsSetting,
    watchlist::WatchlistStore,
};

/// Result of a single-location lookup.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub current: CurrentConditions,
    /// A forecast failure does not fail the lookup.
    pub forecast: Result<Vec<DailyForecast>, WeatherError>,
    pub alert: Option<WeatherAlert>,
    /// Set when the history update could not be persisted.
    pub history_error: Option<WeatherError>,
}

#[derive(Debug)]
pub struct WeatherService {
    client: WeatherClient,
    engine: AggregationEngine,
    history: Arc<HistoryCache>,
    watchlist: WatchlistStore,
    units: UnitsSetting,
}

impl WeatherService {
    /// Build a service over `provider`, restoring history and watchlist from `store`.
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn StateStore>,
        config: &Config,
    ) -> Result<Self, WeatherError> {
        let client = WeatherClient::new(provider, config.request_timeout());
        let engine = AggregationEngine::new(client.clone(), AggregateOptions::from_config(config));

        Ok(Self {
            client,
            engine,
            history: Arc::new(HistoryCache::load(store.clone(), config.history_limit)?),
            watchlist: WatchlistStore::load(store)?,
            units: UnitsSetting::new(config.units),
        })
    }

    /// Default provider from config, state files in the platform data dir.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn WeatherProvider> = Arc::from(default_provider_from_config(config)?);
        let store = Arc::new(JsonFileStore::new(Config::state_dir()?));

        Self::new(provider, store, config).context("Failed to load saved history or watchlist")
    }

    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn units(&self) -> &UnitsSetting {
        &self.units
    }

    /// Current conditions, then history, then the daily forecast.
    ///
    /// Only a failure to fetch current conditions fails the whole lookup.
    pub async fn fetch_current_and_forecast(&self, location: &str) -> Result<Lookup, WeatherError> {
        let location = Location::parse(location)?;

        let current = self.client.current(location.as_str()).await?;
        tracing::info!(
            location = %location,
            resolved = %current.location_name,
            "fetched current conditions"
        );

        // Prefer the provider's spelling of the name for history.
        let visited = if current.location_name.trim().is_empty() {
            location.to_string()
        } else {
            current.location_name.clone()
        };
        let history = Arc::clone(&self.history);
        let history_error = tokio::task::spawn_blocking(move || history.record_visit(&visited))
            .await
            .unwrap_or_else(|e| Err(WeatherError::persistence("history", e)))
            .err();

        let forecast = self
            .client
            .forecast(location.as_str())
            .await
            .map(|points| forecast::reduce(&points));
        if let Err(e) = &forecast {
            tracing::warn!(location = %location, "could not load forecast: {e}");
        }

        let alert = WeatherAlert::for_conditions(&current);

        Ok(Lookup {
            current,
            forecast,
            alert,
            history_error,
        })
    }

    pub async fn compare<S: AsRef<str>>(&self, locations: &[S]) -> Vec<Comparison> {
        self.engine.compare(locations).await
    }

    /// Compare every watched location. An empty watchlist yields an empty result.
    pub async fn compare_watchlist(&self) -> Vec<Comparison> {
        let watched = self.watchlist.list();
        if watched.is_empty() {
            tracing::debug!("watchlist is empty, nothing to compare");
        }
        self.engine.compare(watched.as_slice()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        client::testing::{FakeProvider, Script, point},
        store::{MemoryStore, testing::FlakyStore},
        units::Units,
    };
    use chrono::NaiveDate;

    fn service(provider: FakeProvider) -> (WeatherService, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let svc = WeatherService::new(provider.clone(), Arc::new(MemoryStore::new()), &Config::default())
            .expect("memory store always loads");
        (svc, provider)
    }

    #[tokio::test]
    async fn lookup_records_history_and_reduces_forecast() {
        let (svc, _) = service(
            FakeProvider::new()
                .with("London", Script::Ok { temperature: 11.0 })
                .with_forecast(
                    "London",
                    Ok(vec![
                        point("2024-01-01 00:00", 10.0),
                        point("2024-01-01 06:00", 12.0),
                        point("2024-01-02 00:00", 8.0),
                    ]),
                ),
        );

        let lookup = svc.fetch_current_and_forecast(" London ").await.unwrap();

        assert_eq!(lookup.current.temperature, 11.0);
        let daily = lookup.forecast.unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(daily[0].temperature, 10.0);
        assert_eq!(daily[1].temperature, 8.0);
        assert!(lookup.history_error.is_none());
        assert_eq!(svc.history().recent()[0].as_str(), "London");
    }

    #[tokio::test]
    async fn failed_current_lookup_leaves_history_alone() {
        let (svc, _) = service(FakeProvider::new());

        let err = svc.fetch_current_and_forecast("Nowhereville").await.unwrap_err();

        assert_eq!(err, WeatherError::LocationNotFound("Nowhereville".into()));
        assert!(svc.history().recent().is_empty());
    }

    #[tokio::test]
    async fn forecast_failure_is_carried_not_raised() {
        let (svc, _) = service(
            FakeProvider::new()
                .with("Oslo", Script::Ok { temperature: -3.0 })
                .with_forecast("Oslo", Err(WeatherError::ProviderUnavailable("502".into()))),
        );

        let lookup = svc.fetch_current_and_forecast("Oslo").await.unwrap();

        assert!(matches!(lookup.forecast, Err(WeatherError::ProviderUnavailable(_))));
        assert_eq!(lookup.alert, Some(WeatherAlert::Cold(-3.0)));
        assert_eq!(svc.history().recent()[0].as_str(), "Oslo");
    }

    #[tokio::test]
    async fn history_persistence_failure_does_not_fail_lookup() {
        let provider = Arc::new(FakeProvider::new().with("Rome", Script::Ok { temperature: 20.0 }));
        let svc = WeatherService::new(provider, Arc::new(FlakyStore::failing()), &Config::default())
            .unwrap();

        let lookup = svc.fetch_current_and_forecast("Rome").await.unwrap();

        assert!(matches!(lookup.history_error, Some(WeatherError::Persistence { .. })));
        assert_eq!(svc.history().recent()[0].as_str(), "Rome");
    }

    #[tokio::test]
    async fn lookup_writes_history_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(FakeProvider::new().with("Cairo", Script::Ok { temperature: 33.0 }));
        let svc = WeatherService::new(
            provider,
            Arc::new(JsonFileStore::new(dir.path())),
            &Config::default(),
        )
        .unwrap();

        let lookup = svc.fetch_current_and_forecast("Cairo").await.unwrap();
        assert!(lookup.history_error.is_none());

        let saved = JsonFileStore::new(dir.path()).load_history().unwrap();
        assert_eq!(saved, vec![Location::parse("Cairo").unwrap()]);
    }

    #[tokio::test]
    async fn empty_watchlist_compares_to_nothing() {
        let (svc, provider) = service(FakeProvider::new());

        assert!(svc.compare_watchlist().await.is_empty());
        assert_eq!(provider.current_calls(), 0);
    }

    #[tokio::test]
    async fn watchlist_comparison_covers_every_entry() {
        let (svc, _) = service(
            FakeProvider::new()
                .with("Paris", Script::Ok { temperature: 12.0 })
                .with("Tokyo", Script::Ok { temperature: 18.0 }),
        );
        for city in ["Paris", "Nowhereville", "Tokyo"] {
            svc.watchlist().add(city).unwrap();
        }

        let results = svc.compare_watchlist().await;

        assert_eq!(results.len(), 3);
        assert_eq!(results.iter().filter(|c| c.is_ok()).count(), 2);
        let failed: Vec<_> = results
            .iter()
            .filter(|c| !c.is_ok())
            .map(|c| c.location.as_str())
            .collect();
        assert_eq!(failed, vec!["Nowhereville"]);
    }

    #[tokio::test]
    async fn toggling_units_leaves_fetched_values_alone() {
        let (svc, _) = service(FakeProvider::new().with("Lagos", Script::Ok { temperature: 30.0 }));

        let lookup = svc.fetch_current_and_forecast("Lagos").await.unwrap();
        let before = lookup.current.clone();

        assert_eq!(svc.units().toggle(), Units::Imperial);
        assert_eq!(lookup.current, before);
        assert_eq!(lookup.current.temperature, 30.0);
        assert_eq!(lookup.current.native_units, Units::Metric);

        assert_eq!(svc.units().toggle(), Units::Metric);
    }
}
