use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    error::WeatherError,
    location::Location,
    model::{CurrentConditions, ForecastPoint},
    provider::WeatherProvider,
};

/// Single-attempt, fail-fast boundary around a [`WeatherProvider`].
///
/// Validates the location, applies the per-request timeout and nothing else:
/// no caching and no retries.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn current(&self, location: &str) -> Result<CurrentConditions, WeatherError> {
        let location = Location::parse(location)?;
        self.with_timeout(&location, "current conditions", self.provider.current(&location))
            .await
    }

    pub async fn forecast(&self, location: &str) -> Result<Vec<ForecastPoint>, WeatherError> {
        let location = Location::parse(location)?;
        self.with_timeout(&location, "forecast", self.provider.forecast(&location))
            .await
    }

    async fn with_timeout<T>(
        &self,
        location: &Location,
        what: &str,
        call: impl Future<Output = Result<T, WeatherError>>,
    ) -> Result<T, WeatherError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(location = %location, "{what} request timed out after {:?}", self.timeout);
                Err(WeatherError::ProviderUnavailable(format!(
                    "{what} request for '{location}' timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}
