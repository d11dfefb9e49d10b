//! Concurrent fan-out/fan-in of current-conditions lookups.
//!
//! Every input location yields exactly one [`Comparison`], in input order,
//! whatever order the lookups finish in.
//! A failing location becomes an `Err` entry; it never aborts the batch.

use futures_util::{StreamExt, stream};
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    client::WeatherClient,
    config::{Config, DEFAULT_COMPARE_DEADLINE_SECS, DEFAULT_MAX_CONCURRENCY},
    error::WeatherError,
    model::{Comparison, CurrentConditions},
};

pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 100;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Retries for transient per-location failures during a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one.
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay,
        }
    }

    /// Delay before retry number `attempt` (zero-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Ceiling on in-flight provider calls.
    pub max_concurrency: usize,
    /// Overall deadline for one comparison; `None` waits for every call.
    pub deadline: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline: Some(Duration::from_secs(DEFAULT_COMPARE_DEADLINE_SECS)),
            retry: RetryPolicy::default(),
        }
    }
}

impl AggregateOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            deadline: config.compare_deadline(),
            retry: RetryPolicy {
                max_retries: config.compare_retries,
                ..RetryPolicy::default()
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AggregationEngine {
    client: WeatherClient,
    options: AggregateOptions,
}

impl AggregationEngine {
    pub fn new(client: WeatherClient, options: AggregateOptions) -> Self {
        Self { client, options }
    }

    /// Fetch current conditions for every location concurrently.
    ///
    /// An empty input returns immediately without touching the provider.
    pub async fn compare<S: AsRef<str>>(&self, locations: &[S]) -> Vec<Comparison> {
        if locations.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let deadline = self.options.deadline.map(|d| started + d);
        let limit = self.options.max_concurrency.max(1);

        // A slot frees as soon as any lookup finishes; input order is restored afterwards.
        let mut indexed: Vec<(usize, Comparison)> =
            stream::iter(locations.iter().enumerate().map(|(index, location)| async move {
                (index, self.fetch_one(location.as_ref(), deadline).await)
            }))
            .buffer_unordered(limit)
            .collect()
            .await;
        indexed.sort_unstable_by_key(|(index, _)| *index);
        let results: Vec<Comparison> = indexed.into_iter().map(|(_, entry)| entry).collect();

        let failed = results.iter().filter(|c| !c.is_ok()).count();
        tracing::info!(
            locations = results.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "comparison finished"
        );

        results
    }

    async fn fetch_one(&self, location: &str, deadline: Option<Instant>) -> Comparison {
        let label = location.trim().to_string();

        let result = match deadline {
            Some(at) => tokio::time::timeout_at(at, self.fetch_with_retry(location))
                .await
                .unwrap_or_else(|_| {
                    Err(WeatherError::ProviderUnavailable(format!(
                        "comparison deadline passed before '{label}' completed"
                    )))
                }),
            None => self.fetch_with_retry(location).await,
        };

        if let Err(e) = &result {
            tracing::warn!(location = %label, "comparison entry failed: {e}");
        }

        Comparison {
            location: label,
            result,
        }
    }

    async fn fetch_with_retry(&self, location: &str) -> Result<CurrentConditions, WeatherError> {
        let policy = &self.options.retry;
        let mut attempt = 0;

        loop {
            match self.client.current(location).await {
                Err(e) if e.is_transient() && attempt < policy.max_retries => {
                    let delay = policy.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::debug!(
                        location,
                        "retry {attempt} of {} in {delay:?}: {e}",
                        policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
