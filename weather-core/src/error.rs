use thiserror::Error;

/// Errors surfaced by the weather client, the caches and the lookup pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Empty or malformed input. Never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The provider has no match for the location.
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Transport failure, timeout, rate limit or server-side error.
    #[error("Weather provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected the API key. Fixed by reconfiguring, not by retrying.
    #[error("Weather provider rejected credentials: {0}")]
    Unauthorized(String),

    /// Writing history or watchlist state failed. The in-memory change is kept.
    #[error("Failed to persist {what}: {reason}")]
    Persistence { what: &'static str, reason: String },
}

impl WeatherError {
    /// Whether a caller-level retry can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_))
    }

    pub(crate) fn persistence(what: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            what,
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ProviderUnavailable(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::ProviderUnavailable(format!("undecodable response: {err}"))
        } else {
            Self::ProviderUnavailable(err.to_string())
        }
    }
}
