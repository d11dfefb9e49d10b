use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
    error::WeatherError,
    location::Location,
    model::{CurrentConditions, ForecastPoint},
    provider::{ProviderId, truncate_body, unix_to_utc},
    units::Units,
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";
const FORECAST_DAYS: &str = "5";

// https://www.weatherapi.com/docs/#intro-error-codes
const ERR_QUERY_MISSING: i64 = 1003;
const ERR_INVALID_URL: i64 = 1005;
const ERR_NO_LOCATION: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get(
        &self,
        path: &str,
        location: &Location,
        extra: &[(&str, &str)],
        what: &str,
    ) -> Result<String, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, location = %location, "WeatherAPI {what} request");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", location.as_str())])
            .query(extra)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(classify_failure(status, &body, location, what));
        }

        Ok(body)
    }
}

fn classify_failure(status: StatusCode, body: &str, location: &Location, what: &str) -> WeatherError {
    let detail = serde_json::from_str::<WaErrorResponse>(body).ok().map(|r| r.error);

    match detail {
        Some(WaError { code: ERR_NO_LOCATION, .. }) => {
            WeatherError::LocationNotFound(location.to_string())
        }
        Some(WaError { code: ERR_QUERY_MISSING | ERR_INVALID_URL, message }) => {
            WeatherError::InvalidRequest(format!(
                "WeatherAPI rejected {what} request for '{location}': {message}"
            ))
        }
        Some(WaError { code, message })
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) =>
        {
            WeatherError::Unauthorized(format!(
                "WeatherAPI {what} request failed with status {status} (code {code}): {message}"
            ))
        }
        Some(WaError { code, message }) => WeatherError::ProviderUnavailable(format!(
            "WeatherAPI {what} request failed with status {status} (code {code}): {message}"
        )),
        None => WeatherError::ProviderUnavailable(format!(
            "WeatherAPI {what} request failed with status {status}: {}",
            truncate_body(body)
        )),
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<T, WeatherError> {
    serde_json::from_str(body).map_err(|e| {
        WeatherError::ProviderUnavailable(format!("Failed to parse WeatherAPI {what} JSON: {e}"))
    })
}

#[derive(Debug, Deserialize)]
struct WaErrorResponse {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    code: i64,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    pressure_mb: f64,
    cloud: u8,
    condition: WaCondition,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: WaLocation,
    current: WaCurrent,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    time: String,
    temp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    #[serde(default)]
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    #[serde(default)]
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    forecast: WaForecast,
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn current(&self, location: &Location) -> Result<CurrentConditions, WeatherError> {
        let body = self.get("/v1/current.json", location, &[], "current").await?;
        let parsed: WaResponse = parse_body(&body, "current")?;

        let ts = parsed
            .current
            .last_updated_epoch
            .or(parsed.location.localtime_epoch);
        let observation_time = ts.and_then(unix_to_utc).unwrap_or_else(Utc::now);

        Ok(CurrentConditions {
            provider: ProviderId::WeatherApi.to_string(),
            location_name: parsed.location.name,
            country: parsed.location.country,
            temperature: parsed.current.temp_c,
            humidity_pct: parsed.current.humidity,
            condition: parsed.current.condition.text,
            icon: parsed.current.condition.code.to_string(),
            wind_speed: parsed.current.wind_kph / 3.6,
            pressure_hpa: parsed.current.pressure_mb,
            cloud_pct: parsed.current.cloud,
            observation_time,
            native_units: Units::Metric,
        })
    }

    async fn forecast(&self, location: &Location) -> Result<Vec<ForecastPoint>, WeatherError> {
        let body = self
            .get(
                "/v1/forecast.json",
                location,
                &[("days", FORECAST_DAYS)],
                "forecast",
            )
            .await?;
        let parsed: WaForecastResponse = parse_body(&body, "forecast")?;

        // `time` is already local to the location, e.g. "2024-01-01 06:00".
        let points = parsed
            .forecast
            .forecastday
            .into_iter()
            .flat_map(|day| day.hour)
            .filter_map(|hour| {
                let timestamp = match NaiveDateTime::parse_from_str(&hour.time, "%Y-%m-%d %H:%M") {
                    Ok(ts) => ts,
                    Err(e) => {
                        tracing::warn!(time = %hour.time, "skipping forecast hour: {e}");
                        return None;
                    }
                };
                Some(ForecastPoint {
                    timestamp,
                    temperature: hour.temp_c,
                    condition: hour.condition.text,
                    icon: hour.condition.code.to_string(),
                    native_units: Units::Metric,
                })
            })
            .collect();

        Ok(points)
    }
}
