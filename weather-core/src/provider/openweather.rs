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

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    async fn get(&self, path: &str, location: &Location, what: &str) -> Result<String, WeatherError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, location = %location, "OpenWeather {what} request");

        // Requests are always metric; display units are applied later.
        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
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
    let message = serde_json::from_str::<OwErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| truncate_body(body));

    match status {
        StatusCode::NOT_FOUND => WeatherError::LocationNotFound(location.to_string()),
        StatusCode::BAD_REQUEST => WeatherError::InvalidRequest(format!(
            "OpenWeather rejected {what} request for '{location}': {message}"
        )),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => WeatherError::Unauthorized(format!(
            "OpenWeather {what} request failed with status {status}: {message}"
        )),
        _ => WeatherError::ProviderUnavailable(format!(
            "OpenWeather {what} request failed with status {status}: {message}"
        )),
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str, what: &str) -> Result<T, WeatherError> {
    serde_json::from_str(body).map_err(|e| {
        WeatherError::ProviderUnavailable(format!("Failed to parse OpenWeather {what} JSON: {e}"))
    })
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize, Default)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize, Default)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize, Default)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    #[serde(default)]
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    dt_txt: Option<String>,
    main: OwMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

fn first_weather(weather: &[OwWeather]) -> (String, String) {
    weather
        .first()
        .map(|w| (w.description.clone(), w.icon.clone()))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
}

impl OwForecastEntry {
    /// `dt_txt` is the provider's own wall-clock label; fall back to `dt`.
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.dt_txt
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
            .or_else(|| unix_to_utc(self.dt).map(|t| t.naive_utc()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn current(&self, location: &Location) -> Result<CurrentConditions, WeatherError> {
        let body = self.get("/data/2.5/weather", location, "current").await?;
        let parsed: OwCurrentResponse = parse_body(&body, "current")?;

        let (condition, icon) = first_weather(&parsed.weather);

        Ok(CurrentConditions {
            provider: ProviderId::OpenWeather.to_string(),
            location_name: parsed.name,
            country: parsed.sys.country,
            temperature: parsed.main.temp,
            humidity_pct: parsed.main.humidity,
            condition,
            icon,
            wind_speed: parsed.wind.speed,
            pressure_hpa: parsed.main.pressure,
            cloud_pct: parsed.clouds.all,
            observation_time: unix_to_utc(parsed.dt).unwrap_or_else(Utc::now),
            native_units: Units::Metric,
        })
    }

    async fn forecast(&self, location: &Location) -> Result<Vec<ForecastPoint>, WeatherError> {
        let body = self.get("/data/2.5/forecast", location, "forecast").await?;
        let parsed: OwForecastResponse = parse_body(&body, "forecast")?;

        let points = parsed
            .list
            .iter()
            .filter_map(|entry| {
                let Some(timestamp) = entry.timestamp() else {
                    tracing::warn!(dt = entry.dt, "skipping forecast entry with unusable timestamp");
                    return None;
                };
                let (condition, icon) = first_weather(&entry.weather);
                Some(ForecastPoint {
                    timestamp,
                    temperature: entry.main.temp,
                    condition,
                    icon,
                    native_units: Units::Metric,
                })
            })
            .collect();

        Ok(points)
    }
}
