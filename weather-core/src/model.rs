use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::WeatherError, units::Units};

/// Current conditions for one location, as reported by the provider.
///
/// Numeric values are in the provider's native units, recorded in
/// `native_units`; conversion happens at the display boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub provider: String,
    pub location_name: String,
    pub country: String,
    pub temperature: f64,
    pub humidity_pct: u8,
    pub condition: String,
    pub icon: String,
    pub wind_speed: f64,
    pub pressure_hpa: f64,
    pub cloud_pct: u8,
    pub observation_time: DateTime<Utc>,
    pub native_units: Units,
}

/// One raw entry of the provider's forecast time series.
///
/// `timestamp` is the provider's wall-clock time; no timezone conversion is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
    pub native_units: Units,
}

/// One representative forecast entry per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temperature: f64,
    pub condition: String,
    pub icon: String,
    pub native_units: Units,
}

/// Outcome of one location in a batch comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub location: String,
    pub result: Result<CurrentConditions, WeatherError>,
}

impl Comparison {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}
