use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Measurement system used either as a display preference or as the
/// native unit tag of provider values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn speed_label(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    /// Convert a temperature expressed in `from` into `self`.
    pub fn convert_temperature(&self, value: f64, from: Units) -> f64 {
        match (from, *self) {
            (Units::Metric, Units::Imperial) => value * 9.0 / 5.0 + 32.0,
            (Units::Imperial, Units::Metric) => (value - 32.0) * 5.0 / 9.0,
            _ => value,
        }
    }

    /// Convert a wind speed expressed in `from` into `self`.
    pub fn convert_speed(&self, value: f64, from: Units) -> f64 {
        const MPS_PER_MPH: f64 = 0.44704;
        match (from, *self) {
            (Units::Metric, Units::Imperial) => value / MPS_PER_MPH,
            (Units::Imperial, Units::Metric) => value * MPS_PER_MPH,
            _ => value,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported units: metric, imperial."
            )),
        }
    }
}

/// Process-wide display units, shared by reference between readers.
///
/// Writes happen only through [`UnitsSetting::toggle`]; fetched values are
/// never touched by a toggle.
#[derive(Debug)]
pub struct UnitsSetting(AtomicU8);

impl UnitsSetting {
    pub fn new(initial: Units) -> Self {
        Self(AtomicU8::new(encode(initial)))
    }

    pub fn get(&self) -> Units {
        decode(self.0.load(Ordering::Acquire))
    }

    /// Flip the setting and return the new value.
    pub fn toggle(&self) -> Units {
        let previous = self.0.fetch_xor(1, Ordering::AcqRel);
        decode(previous ^ 1)
    }
}

impl Default for UnitsSetting {
    fn default() -> Self {
        Self::new(Units::default())
    }
}

fn encode(units: Units) -> u8 {
    match units {
        Units::Metric => 0,
        Units::Imperial => 1,
    }
}

fn decode(raw: u8) -> Units {
    if raw & 1 == 0 {
        Units::Metric
    } else {
        Units::Imperial
    }
}
