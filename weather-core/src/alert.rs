use crate::{model::CurrentConditions, units::Units};

const HEAT_THRESHOLD_C: f64 = 35.0;
const COLD_THRESHOLD_C: f64 = 5.0;

/// Notable conditions worth flagging alongside a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeatherAlert {
    /// Temperature above 35 °C; carries the native value.
    Heat(f64),
    /// Temperature below 5 °C; carries the native value.
    Cold(f64),
    Storm,
}

impl WeatherAlert {
    /// Temperature checks take precedence over the storm check.
    pub fn for_conditions(current: &CurrentConditions) -> Option<Self> {
        let celsius = Units::Metric.convert_temperature(current.temperature, current.native_units);

        if celsius > HEAT_THRESHOLD_C {
            Some(Self::Heat(current.temperature))
        } else if celsius < COLD_THRESHOLD_C {
            Some(Self::Cold(current.temperature))
        } else if current.condition.to_lowercase().contains("storm") {
            Some(Self::Storm)
        } else {
            None
        }
    }
}
