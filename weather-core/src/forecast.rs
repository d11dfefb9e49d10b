//! Collapses a provider time series into one entry per calendar day.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::model::{DailyForecast, ForecastPoint};

/// Keep the first point seen for each date, in delivery order.
///
/// Dates come straight from the point timestamps. The output is never
/// re-sorted, so it is ascending only when the input is.
pub fn reduce(points: &[ForecastPoint]) -> Vec<DailyForecast> {
    let mut seen: HashSet<NaiveDate> = HashSet::new();

    points
        .iter()
        .filter(|point| seen.insert(point.timestamp.date()))
        .map(|point| DailyForecast {
            date: point.timestamp.date(),
            temperature: point.temperature,
            condition: point.condition.clone(),
            icon: point.icon.clone(),
            native_units: point.native_units,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Units;
    use chrono::NaiveDateTime;

    fn point(ts: &str, temperature: f64, condition: &str) -> ForecastPoint {
        ForecastPoint {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            temperature,
            condition: condition.to_string(),
            icon: "01d".to_string(),
            native_units: Units::Metric,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn first_point_per_date_wins() {
        let points = vec![
            point("2024-01-01 00:00", 10.0, "clear sky"),
            point("2024-01-01 06:00", 12.0, "light rain"),
            point("2024-01-02 00:00", 8.0, "overcast clouds"),
        ];

        let daily = reduce(&points);

        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, date("2024-01-01"));
        assert_eq!(daily[0].temperature, 10.0);
        assert_eq!(daily[0].condition, "clear sky");
        assert_eq!(daily[1].date, date("2024-01-02"));
        assert_eq!(daily[1].temperature, 8.0);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(reduce(&[]).is_empty());
    }

    #[test]
    fn does_not_resort_out_of_order_input() {
        let points = vec![
            point("2024-01-03 00:00", 3.0, "snow"),
            point("2024-01-01 00:00", 1.0, "clear sky"),
            point("2024-01-03 12:00", 4.0, "rain"),
            point("2024-01-02 00:00", 2.0, "mist"),
        ];

        let dates: Vec<_> = reduce(&points).into_iter().map(|d| d.date).collect();

        assert_eq!(
            dates,
            vec![date("2024-01-03"), date("2024-01-01"), date("2024-01-02")]
        );
    }

    #[test]
    fn five_day_three_hour_series_collapses_to_days() {
        let mut points = Vec::new();
        for day in 1..=5 {
            for hour in (0..24).step_by(3) {
                let ts = format!("2024-03-{day:02} {hour:02}:00");
                points.push(point(&ts, day as f64 * 10.0 + hour as f64, "clouds"));
            }
        }

        let daily = reduce(&points);

        assert_eq!(daily.len(), 5);
        for (i, entry) in daily.iter().enumerate() {
            assert_eq!(entry.temperature, (i as f64 + 1.0) * 10.0);
        }
    }
}
