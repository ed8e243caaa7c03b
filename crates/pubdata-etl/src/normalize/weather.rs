//! Open-Meteo hourly forecast -> `weather_forecasts`

use super::{unexpected_payload, Normalized, Normalizer};
use crate::dataset::{DatasetDescriptor, WEATHER_FORECASTS};
use crate::error::Result;
use crate::fetch::{Payload, PayloadFormat};
use crate::row::RowBuilder;
use crate::value::{to_float, to_text, to_timestamp, RawValue};
use serde_json::Value;
use tracing::debug;

/// Zips the `hourly` arrays by index over `hourly.time`
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherNormalizer;

/// Row identity for one forecast hour.
///
/// Coordinates are rounded to two decimals for the key only; the stored row
/// keeps them at full precision.
pub fn forecast_key(latitude: f64, longitude: f64, time: &str) -> String {
    format!("{:?}_{:?}_{}", round2(latitude), round2(longitude), time)
}

/// Two-decimal rounding of the exact binary value, ties to even
fn round2(v: f64) -> f64 {
    format!("{v:.2}").parse().unwrap_or(v)
}

/// A named hourly array; missing or non-array is empty
fn series<'a>(hourly: Option<&'a Value>, name: &str) -> &'a [Value] {
    hourly
        .and_then(|h| h.get(name))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

impl Normalizer for WeatherNormalizer {
    fn dataset(&self) -> &'static DatasetDescriptor {
        &WEATHER_FORECASTS
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Json
    }

    fn normalize_batch(&self, payload: &Payload) -> Result<Normalized> {
        let Payload::Json(doc) = payload else {
            return Err(unexpected_payload(&WEATHER_FORECASTS, payload));
        };

        let hourly = doc.get("hourly");
        let times = series(hourly, "time");
        let temperatures = series(hourly, "temperature_2m");
        let humidity = series(hourly, "relative_humidity_2m");
        let wind_speed = series(hourly, "wind_speed_10m");

        let latitude = to_float(&RawValue::from_json(doc.get("latitude")));
        let longitude = to_float(&RawValue::from_json(doc.get("longitude")));
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            debug!(hours = times.len(), "Forecast has no coordinates, nothing to key rows on");
            return Ok(Normalized {
                records: times.len(),
                rows: Vec::new(),
            });
        };

        let mut rows = Vec::with_capacity(times.len());
        for (i, time) in times.iter().enumerate() {
            let at = |series: &[Value]| RawValue::from_json(series.get(i));

            let Some(temperature) = to_float(&at(temperatures)) else {
                continue;
            };
            let time = RawValue::from(time);
            let Some(time_text) = to_text(&time) else {
                continue;
            };

            rows.push(
                RowBuilder::new(&WEATHER_FORECASTS)
                    .text("id", Some(forecast_key(latitude, longitude, &time_text)))
                    .float("latitude", Some(latitude))
                    .float("longitude", Some(longitude))
                    .timestamp("forecast_time", to_timestamp(&time))
                    .float("temperature_f", Some(temperature))
                    .raw("relative_humidity", &at(humidity))
                    .raw("wind_speed_mph", &at(wind_speed))
                    .build(),
            );
        }

        debug!(hours = times.len(), kept = rows.len(), "Normalized hourly forecast");

        Ok(Normalized {
            records: times.len(),
            rows,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::row::Value as Col;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn sample_forecast() -> Payload {
        Payload::Json(json!({
            "latitude": 40.71,
            "longitude": -73.99,
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00"],
                "temperature_2m": [32.5, 31.8, 30.2],
                "relative_humidity_2m": [65, 68, 70],
                "wind_speed_10m": [8.2, 7.5, 6.8]
            }
        }))
    }

    #[test]
    fn test_flattens_hourly_arrays() {
        let rows = WeatherNormalizer.normalize(&sample_forecast()).unwrap();
        assert_eq!(rows.len(), 3);

        let row = &rows[0];
        assert_eq!(row.get("latitude").and_then(Col::as_float), Some(40.71));
        assert_eq!(row.get("longitude").and_then(Col::as_float), Some(-73.99));
        assert_eq!(row.get("temperature_f").and_then(Col::as_float), Some(32.5));
        assert_eq!(row.get("relative_humidity").and_then(Col::as_int), Some(65));
        assert_eq!(row.get("wind_speed_mph").and_then(Col::as_float), Some(8.2));
    }

    #[test]
    fn test_composite_key() {
        let rows = WeatherNormalizer.normalize(&sample_forecast()).unwrap();
        assert_eq!(
            rows[0].get("id").and_then(Col::as_text),
            Some("40.71_-73.99_2024-01-01T00:00")
        );
    }

    #[test]
    fn test_key_rounds_but_row_keeps_precision() {
        let payload = Payload::Json(json!({
            "latitude": 40.7128,
            "longitude": -74.006,
            "hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [30.0]}
        }));
        let rows = WeatherNormalizer.normalize(&payload).unwrap();
        assert_eq!(
            rows[0].get("id").and_then(Col::as_text),
            Some("40.71_-74.01_2024-01-01T00:00")
        );
        assert_eq!(rows[0].get("latitude").and_then(Col::as_float), Some(40.7128));
        assert_eq!(forecast_key(35.0, -97.5, "t"), "35.0_-97.5_t");
    }

    #[test]
    fn test_key_rounds_exact_ties_to_even() {
        assert_eq!(forecast_key(35.125, -97.375, "t"), "35.12_-97.38_t");
        assert_eq!(forecast_key(40.715, 0.625, "t"), "40.72_0.62_t");
        // Not an exact tie in binary: 2.675 is stored slightly below
        assert_eq!(forecast_key(2.675, -0.001, "t"), "2.67_-0.0_t");
    }

    #[test]
    fn test_key_is_deterministic() {
        let first = WeatherNormalizer.normalize(&sample_forecast()).unwrap();
        let second = WeatherNormalizer.normalize(&sample_forecast()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parses_forecast_time() {
        let rows = WeatherNormalizer.normalize(&sample_forecast()).unwrap();
        let ts = rows[1].get("forecast_time").and_then(Col::as_timestamp).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 1, 1, 1));
    }

    #[test]
    fn test_skips_null_temperature() {
        let payload = Payload::Json(json!({
            "latitude": 40.71,
            "longitude": -73.99,
            "hourly": {
                "time": ["2024-01-01T00:00", "2024-01-01T01:00"],
                "temperature_2m": [null, 31.8],
                "relative_humidity_2m": [65, 68],
                "wind_speed_10m": [8.2, 7.5]
            }
        }));
        let batch = WeatherNormalizer.normalize_batch(&payload).unwrap();
        assert_eq!(batch.records, 2);
        assert_eq!(batch.rows.len(), 1);
        assert_eq!(batch.rows[0].get("temperature_f").and_then(Col::as_float), Some(31.8));
    }

    #[test]
    fn test_short_arrays_and_bad_times_become_null() {
        let payload = Payload::Json(json!({
            "latitude": 40.71,
            "longitude": -73.99,
            "hourly": {
                "time": ["2024-01-01T00:00", "soon"],
                "temperature_2m": [30.0, 29.0],
                "relative_humidity_2m": [65]
            }
        }));
        let rows = WeatherNormalizer.normalize(&payload).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("relative_humidity"), Some(&Col::Int(None)));
        assert_eq!(rows[1].get("wind_speed_mph"), Some(&Col::Float(None)));
        assert_eq!(rows[1].get("forecast_time"), Some(&Col::Timestamp(None)));
        assert_eq!(rows[1].get("id").and_then(Col::as_text), Some("40.71_-73.99_soon"));
    }

    #[test]
    fn test_empty_hourly_and_missing_coordinates() {
        let empty = Payload::Json(json!({"latitude": 40.71, "longitude": -73.99, "hourly": {"time": []}}));
        assert!(WeatherNormalizer.normalize(&empty).unwrap().is_empty());

        let no_coords = Payload::Json(json!({
            "hourly": {"time": ["2024-01-01T00:00"], "temperature_2m": [30.0]}
        }));
        assert!(WeatherNormalizer.normalize(&no_coords).unwrap().is_empty());
    }
}
