//! USGS GeoJSON feed -> `earthquakes`

use super::{unexpected_payload, Normalized, Normalizer};
use crate::dataset::{DatasetDescriptor, EARTHQUAKES};
use crate::error::Result;
use crate::fetch::{Payload, PayloadFormat};
use crate::row::{Row, RowBuilder};
use crate::value::{epoch_millis_to_utc, to_float, to_text, RawValue};
use serde_json::Value;
use tracing::debug;

/// Flattens GeoJSON features, dropping events below `min_magnitude`
#[derive(Debug, Clone, Copy, Default)]
pub struct EarthquakeNormalizer {
    pub min_magnitude: f64,
}

impl EarthquakeNormalizer {
    pub fn new(min_magnitude: f64) -> Self {
        Self { min_magnitude }
    }

    fn feature_row(&self, feature: &Value) -> Option<Row> {
        let props = feature.get("properties");
        let prop = |key: &str| RawValue::from_json(props.and_then(|p| p.get(key)));

        let magnitude = to_float(&prop("mag"))?;
        if magnitude < self.min_magnitude {
            return None;
        }
        let id = to_text(&RawValue::from_json(feature.get("id")))?;

        let coords = feature
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array);
        let coord = |i: usize| to_float(&RawValue::from_json(coords.and_then(|c| c.get(i))));

        let row = RowBuilder::new(&EARTHQUAKES)
            .text("id", Some(id))
            .float("magnitude", Some(magnitude))
            .raw("place", &prop("place"))
            .timestamp("occurred_at", epoch_millis_to_utc(&prop("time")))
            .float("longitude", coord(0))
            .float("latitude", coord(1))
            .float("depth_km", coord(2))
            .raw("magnitude_type", &prop("magType"))
            .raw("event_type", &prop("type"))
            .raw("title", &prop("title"))
            .raw("detail_url", &prop("url"))
            .raw("felt", &prop("felt"))
            .raw("tsunami", &prop("tsunami"))
            .build();

        Some(row)
    }
}

impl Normalizer for EarthquakeNormalizer {
    fn dataset(&self) -> &'static DatasetDescriptor {
        &EARTHQUAKES
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Json
    }

    fn normalize_batch(&self, payload: &Payload) -> Result<Normalized> {
        let Payload::Json(doc) = payload else {
            return Err(unexpected_payload(&EARTHQUAKES, payload));
        };

        // A feed without a features array simply has no events
        let features = doc
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let rows: Vec<Row> = features.iter().filter_map(|f| self.feature_row(f)).collect();

        debug!(
            features = features.len(),
            kept = rows.len(),
            min_magnitude = self.min_magnitude,
            "Normalized earthquake features"
        );

        Ok(Normalized {
            records: features.len(),
            rows,
        })
    }
}
