//! OCC well registry CSV -> `oklahoma_wells`

use super::{unexpected_payload, Normalized, Normalizer};
use crate::dataset::{DatasetDescriptor, OKLAHOMA_WELLS};
use crate::error::Result;
use crate::fetch::{Payload, PayloadFormat};
use crate::row::{Row, RowBuilder};
use crate::value::{to_text, RawValue};
use tracing::{debug, warn};

/// Source header -> canonical column
const HEADER_MAP: &[(&str, &str)] = &[
    ("API", "api"),
    ("WELL_RECORDS_DOCS", "well_records_docs"),
    ("WELL_NAME", "well_name"),
    ("WELL_NUM", "well_num"),
    ("OPERATOR", "operator"),
    ("WELLSTATUS", "well_status"),
    ("WELLTYPE", "well_type"),
    ("SYMBOL_CLASS", "symbol_class"),
    ("SH_LAT", "sh_lat"),
    ("SH_LON", "sh_lon"),
    ("COUNTY", "county"),
    ("SECTION", "section"),
    ("TOWNSHIP", "township"),
    ("RANGE", "range"),
    ("QTR4", "qtr4"),
    ("QTR3", "qtr3"),
    ("QTR2", "qtr2"),
    ("QTR1", "qtr1"),
    ("PM", "pm"),
    ("FOOTAGE_EW", "footage_ew"),
    ("EW", "ew"),
    ("FOOTAGE_NS", "footage_ns"),
    ("NS", "ns"),
];

/// Reads the registry CSV by header name.
///
/// Every field is trimmed and blank fields are null. Coordinates and footages
/// are read as floats; everything else stays text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WellRegistryNormalizer;

impl WellRegistryNormalizer {
    /// Position of each known header in this file, in `HEADER_MAP` order
    fn header_positions(headers: &csv::StringRecord) -> Vec<(usize, &'static str)> {
        HEADER_MAP
            .iter()
            .filter_map(|(source, column)| {
                headers
                    .iter()
                    .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(source))
                    .map(|pos| (pos, *column))
            })
            .collect()
    }
}

impl Normalizer for WellRegistryNormalizer {
    fn dataset(&self) -> &'static DatasetDescriptor {
        &OKLAHOMA_WELLS
    }

    fn payload_format(&self) -> PayloadFormat {
        PayloadFormat::Text
    }

    fn normalize_batch(&self, payload: &Payload) -> Result<Normalized> {
        let Payload::Text(text) = payload else {
            return Err(unexpected_payload(&OKLAHOMA_WELLS, payload));
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let positions = match reader.headers() {
            Ok(headers) => Self::header_positions(headers),
            Err(e) => {
                warn!(error = %e, "Unreadable CSV header, treating file as empty");
                return Ok(Normalized {
                    records: 0,
                    rows: Vec::new(),
                });
            },
        };
        if !positions.iter().any(|(_, column)| *column == "api") {
            warn!("CSV has no API column; every record will be dropped");
        }

        let mut records = 0;
        let mut rows: Vec<Row> = Vec::new();

        for (line, record) in reader.records().enumerate() {
            records += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(record = line + 1, error = %e, "Skipping unreadable CSV record");
                    continue;
                },
            };

            let field = |pos: usize| record.get(pos).map(RawValue::from).unwrap_or(RawValue::Null);

            let api = positions
                .iter()
                .find(|(_, column)| *column == "api")
                .and_then(|(pos, _)| to_text(&field(*pos)));
            if api.is_none() {
                continue;
            }

            let row = positions
                .iter()
                .fold(RowBuilder::new(&OKLAHOMA_WELLS), |builder, (pos, column)| {
                    builder.raw(column, &field(*pos))
                })
                .build();
            rows.push(row);
        }

        debug!(records, kept = rows.len(), "Normalized well registry CSV");

        Ok(Normalized { records, rows })
    }
}
