//! Dataset descriptors
//!
//! Each dataset is described once: target table, canonical columns in order,
//! the identifying key, and which columns a re-load is allowed to refresh.
//! Normalizers build rows against a descriptor and destinations derive their
//! upsert statements from it.

use crate::row::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Float,
    Int,
    Date,
    Timestamp,
}

impl ColumnKind {
    /// The typed null for this kind
    pub fn null(self) -> Value {
        match self {
            ColumnKind::Text => Value::Text(None),
            ColumnKind::Float => Value::Float(None),
            ColumnKind::Int => Value::Int(None),
            ColumnKind::Date => Value::Date(None),
            ColumnKind::Timestamp => Value::Timestamp(None),
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Float => "DOUBLE PRECISION",
            ColumnKind::Int => "BIGINT",
            ColumnKind::Date => "DATE",
            ColumnKind::Timestamp => "TIMESTAMPTZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// Static description of one dataset's target table
#[derive(Debug, PartialEq, Eq)]
pub struct DatasetDescriptor {
    /// Short name used in logs and the CLI
    pub name: &'static str,
    pub table: &'static str,
    pub columns: &'static [Column],
    pub key_columns: &'static [&'static str],
    /// Columns overwritten when a row with an existing key is loaded again
    pub refreshable_columns: &'static [&'static str],
}

impl DatasetDescriptor {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Parameterized upsert for one row: `$1..$n` in column order
    pub fn upsert_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| quote_ident(c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("${i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let keys = self
            .key_columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");

        let action = if self.refreshable_columns.is_empty() {
            "DO NOTHING".to_string()
        } else {
            let sets = self
                .refreshable_columns
                .iter()
                .map(|c| {
                    let c = quote_ident(c);
                    format!("{c} = EXCLUDED.{c}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("DO UPDATE SET {sets}")
        };

        format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders}) ON CONFLICT ({keys}) {action}",
            quote_ident(self.table)
        )
    }

    /// Check that key and refreshable columns name real columns and do not overlap
    pub fn validate(&self) -> Result<(), String> {
        if self.key_columns.is_empty() {
            return Err(format!("{}: no key columns", self.table));
        }
        for name in self.key_columns.iter().chain(self.refreshable_columns) {
            if self.column(name).is_none() {
                return Err(format!("{}: unknown column {}", self.table, name));
            }
        }
        if let Some(overlap) = self
            .refreshable_columns
            .iter()
            .find(|c| self.key_columns.contains(c))
        {
            return Err(format!("{}: key column {} cannot be refreshed", self.table, overlap));
        }
        Ok(())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

use ColumnKind::{Date, Float, Int, Text, Timestamp};

pub static EARTHQUAKES: DatasetDescriptor = DatasetDescriptor {
    name: "earthquakes",
    table: "earthquakes",
    columns: &[
        col("id", Text),
        col("magnitude", Float),
        col("place", Text),
        col("occurred_at", Timestamp),
        col("longitude", Float),
        col("latitude", Float),
        col("depth_km", Float),
        col("magnitude_type", Text),
        col("event_type", Text),
        col("title", Text),
        col("detail_url", Text),
        col("felt", Int),
        col("tsunami", Int),
    ],
    key_columns: &["id"],
    refreshable_columns: &["magnitude", "place", "felt", "tsunami"],
};

pub static WEATHER_FORECASTS: DatasetDescriptor = DatasetDescriptor {
    name: "weather",
    table: "weather_forecasts",
    columns: &[
        col("id", Text),
        col("latitude", Float),
        col("longitude", Float),
        col("forecast_time", Timestamp),
        col("temperature_f", Float),
        col("relative_humidity", Int),
        col("wind_speed_mph", Float),
    ],
    key_columns: &["id"],
    refreshable_columns: &["temperature_f", "relative_humidity", "wind_speed_mph"],
};

pub static OKLAHOMA_WELLS: DatasetDescriptor = DatasetDescriptor {
    name: "wells",
    table: "oklahoma_wells",
    columns: &[
        col("api", Text),
        col("well_records_docs", Text),
        col("well_name", Text),
        col("well_num", Text),
        col("operator", Text),
        col("well_status", Text),
        col("well_type", Text),
        col("symbol_class", Text),
        col("sh_lat", Float),
        col("sh_lon", Float),
        col("county", Text),
        col("section", Text),
        col("township", Text),
        col("range", Text),
        col("qtr4", Text),
        col("qtr3", Text),
        col("qtr2", Text),
        col("qtr1", Text),
        col("pm", Text),
        col("footage_ew", Float),
        col("ew", Text),
        col("footage_ns", Float),
        col("ns", Text),
    ],
    key_columns: &["api"],
    refreshable_columns: &[
        "well_records_docs",
        "well_name",
        "well_num",
        "operator",
        "well_status",
        "well_type",
        "symbol_class",
    ],
};

pub static WELL_TRANSFERS: DatasetDescriptor = DatasetDescriptor {
    name: "well-transfers",
    table: "well_transfers",
    columns: &[
        col("event_date", Date),
        col("api_number", Text),
        col("well_name", Text),
        col("well_num", Text),
        col("well_type", Text),
        col("well_status", Text),
        col("pun_16ez", Text),
        col("pun_02a", Text),
        col("location_type", Text),
        col("surf_long_x", Float),
        col("surf_lat_y", Float),
        col("county", Text),
        col("section", Text),
        col("township", Text),
        col("range", Text),
        col("pm", Text),
        col("q1", Text),
        col("q2", Text),
        col("q3", Text),
        col("q4", Text),
        col("footage_ns", Float),
        col("ns", Text),
        col("footage_ew", Float),
        col("ew", Text),
        col("from_operator_number", Int),
        col("from_operator_name", Text),
        col("from_operator_address", Text),
        col("from_operator_phone", Text),
        col("to_operator_name", Text),
        col("to_operator_number", Int),
        col("to_operator_address", Text),
        col("to_operator_phone", Text),
    ],
    key_columns: &["api_number", "event_date"],
    refreshable_columns: &[
        "well_status",
        "from_operator_number",
        "from_operator_name",
        "from_operator_address",
        "from_operator_phone",
        "to_operator_name",
        "to_operator_number",
        "to_operator_address",
        "to_operator_phone",
    ],
};

/// Selects one of the supported datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    Earthquakes,
    Weather,
    OklahomaWells,
    WellTransfers,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 4] = [
        DatasetKind::Earthquakes,
        DatasetKind::Weather,
        DatasetKind::OklahomaWells,
        DatasetKind::WellTransfers,
    ];

    pub fn descriptor(self) -> &'static DatasetDescriptor {
        match self {
            DatasetKind::Earthquakes => &EARTHQUAKES,
            DatasetKind::Weather => &WEATHER_FORECASTS,
            DatasetKind::OklahomaWells => &OKLAHOMA_WELLS,
            DatasetKind::WellTransfers => &WELL_TRANSFERS,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use super::ColumnKind::Text;

    #[test]
    fn test_all_descriptors_validate() {
        for kind in DatasetKind::ALL {
            kind.descriptor().validate().unwrap();
        }
    }

    #[test]
    fn test_column_counts() {
        assert_eq!(EARTHQUAKES.columns.len(), 13);
        assert_eq!(WEATHER_FORECASTS.columns.len(), 7);
        assert_eq!(OKLAHOMA_WELLS.columns.len(), 23);
        assert_eq!(WELL_TRANSFERS.columns.len(), 32);
    }

    #[test]
    fn test_earthquake_upsert_sql() {
        let sql = EARTHQUAKES.upsert_sql();
        assert!(sql.starts_with("INSERT INTO \"earthquakes\" (\"id\", \"magnitude\""));
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"));
        assert!(sql.ends_with(
            "ON CONFLICT (\"id\") DO UPDATE SET \"magnitude\" = EXCLUDED.\"magnitude\", \
             \"place\" = EXCLUDED.\"place\", \"felt\" = EXCLUDED.\"felt\", \
             \"tsunami\" = EXCLUDED.\"tsunami\""
        ));
    }

    #[test]
    fn test_composite_key_conflict_target() {
        let sql = WELL_TRANSFERS.upsert_sql();
        assert!(sql.contains("ON CONFLICT (\"api_number\", \"event_date\")"));
        assert!(sql.contains("$32)"));
    }

    #[test]
    fn test_no_refreshable_columns_means_do_nothing() {
        static KEY_ONLY: DatasetDescriptor = DatasetDescriptor {
            name: "key-only",
            table: "key_only",
            columns: &[col("id", Text)],
            key_columns: &["id"],
            refreshable_columns: &[],
        };
        assert!(KEY_ONLY.upsert_sql().ends_with("ON CONFLICT (\"id\") DO NOTHING"));
    }

    #[test]
    fn test_validate_rejects_refreshable_key() {
        static BAD: DatasetDescriptor = DatasetDescriptor {
            name: "bad",
            table: "bad",
            columns: &[col("id", Text)],
            key_columns: &["id"],
            refreshable_columns: &["id"],
        };
        assert!(BAD.validate().is_err());
    }

    #[test]
    fn test_reference_schema_covers_descriptors() {
        let schema = include_str!("../sql/schema.sql");
        for kind in DatasetKind::ALL {
            let dataset = kind.descriptor();
            let start = schema
                .find(&format!("CREATE TABLE IF NOT EXISTS {} (", dataset.table))
                .unwrap();
            let body = &schema[start..start + schema[start..].find(");").unwrap()];
            for column in dataset.columns {
                assert!(
                    body.contains(&format!("{} ", column.name))
                        || body.contains(&format!("\"{}\"", column.name)),
                    "{}.{} missing from schema.sql",
                    dataset.table,
                    column.name
                );
            }
        }
    }

    #[test]
    fn test_dataset_kind_display() {
        assert_eq!(DatasetKind::WellTransfers.to_string(), "well-transfers");
        assert_eq!(DatasetKind::Weather.descriptor().table, "weather_forecasts");
    }
}
