//! Shared helpers for pubdata-etl integration tests
//!
//! - Source configs that point at a wiremock server and never sleep between retries
//! - Payload fixtures shaped like the real feeds
//! - A PostgreSQL container with the reference schema applied

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use anyhow::{Context, Result};
use pubdata_etl::SourceConfig;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Once;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

pub const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

static TRACING: Once = Once::new();

/// Route test logs through the test harness writer; RUST_LOG controls the level
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Source pointing at `base_url + path` with the given retries and no delay
pub fn source(base_url: &str, path: &str, max_retries: u32) -> SourceConfig {
    SourceConfig::new(format!("{base_url}{path}"), 5).with_retries(max_retries, 0)
}

pub fn earthquake_feed() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "id": "us7000abc1",
                "properties": {
                    "mag": 4.5,
                    "place": "10km NW of Somewhere",
                    "time": 1_700_000_000_000i64,
                    "magType": "ml",
                    "type": "earthquake",
                    "title": "M 4.5 - 10km NW of Somewhere",
                    "url": "https://earthquake.usgs.gov/earthquakes/eventpage/us7000abc1",
                    "felt": 12,
                    "tsunami": 0
                },
                "geometry": {"type": "Point", "coordinates": [-122.5, 37.8, 8.2]}
            },
            {
                "id": "us7000abc2",
                "properties": {
                    "mag": 0.5,
                    "place": "Tiny quake",
                    "time": 1_700_000_100_000i64,
                    "magType": "ml",
                    "type": "earthquake",
                    "title": "M 0.5",
                    "url": "https://example.com",
                    "felt": null,
                    "tsunami": 0
                },
                "geometry": {"type": "Point", "coordinates": [-118.0, 34.0, 5.0]}
            }
        ]
    })
}

pub fn weather_forecast() -> Value {
    json!({
        "latitude": 40.71,
        "longitude": -73.99,
        "hourly": {
            "time": ["2024-01-01T00:00", "2024-01-01T01:00", "2024-01-01T02:00"],
            "temperature_2m": [32.5, null, 30.2],
            "relative_humidity_2m": [65, 68, 70],
            "wind_speed_10m": [8.2, 7.5, 6.8]
        }
    })
}

pub const WELLS_CSV: &str = concat!(
    "API,WELL_RECORDS_DOCS,WELL_NAME,WELL_NUM,OPERATOR,WELLSTATUS,WELLTYPE,",
    "SYMBOL_CLASS,SH_LAT,SH_LON,COUNTY,SECTION,TOWNSHIP,RANGE,",
    "QTR4,QTR3,QTR2,QTR1,PM,FOOTAGE_EW,EW,FOOTAGE_NS,NS\n",
    "3500100002,http://example.com,PENN MUTUAL LIFE,#1,OTC/OCC NOT ASSIGNED,",
    "PA,DRY,PLUGGED,35.894723,-94.78241,ADAIR,5.00,16N,24E,",
    "NE,NW,SE,NW,IM,330.0,E,990.0,S\n",
    ",,,#3,MISSING API,A,GAS,ACTIVE,36.123,-94.456,ALFALFA,,,,,,,,,,,\n",
    "3500100003,,TEST WELL,#2,ACME OIL,A,OIL,ACTIVE,,,ADAIR,6.00,16N,24E,,,,,,,,\n",
);

/// A transfers workbook: header row plus two transfers and one row without an API number
pub fn well_transfers_workbook() -> Vec<u8> {
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();

    let headers = [
        "EventDate", "API Number", "WellName", "WellNum", "Type", "Status", "PUN 16ez",
        "PUN 02A", "Location Type", "Surf_Long_X", "Surf_Lat_Y", "County", "Section",
        "Township", "Range", "PM", "Q1", "Q2", "Q3", "Q4", "FootageNS", "NS", "FootageEW",
        "EW", "FromOperatorNumber", "FromOperatorName", "FromOperatorAddressBlock",
        "FromOperatorPhone", "ToOperatorName", "ToOperatorNumber", "ToOperatorAddressBlock",
        "ToOperatorPhone",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }

    // Row 1: fully populated
    let date = ExcelDateTime::from_ymd(2026, 1, 12).unwrap();
    sheet.write_datetime_with_format(1, 0, &date, &date_format).unwrap();
    sheet.write_string(1, 1, "3503702931").unwrap();
    sheet.write_string(1, 2, "SMITH").unwrap();
    sheet.write_number(1, 3, 1.0).unwrap();
    sheet.write_string(1, 5, "AC").unwrap();
    sheet.write_number(1, 9, -96.504201).unwrap();
    sheet.write_number(1, 10, 35.662024).unwrap();
    sheet.write_string(1, 11, "037-CREEK").unwrap();
    sheet.write_number(1, 20, 240.0).unwrap();
    sheet.write_number(1, 24, 24793.0).unwrap();
    sheet.write_string(1, 25, "1978 INVESTMENTS LLC").unwrap();
    sheet.write_string(1, 28, "CHIZUM OIL LLC").unwrap();
    sheet.write_number(1, 29, 21860.0).unwrap();

    // Row 2: event date as ISO text, sparse
    sheet.write_string(2, 0, "2026-01-13").unwrap();
    sheet.write_string(2, 1, "3503702932").unwrap();
    sheet.write_string(2, 2, "JONES").unwrap();

    // Row 3: no API number
    sheet.write_datetime_with_format(3, 0, &date, &date_format).unwrap();
    sheet.write_string(3, 2, "ORPHAN").unwrap();

    workbook.save_to_buffer().unwrap()
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with the reference schema applied
pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&pool)
            .await
            .context("Failed to apply schema.sql")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}
