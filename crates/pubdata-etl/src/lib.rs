//! pubdata ETL Library
//!
//! Batch pipelines that pull public datasets over HTTP, normalize them into flat
//! rows and upsert them into PostgreSQL.
//!
//! # Supported Datasets
//!
//! - **Earthquakes**: USGS GeoJSON summary feed
//! - **Weather**: Open-Meteo hourly forecast
//! - **Oklahoma wells**: OCC well registry CSV
//! - **Well transfers**: OCC well ownership transfers workbook
//!
//! # Example
//!
//! ```no_run
//! use pubdata_etl::{run_earthquakes, EtlConfig, PgDestination};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::from_env()?;
//!     let destination = PgDestination::new(&config.database_url);
//!
//!     let loaded = run_earthquakes(&config.earthquakes, &destination, 2.5).await?;
//!     println!("{loaded} earthquakes loaded");
//!     Ok(())
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod pipeline;
pub mod row;
pub mod sink;
pub mod value;

pub use config::{EtlConfig, SourceConfig};
pub use dataset::{DatasetDescriptor, DatasetKind};
pub use error::{EtlError, Result};
pub use pipeline::{
    run_dataset, run_earthquakes, run_oklahoma_wells, run_weather, run_well_transfers, Pipeline,
    RunReport,
};
pub use row::{Row, RowBuilder, Value};
pub use sink::{load, Destination, MemoryDestination, PgDestination};
