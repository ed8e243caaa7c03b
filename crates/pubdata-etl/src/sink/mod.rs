//! Idempotent sinks
//!
//! A [`Destination`] writes a batch of rows for one dataset as a single unit:
//! insert new keys, refresh only the dataset's refreshable columns for keys
//! that already exist, and commit nothing if any row fails.

pub mod memory;
pub mod postgres;

pub use memory::MemoryDestination;
pub use postgres::PgDestination;

use crate::dataset::DatasetDescriptor;
use crate::error::{EtlError, Result};
use crate::row::Row;
use async_trait::async_trait;
use tracing::{debug, info};

/// Storage seam for loaded rows
#[async_trait]
pub trait Destination: Send + Sync {
    /// Human-readable target for logs; never contains credentials
    fn describe(&self) -> String;

    /// Fail fast with [`EtlError::Connectivity`] when the store is unreachable
    async fn check_connection(&self) -> Result<()>;

    /// Upsert all rows in one transaction; returns the number of rows written
    async fn upsert(&self, dataset: &'static DatasetDescriptor, rows: &[Row]) -> Result<usize>;
}

/// Load a batch; an empty batch never touches the destination
pub async fn load(
    destination: &dyn Destination,
    dataset: &'static DatasetDescriptor,
    rows: &[Row],
) -> Result<usize> {
    if rows.is_empty() {
        debug!(table = dataset.table, "No rows to load");
        return Ok(0);
    }

    info!(
        table = dataset.table,
        rows = rows.len(),
        destination = %destination.describe(),
        "Loading rows"
    );

    let written = destination.upsert(dataset, rows).await?;

    info!(table = dataset.table, rows = written, "Load committed");
    Ok(written)
}

/// Shape and identity checks shared by every destination
pub(crate) fn validate_row(dataset: &'static DatasetDescriptor, row: &Row) -> Result<()> {
    let expected = dataset.columns.iter().map(|c| c.name);
    if !row.columns().eq(expected) {
        return Err(EtlError::RowRejected {
            table: dataset.table,
            reason: "row columns do not match the table".to_string(),
        });
    }

    for key in dataset.key_columns {
        if row.get(key).map_or(true, |v| v.is_null()) {
            return Err(EtlError::RowRejected {
                table: dataset.table,
                reason: format!("key column {key} is null"),
            });
        }
    }

    Ok(())
}
