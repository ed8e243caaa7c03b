//! In-memory destination for dry runs and tests

use super::{validate_row, Destination};
use crate::dataset::DatasetDescriptor;
use crate::error::{EtlError, Result};
use crate::row::Row;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

type Table = BTreeMap<Vec<String>, Row>;

/// Keeps each table as key -> row, with the same upsert rules as PostgreSQL
#[derive(Debug, Default)]
pub struct MemoryDestination {
    tables: Mutex<HashMap<&'static str, Table>>,
    unreachable: bool,
    upsert_calls: AtomicUsize,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// A destination that fails every call with a connectivity error
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Stored rows for a table, ordered by key
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock()
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.lock().get(table).map_or(0, BTreeMap::len)
    }

    /// Number of `upsert` calls received, including failed ones
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, Table>> {
        // A panic mid-upsert never leaves a half-written table behind
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refuse(&self) -> Result<()> {
        if self.unreachable {
            return Err(EtlError::Connectivity(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "memory destination is configured as unreachable",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn check_connection(&self) -> Result<()> {
        self.refuse()
    }

    async fn upsert(&self, dataset: &'static DatasetDescriptor, rows: &[Row]) -> Result<usize> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.refuse()?;

        let mut tables = self.lock();
        let mut staged = tables.get(dataset.table).cloned().unwrap_or_default();

        for row in rows {
            validate_row(dataset, row)?;
            let key = row.key(dataset).ok_or_else(|| EtlError::RowRejected {
                table: dataset.table,
                reason: "row has no key".to_string(),
            })?;

            let merged = match staged.get(&key) {
                Some(existing) => existing.refreshed_from(row, dataset.refreshable_columns),
                None => row.clone(),
            };
            staged.insert(key, merged);
        }

        tables.insert(dataset.table, staged);
        debug!(table = dataset.table, rows = rows.len(), "Upsert committed in memory");
        Ok(rows.len())
    }
}
