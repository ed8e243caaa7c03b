//! Row normalizers
//!
//! One adapter per source shape. Each walks the source records of a decoded
//! payload, drops records without an identity, and emits canonical rows for its
//! dataset. A malformed field becomes null; it never fails the batch.

pub mod earthquakes;
pub mod weather;
pub mod well_transfers;
pub mod wells;

pub use earthquakes::EarthquakeNormalizer;
pub use weather::WeatherNormalizer;
pub use well_transfers::WellTransferNormalizer;
pub use wells::WellRegistryNormalizer;

use crate::dataset::DatasetDescriptor;
use crate::error::{EtlError, Result};
use crate::fetch::{Payload, PayloadFormat};
use crate::row::Row;

/// Output of one normalization pass
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Records seen in the payload, kept or not
    pub records: usize,
    pub rows: Vec<Row>,
}

impl Normalized {
    pub fn dropped(&self) -> usize {
        self.records.saturating_sub(self.rows.len())
    }
}

/// Converts a decoded payload into canonical rows for one dataset
pub trait Normalizer: Send + Sync {
    fn dataset(&self) -> &'static DatasetDescriptor;

    /// The payload shape this adapter reads
    fn payload_format(&self) -> PayloadFormat;

    fn normalize_batch(&self, payload: &Payload) -> Result<Normalized>;

    fn normalize(&self, payload: &Payload) -> Result<Vec<Row>> {
        Ok(self.normalize_batch(payload)?.rows)
    }
}

pub(crate) fn unexpected_payload(dataset: &DatasetDescriptor, payload: &Payload) -> EtlError {
    EtlError::Config(format!(
        "{} normalizer cannot read a {:?} payload",
        dataset.name,
        payload.format()
    ))
}
