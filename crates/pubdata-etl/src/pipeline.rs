//! Pipeline orchestration
//!
//! Every dataset runs the same linear sequence, failing fast at the first
//! stage error:
//!
//! ```text
//! connectivity check -> fetch -> normalize -> load
//! ```
//!
//! Nothing is checkpointed; a re-run starts from the top and relies on the
//! destination's upsert semantics to stay idempotent.

use crate::config::{EtlConfig, SourceConfig};
use crate::dataset::{DatasetDescriptor, DatasetKind};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::normalize::{
    EarthquakeNormalizer, Normalizer, WeatherNormalizer, WellRegistryNormalizer,
    WellTransferNormalizer,
};
use crate::sink::{self, Destination};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, info_span, Instrument};

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub dataset: &'static str,
    /// Source records seen in the payload
    pub fetched: usize,
    /// Rows that survived normalization
    pub normalized: usize,
    /// Rows written by the destination
    pub loaded: usize,
    pub elapsed: Duration,
}

/// One dataset's source plus the adapter that reads it
pub struct Pipeline {
    source: SourceConfig,
    normalizer: Box<dyn Normalizer>,
}

impl Pipeline {
    pub fn new(source: &SourceConfig, normalizer: impl Normalizer + 'static) -> Self {
        Self {
            source: source.clone(),
            normalizer: Box::new(normalizer),
        }
    }

    /// Pipeline for a dataset, using the matching source from `config`
    pub fn for_dataset(kind: DatasetKind, config: &EtlConfig) -> Self {
        let source = config.source(kind);
        match kind {
            DatasetKind::Earthquakes => {
                Self::new(source, EarthquakeNormalizer::new(config.min_magnitude))
            },
            DatasetKind::Weather => Self::new(source, WeatherNormalizer),
            DatasetKind::OklahomaWells => Self::new(source, WellRegistryNormalizer),
            DatasetKind::WellTransfers => Self::new(source, WellTransferNormalizer),
        }
    }

    pub fn dataset(&self) -> &'static DatasetDescriptor {
        self.normalizer.dataset()
    }

    pub async fn run(&self, destination: &dyn Destination) -> Result<RunReport> {
        let dataset = self.dataset();
        let span = info_span!("pipeline", dataset = dataset.name);
        self.run_stages(dataset, destination).instrument(span).await
    }

    async fn run_stages(
        &self,
        dataset: &'static DatasetDescriptor,
        destination: &dyn Destination,
    ) -> Result<RunReport> {
        let started = Instant::now();

        destination.check_connection().await?;

        info!(url = %self.source.url, "Extracting {}", dataset.name);
        let fetcher = Fetcher::new(self.source.clone())?;
        let payload = fetcher.fetch(self.normalizer.payload_format()).await?;

        let batch = self.normalizer.normalize_batch(&payload)?;
        drop(payload);
        info!(
            records = batch.records,
            rows = batch.rows.len(),
            dropped = batch.dropped(),
            "Transformed source records"
        );

        let loaded = sink::load(destination, dataset, &batch.rows).await?;

        let report = RunReport {
            dataset: dataset.name,
            fetched: batch.records,
            normalized: batch.rows.len(),
            loaded,
            elapsed: started.elapsed(),
        };
        info!(
            loaded,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pipeline complete"
        );
        Ok(report)
    }
}

/// Seismic events at or above `min_magnitude`
pub async fn run_earthquakes(
    source: &SourceConfig,
    destination: &dyn Destination,
    min_magnitude: f64,
) -> Result<usize> {
    let pipeline = Pipeline::new(source, EarthquakeNormalizer::new(min_magnitude));
    Ok(pipeline.run(destination).await?.loaded)
}

pub async fn run_weather(source: &SourceConfig, destination: &dyn Destination) -> Result<usize> {
    Ok(Pipeline::new(source, WeatherNormalizer).run(destination).await?.loaded)
}

pub async fn run_oklahoma_wells(
    source: &SourceConfig,
    destination: &dyn Destination,
) -> Result<usize> {
    Ok(Pipeline::new(source, WellRegistryNormalizer)
        .run(destination)
        .await?
        .loaded)
}

pub async fn run_well_transfers(
    source: &SourceConfig,
    destination: &dyn Destination,
) -> Result<usize> {
    Ok(Pipeline::new(source, WellTransferNormalizer)
        .run(destination)
        .await?
        .loaded)
}

/// Run one dataset with everything taken from `config`
pub async fn run_dataset(
    kind: DatasetKind,
    config: &EtlConfig,
    destination: &dyn Destination,
) -> Result<RunReport> {
    Pipeline::for_dataset(kind, config).run(destination).await
}
