//! pubdata ETL - public dataset loader

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pubdata_common::logging::{init_logging, LogConfig, LogLevel};
use pubdata_etl::{
    run_dataset, DatasetKind, Destination, EtlConfig, MemoryDestination, PgDestination,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "pubdata-etl")]
#[command(author, version, about = "Load public datasets into PostgreSQL")]
struct Cli {
    /// Dataset to load
    #[command(subcommand)]
    command: Command,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Fetch and normalize, but keep rows in memory instead of writing them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// USGS earthquake feed
    Earthquakes {
        /// Override the feed URL
        #[arg(long)]
        source_url: Option<String>,

        /// Drop events below this magnitude
        #[arg(long)]
        min_magnitude: Option<f64>,
    },

    /// Open-Meteo hourly forecast
    Weather {
        /// Override the forecast URL
        #[arg(long)]
        source_url: Option<String>,
    },

    /// OCC well registry CSV
    Wells {
        /// Override the CSV URL
        #[arg(long)]
        source_url: Option<String>,
    },

    /// OCC well transfers workbook
    WellTransfers {
        /// Override the workbook URL
        #[arg(long)]
        source_url: Option<String>,
    },

    /// Every dataset, one after another
    All,
}

impl Command {
    fn datasets(&self) -> Vec<DatasetKind> {
        match self {
            Command::Earthquakes { .. } => vec![DatasetKind::Earthquakes],
            Command::Weather { .. } => vec![DatasetKind::Weather],
            Command::Wells { .. } => vec![DatasetKind::OklahomaWells],
            Command::WellTransfers { .. } => vec![DatasetKind::WellTransfers],
            Command::All => DatasetKind::ALL.to_vec(),
        }
    }

    /// Apply per-command flags on top of the environment configuration
    fn apply(&self, config: &mut EtlConfig) {
        let (kind, source_url) = match self {
            Command::Earthquakes {
                source_url,
                min_magnitude,
            } => {
                if let Some(min) = min_magnitude {
                    config.min_magnitude = *min;
                }
                (DatasetKind::Earthquakes, source_url)
            },
            Command::Weather { source_url } => (DatasetKind::Weather, source_url),
            Command::Wells { source_url } => (DatasetKind::OklahomaWells, source_url),
            Command::WellTransfers { source_url } => (DatasetKind::WellTransfers, source_url),
            Command::All => return,
        };
        if let Some(url) = source_url {
            config.source_mut(kind).url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env-backed flags
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env().context("Invalid logging configuration")?;
    if cli.verbose {
        log_config.level = LogLevel::Debug;
    }
    let _log_guard = init_logging(&log_config)?;

    let mut config = EtlConfig::from_env()?;
    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }
    cli.command.apply(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let destination: Box<dyn Destination> = if cli.dry_run {
        warn!("Dry run: rows are kept in memory and discarded on exit");
        Box::new(MemoryDestination::new())
    } else {
        Box::new(PgDestination::new(&config.database_url))
    };

    let mut failed = Vec::new();
    for kind in cli.command.datasets() {
        match run_dataset(kind, &config, destination.as_ref()).await {
            Ok(report) => info!(
                dataset = report.dataset,
                fetched = report.fetched,
                normalized = report.normalized,
                loaded = report.loaded,
                "Dataset loaded"
            ),
            Err(e) => {
                error!(dataset = %kind, error = %e, "Dataset failed");
                failed.push(kind.to_string());
            },
        }
    }

    if !failed.is_empty() {
        bail!("{} dataset(s) failed: {}", failed.len(), failed.join(", "));
    }

    info!("Load complete");
    Ok(())
}
