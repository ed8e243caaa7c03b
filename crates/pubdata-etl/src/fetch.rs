//! Source fetcher (HTTP and local files)
//!
//! One GET per attempt against the configured endpoint, with a per-source
//! timeout and a bounded number of fixed-delay retries. Decoding happens inside
//! the attempt, so an undecodable body is retried like a failed request.

use crate::config::SourceConfig;
use crate::error::{EtlError, Result};
use crate::value::RawValue;
use calamine::{Reader, Xlsx};
use reqwest::Client;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("pubdata-etl/", env!("CARGO_PKG_VERSION"));

/// How a source body should be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Text,
    /// `.xlsx` workbook; first worksheet, header row discarded
    Workbook,
}

/// A decoded source body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    Text(String),
    /// Data rows of the first worksheet, positions aligned to column A
    Workbook(Vec<Vec<RawValue>>),
}

impl Payload {
    pub fn format(&self) -> PayloadFormat {
        match self {
            Payload::Json(_) => PayloadFormat::Json,
            Payload::Text(_) => PayloadFormat::Text,
            Payload::Workbook(_) => PayloadFormat::Workbook,
        }
    }
}

/// Fetches one source with retry
pub struct Fetcher {
    client: Client,
    config: SourceConfig,
}

impl Fetcher {
    pub fn new(config: SourceConfig) -> Result<Self> {
        config.validate().map_err(EtlError::Config)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| EtlError::Transport {
                url: config.url.clone(),
                source,
            })?;

        Ok(Fetcher { client, config })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Fetch and decode, retrying up to `max_retries` times
    pub async fn fetch(&self, format: PayloadFormat) -> Result<Payload> {
        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempt = 1;

        loop {
            match self.fetch_once(format).await {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        url = %self.config.url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Fetch attempt failed, retrying in {}s",
                        self.config.retry_delay_secs
                    );
                    tokio::time::sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                    attempt += 1;
                },
                Err(e) => {
                    warn!(
                        url = %self.config.url,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Fetch attempt failed, giving up"
                    );
                    return Err(e);
                },
            }
        }
    }

    async fn fetch_once(&self, format: PayloadFormat) -> Result<Payload> {
        let bytes = if self.config.url.starts_with("file://") {
            self.read_local().await?
        } else {
            self.download().await?
        };

        info!(
            url = %self.config.url,
            bytes = bytes.len(),
            "Fetched {} KB",
            bytes.len() / 1024
        );

        decode(&bytes, format)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let url = &self.config.url;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| EtlError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::HttpStatus {
                url: url.clone(),
                status,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| EtlError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    async fn read_local(&self) -> Result<Vec<u8>> {
        let path = url::Url::parse(&self.config.url)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| EtlError::Config(format!("Invalid file URL '{}'", self.config.url)))?;

        tokio::fs::read(&path).await.map_err(|source| EtlError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Decode a raw body into the requested payload shape
pub fn decode(bytes: &[u8], format: PayloadFormat) -> Result<Payload> {
    match format {
        PayloadFormat::Json => Ok(Payload::Json(serde_json::from_slice(bytes)?)),
        PayloadFormat::Text => String::from_utf8(bytes.to_vec())
            .map(Payload::Text)
            .map_err(|e| EtlError::Encoding(e.to_string())),
        PayloadFormat::Workbook => decode_workbook(bytes).map(Payload::Workbook),
    }
}

/// Rows of the first worksheet, skipping the header (sheet row 1).
///
/// calamine trims leading empty rows and columns from a range; rows are padded
/// back out so that index 0 is always column A.
pub fn decode_workbook(bytes: &[u8]) -> Result<Vec<Vec<RawValue>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::Workbook("workbook has no worksheets".to_string()))??;

    let Some((first_row, first_col)) = range.start() else {
        return Ok(Vec::new());
    };
    let pad = first_col as usize;

    let rows = range
        .rows()
        .enumerate()
        .filter(|(i, _)| first_row as usize + i > 0)
        .map(|(_, cells)| {
            let mut values = vec![RawValue::Null; pad];
            values.extend(cells.iter().map(RawValue::from));
            values
        })
        .collect::<Vec<_>>();

    debug!(rows = rows.len(), "Decoded worksheet");
    Ok(rows)
}
