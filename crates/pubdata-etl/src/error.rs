//! Error type for the ETL pipelines

/// Result alias used throughout the ETL library
pub type Result<T> = std::result::Result<T, EtlError>;

/// Errors raised by a pipeline stage
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid text payload: {0}")]
    Encoding(String),

    #[error("Invalid workbook payload: {0}")]
    Workbook(String),

    #[error("Database unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    #[error("Write to {table} failed: {source}")]
    Write {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Row rejected by {table}: {reason}")]
    RowRejected { table: &'static str, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<calamine::XlsxError> for EtlError {
    fn from(err: calamine::XlsxError) -> Self {
        EtlError::Workbook(err.to_string())
    }
}

impl EtlError {
    /// True for errors raised while fetching or decoding a source payload
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            EtlError::Transport { .. }
                | EtlError::HttpStatus { .. }
                | EtlError::Io { .. }
                | EtlError::Json(_)
                | EtlError::Encoding(_)
                | EtlError::Workbook(_)
        )
    }
}
