//! pubdata Common Library
//!
//! Shared logging setup and error handling for the pubdata workspace.
//!
//! - **Logging**: `tracing` subscriber configuration driven by `LOG_*` environment variables
//! - **Error Handling**: the shared error and result types
//!
//! # Example
//!
//! ```no_run
//! use pubdata_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> pubdata_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     let _guard = init_logging(&config)?;
//!
//!     info!("Pipeline starting");
//!     Ok(())
//! }
//! ```
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;

pub use error::{PubdataError, Result};
