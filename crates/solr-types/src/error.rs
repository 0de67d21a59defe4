//! Error types shared across solr-sync crates.

use thiserror::Error;

/// Errors raised while loading configuration or building domain values.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
