//! Error types for the connection layer.

use thiserror::Error;

/// Failures reaching the engine or using a connection handle.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The manager is switched off and a caller asked for a live connection
    #[error("Indexing is inactive: no engine connection available")]
    Inactive,

    /// Engine settings are unusable
    #[error("Invalid connection settings: {0}")]
    Config(String),

    /// The handle was closed; a fresh one must be requested
    #[error("Connection {0} has been closed")]
    Closed(String),

    /// The handle belongs to another thread
    #[error("Connection {id} belongs to thread {owner}, used from {caller}")]
    ForeignThread {
        id: String,
        owner: String,
        caller: String,
    },

    /// HTTP client failure (unreachable, refused, timed out)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A scripted transport received a request it had no response for
    #[error("Unexpected request: {0}")]
    Unexpected(String),

    /// Any other transport failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Failures fetching or parsing the engine schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema request could not be sent
    #[error("Schema fetch failed: {0}")]
    Fetch(#[from] ConnectionError),

    /// The engine answered with a non-success HTTP status
    #[error("Schema request returned HTTP {0}")]
    Status(u16),

    /// The body is not a usable schema document
    #[error("Malformed schema: {0}")]
    Malformed(String),
}

/// Failures interpreting an update response.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// HTTP status outside 2xx
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The engine reported a non-zero status
    #[error("Engine status {status}: {message}")]
    Rejected { status: i64, message: String },

    /// No status indicator could be found
    #[error("Malformed response: {0}")]
    Malformed(String),
}
