//! Error types for the indexing operations.

use std::fmt;

use solr_client::{ConnectionError, ResponseError, SchemaError};
use thiserror::Error;

/// Public operations of the queue processor, for error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Index,
    Reindex,
    Unindex,
    Commit,
    Optimize,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Index => "index",
            Operation::Reindex => "reindex",
            Operation::Unindex => "unindex",
            Operation::Commit => "commit",
            Operation::Optimize => "optimize",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that has no wire representation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("field '{field}': {reason}")]
pub struct MarshalError {
    pub field: String,
    pub reason: String,
}

impl MarshalError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failures of index, reindex, unindex, commit and optimize.
///
/// `target` names what the operation acted on, e.g. `document 500` or
/// `index` for commits.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The request could not be delivered
    #[error("{operation} failed for {target}: {source}")]
    Connection {
        operation: Operation,
        target: String,
        #[source]
        source: ConnectionError,
    },

    /// The schema needed to marshal the object was unavailable
    #[error("{operation} failed for {target}: {source}")]
    Schema {
        operation: Operation,
        target: String,
        #[source]
        source: SchemaError,
    },

    /// The engine rejected the request or answered with garbage
    #[error("{operation} failed for {target}: {source}")]
    Response {
        operation: Operation,
        target: String,
        #[source]
        source: ResponseError,
    },

    /// An attribute value could not be marshalled
    #[error("{operation} failed for {target}: cannot marshal {source}")]
    Marshal {
        operation: Operation,
        target: String,
        #[source]
        source: MarshalError,
    },

    /// The object carries no identifier
    #[error("{operation} failed: object has no value for unique key '{key}'")]
    MissingKey { operation: Operation, key: String },

    /// Network operation on a processor without a connection manager
    #[error("{operation} failed: processor is not bound to a connection manager")]
    Unbound { operation: Operation },
}

impl IndexError {
    pub fn operation(&self) -> Operation {
        match self {
            IndexError::Connection { operation, .. }
            | IndexError::Schema { operation, .. }
            | IndexError::Response { operation, .. }
            | IndexError::Marshal { operation, .. }
            | IndexError::MissingKey { operation, .. }
            | IndexError::Unbound { operation } => *operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::Response {
            operation: Operation::Index,
            target: "document 500".to_string(),
            source: ResponseError::Rejected {
                status: 400,
                message: "unknown field 'bogus'".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "index failed for document 500: Engine status 400: unknown field 'bogus'"
        );

        let err = IndexError::MissingKey {
            operation: Operation::Unindex,
            key: "id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unindex failed: object has no value for unique key 'id'"
        );
    }

    #[test]
    fn test_marshal_error_display() {
        let err = IndexError::Marshal {
            operation: Operation::Reindex,
            target: "document 7".to_string(),
            source: MarshalError::new("price", "non-finite number NaN"),
        };
        assert_eq!(
            err.to_string(),
            "reindex failed for document 7: cannot marshal field 'price': non-finite number NaN"
        );
        assert_eq!(err.operation(), Operation::Reindex);
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = IndexError::Connection {
            operation: Operation::Commit,
            target: "index".to_string(),
            source: ConnectionError::Inactive,
        };
        assert!(err.source().is_some());
        assert_eq!(err.operation(), Operation::Commit);
    }
}
