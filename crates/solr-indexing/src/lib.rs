//! Indexing operations for solr-sync.
//!
//! This crate turns content objects into engine update requests and sends
//! them over the connection layer in `solr-client`.
//!
//! ## Key Components
//!
//! - [`IndexQueueProcessor`]: `index`, `reindex`, `unindex`, `commit`,
//!   `optimize` and the network-free `prepare_data`
//! - [`DataPreparer`]: attribute selection and schema-driven value coercion
//! - [`request`]: XML bodies for add, delete, commit and optimize
//! - [`IndexError`]: failures tagged with the operation and document
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use solr_client::ConnectionManager;
//! use solr_indexing::IndexQueueProcessor;
//! use solr_types::{Document, Settings};
//!
//! let manager = Arc::new(ConnectionManager::new(Settings::load(None)?)?);
//! let processor = IndexQueueProcessor::new(manager);
//!
//! let doc = Document::new().with("id", "500").with("name", "python test doc");
//! processor.index(&doc, None)?;
//! processor.commit()?;
//! ```

pub mod error;
pub mod prepare;
pub mod processor;
pub mod request;

pub use error::{IndexError, MarshalError, Operation};
pub use prepare::{format_date, DataPreparer, PreparedData, DATE_FORMAT};
pub use processor::IndexQueueProcessor;
pub use request::CommitOptions;
