//! Engine connection layer for solr-sync.
//!
//! This crate provides:
//! - [`ConnectionManager`]: one lazily-created connection per thread, an
//!   "active" switch and the shared schema cache
//! - [`Schema`]: field name to type/multiplicity metadata parsed from the
//!   engine's schema.xml
//! - [`Transport`]: the request/response channel, with a blocking HTTP
//!   implementation and a scripted [`mock::MockTransport`]
//!
//! # Example
//!
//! ```rust,no_run
//! use solr_client::ConnectionManager;
//! use solr_types::Settings;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings { active: true, ..Settings::default() };
//!     let manager = ConnectionManager::new(settings)?;
//!
//!     if let Some(schema) = manager.get_schema()? {
//!         println!("unique key: {:?}", schema.unique_key());
//!     }
//!     manager.close_connection();
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod manager;
pub mod mock;
pub mod response;
pub mod schema;
pub mod transport;

pub use connection::SolrConnection;
pub use error::{ConnectionError, ResponseError, SchemaError};
pub use manager::ConnectionManager;
pub use response::{parse_update_response, EngineStatus};
pub use schema::{FieldInfo, FieldKind, Schema};
pub use transport::{
    HttpTransport, HttpTransportFactory, Method, SolrRequest, SolrResponse, Transport,
    TransportFactory,
};
