//! # solr-types
//!
//! Shared domain types for the solr-sync indexing pipeline.
//!
//! This crate defines the data structures used throughout the system:
//! - Content objects: duck-typed entities exposing named attributes
//! - Attribute values: strings, numbers, booleans, timestamps and sequences
//! - Settings: engine location and indexing behaviour
//!
//! ## Usage
//!
//! ```rust
//! use solr_types::{AttrValue, ContentObject, Document};
//!
//! let doc = Document::new()
//!     .with("id", "500")
//!     .with("name", "python test doc");
//! assert!(doc.has_attribute("name"));
//! assert_eq!(doc.attribute("id"), Some(AttrValue::from("500")));
//! ```

pub mod config;
pub mod content;
pub mod error;

pub use config::{Settings, DEFAULT_ACCESS_CONTROL_FIELD};
pub use content::{AttrValue, ContentObject, Document};
pub use error::SyncError;
