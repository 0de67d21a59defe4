//! Indexer library exports.
//!
//! This crate provides the `solr-indexer` binary for solr-sync.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (schema, index, unindex, commit, ...)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, DocumentArgs};
pub use commands::{init_logging, load_settings, read_documents, render_config, run};
