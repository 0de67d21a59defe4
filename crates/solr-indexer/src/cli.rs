//! CLI argument parsing for the indexer.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Solr indexer
///
/// Pushes JSON documents into a search engine and manages its index.
#[derive(Parser, Debug)]
#[command(name = "solr-indexer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/solr-sync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override engine host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Override engine port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Indexer commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and print the engine schema
    Schema,

    /// Add documents from a JSON file (one object or an array of objects)
    Index(DocumentArgs),

    /// Re-send documents from a JSON file
    Reindex(DocumentArgs),

    /// Delete documents by unique key
    Unindex {
        /// Identifiers to delete
        #[arg(required = true)]
        ids: Vec<String>,

        /// Commit after deleting
        #[arg(long)]
        commit: bool,
    },

    /// Make pending changes visible to searchers
    Commit,

    /// Commit and merge index segments
    Optimize,

    /// Print the effective configuration
    Config,
}

/// Arguments shared by index and reindex.
#[derive(clap::Args, Debug, Clone)]
pub struct DocumentArgs {
    /// JSON file with the documents
    pub file: PathBuf,

    /// Only send these fields (comma-separated); the unique key is always sent
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Commit after indexing
    #[arg(long)]
    pub commit: bool,
}
