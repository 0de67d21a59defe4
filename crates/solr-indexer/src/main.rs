//! Solr Indexer
//!
//! Keeps a search engine's index in step with JSON content.
//!
//! # Usage
//!
//! ```bash
//! solr-indexer schema
//! solr-indexer index docs.json [--fields id,title] [--commit]
//! solr-indexer unindex 500 501 --commit
//! solr-indexer commit
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/solr-sync/config.toml)
//! 3. Environment variables (SOLR_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use solr_indexer::{run, Cli};

fn main() -> Result<()> {
    run(Cli::parse())
}
