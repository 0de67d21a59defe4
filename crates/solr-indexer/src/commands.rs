//! Command implementations for the indexer.
//!
//! Handles:
//! - schema: fetch the engine schema and print its fields
//! - index/reindex: push JSON documents, optionally restricted to some fields
//! - unindex: delete documents by unique key
//! - commit/optimize: index directives
//! - config: print the effective settings

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use solr_client::ConnectionManager;
use solr_indexing::IndexQueueProcessor;
use solr_types::{Document, Settings};

use crate::cli::{Cli, Commands, DocumentArgs};

/// Load configuration and apply CLI overrides (highest precedence).
///
/// `active` is left as configured; `run` switches it on only for commands
/// that talk to the engine.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(
        &mut settings,
        cli.log_level.as_deref(),
        cli.host.as_deref(),
        cli.port,
    );
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

fn apply_overrides(
    settings: &mut Settings,
    log_level: Option<&str>,
    host: Option<&str>,
    port: Option<u16>,
) {
    if let Some(log_level) = log_level {
        settings.log_level = log_level.to_string();
    }
    if let Some(host) = host {
        settings.host = host.to_string();
    }
    if let Some(port) = port {
        settings.port = port;
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Run one CLI invocation.
pub fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(&cli)?;
    init_logging(&settings)?;

    if let Commands::Config = cli.command {
        print!("{}", render_config(&settings)?);
        return Ok(());
    }

    // Every other command exists to reach the engine.
    settings.active = true;

    info!(
        engine = %settings.base_url(),
        base = %settings.base,
        "Connecting to engine"
    );
    let manager =
        Arc::new(ConnectionManager::new(settings).context("Failed to create connection manager")?);
    let processor = IndexQueueProcessor::new(Arc::clone(&manager));

    let result = match cli.command {
        Commands::Schema => show_schema(&manager),
        Commands::Index(args) => index_documents(&processor, &args, false),
        Commands::Reindex(args) => index_documents(&processor, &args, true),
        Commands::Unindex { ids, commit } => unindex_ids(&manager, &processor, &ids, commit),
        Commands::Commit => run_directive(&processor, false),
        Commands::Optimize => run_directive(&processor, true),
        Commands::Config => Ok(()),
    };

    manager.close_connection();
    result
}

fn show_schema(manager: &ConnectionManager) -> Result<()> {
    let schema = manager
        .get_schema()
        .context("Failed to fetch schema")?
        .context("Engine access is inactive")?;

    println!("Schema: {} fields", schema.len());
    if let Some(key) = schema.unique_key() {
        println!("Unique key: {}", key);
    }
    if let Some(field) = schema.default_search_field() {
        println!("Default search field: {}", field);
    }
    println!();
    for field in schema.fields() {
        let mut flags = Vec::new();
        if field.multi_valued {
            flags.push("multi");
        }
        if field.required {
            flags.push("required");
        }
        println!(
            "  {:<24} {:<8} {:<12} {}",
            field.name,
            field.kind.as_str(),
            field.type_name,
            flags.join(",")
        );
    }
    Ok(())
}

fn index_documents(
    processor: &IndexQueueProcessor,
    args: &DocumentArgs,
    reindex: bool,
) -> Result<()> {
    let documents = read_documents(&args.file)?;
    if documents.is_empty() {
        warn!(file = %args.file.display(), "No documents to index");
        return Ok(());
    }

    let fields: Vec<&str> = args.fields.iter().map(String::as_str).collect();
    let attributes = if fields.is_empty() {
        None
    } else {
        Some(fields.as_slice())
    };

    for (i, doc) in documents.iter().enumerate() {
        let result = if reindex {
            processor.reindex(doc, attributes)
        } else {
            processor.index(doc, attributes)
        };
        result.with_context(|| format!("Document #{} in {}", i + 1, args.file.display()))?;
    }

    let verb = if reindex { "Reindexed" } else { "Indexed" };
    println!("{} {} document(s)", verb, documents.len());

    if args.commit {
        run_directive(processor, false)?;
    }
    Ok(())
}

fn unindex_ids(
    manager: &ConnectionManager,
    processor: &IndexQueueProcessor,
    ids: &[String],
    commit: bool,
) -> Result<()> {
    let key = match manager.get_schema().context("Failed to fetch schema")? {
        Some(schema) => schema
            .unique_key()
            .map(str::to_string)
            .unwrap_or_else(|| manager.settings().unique_key_fallback.clone()),
        None => manager.settings().unique_key_fallback.clone(),
    };

    for id in ids {
        let doc = Document::new().with(key.as_str(), id.as_str());
        processor.unindex(&doc)?;
    }
    println!("Unindexed {} document(s)", ids.len());

    if commit {
        run_directive(processor, false)?;
    }
    Ok(())
}

fn run_directive(processor: &IndexQueueProcessor, optimize: bool) -> Result<()> {
    if optimize {
        processor.optimize()?;
        println!("Optimized");
    } else {
        processor.commit()?;
        println!("Committed");
    }
    Ok(())
}

/// Read documents from a JSON file holding one object or an array of them.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Document::from_json(item)
                    .with_context(|| format!("Entry #{} in {}", i + 1, path.display()))
            })
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![Document::from_json(&value)?]),
        _ => bail!(
            "{} must contain a JSON object or an array of objects",
            path.display()
        ),
    }
}

/// Effective settings as TOML.
pub fn render_config(settings: &Settings) -> Result<String> {
    toml::to_string_pretty(settings).context("Failed to render configuration")
}
