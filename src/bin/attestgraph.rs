//! attestgraph CLI: ingest attestation documents into a local graph.
//!
//! Usage:
//!   attestgraph ingest <paths...> --type <type> [--format f] [--db path]
//!                      [--flush-threshold n] [--config file]
//!   attestgraph ingest-one <path> --type <type> [--format f] [--db path]

use attestgraph::{
    Document, DocumentFormat, DocumentType, IngestConfig, IngestContext, Ingestor, SourceInformation,
    SqliteSink,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "attestgraph",
    version,
    about = "Ingest supply-chain attestations into a knowledge graph"
)]
struct Cli {
    /// Log filter (e.g. "debug", "attestgraph=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every file under the given paths as one merged batch
    Ingest {
        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Document type of every input (e.g. clearlydefined, bundle)
        #[arg(long = "type")]
        doc_type: DocumentType,
        /// Document format; guessed from the payload when omitted
        #[arg(long)]
        format: Option<DocumentFormat>,
        /// Path to SQLite database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Merged bundles per sink flush
        #[arg(long)]
        flush_threshold: Option<usize>,
        /// YAML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Ingest a single document and print the ids assigned to it
    IngestOne {
        path: PathBuf,
        #[arg(long = "type")]
        doc_type: DocumentType,
        #[arg(long)]
        format: Option<DocumentFormat>,
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Get the default database path (~/.local/share/attestgraph/attestgraph.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("attestgraph").join("attestgraph.db")
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_sink(db: Option<PathBuf>) -> Result<Arc<SqliteSink>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let sink = SqliteSink::open(&db_path)
        .map_err(|e| format!("Failed to open database {}: {}", db_path.display(), e))?;
    Ok(Arc::new(sink))
}

fn read_document(path: &Path, doc_type: DocumentType, format: DocumentFormat) -> Result<Document, String> {
    let blob = std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    Ok(Document::new(
        blob,
        format,
        doc_type,
        SourceInformation::new("file", path.display().to_string()),
    ))
}

/// Every regular file under `paths`, in a stable order.
fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    for root in paths {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| format!("Failed to walk {}: {}", root.display(), e))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn load_config(config: Option<&Path>, flush_threshold: Option<usize>) -> Result<IngestConfig, String> {
    let mut loaded = match config {
        Some(path) => IngestConfig::from_yaml_file(path).map_err(|e| e.to_string())?,
        None => IngestConfig::default(),
    };
    if let Some(threshold) = flush_threshold {
        loaded = loaded.with_flush_threshold(threshold);
    }
    loaded.validate().map_err(|e| e.to_string())?;
    Ok(loaded)
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("failed to create tokio runtime: {}", e))
}

fn cmd_ingest(
    paths: &[PathBuf],
    doc_type: DocumentType,
    format: DocumentFormat,
    db: Option<PathBuf>,
    config: IngestConfig,
) -> Result<(), String> {
    let documents = collect_files(paths)?
        .iter()
        .map(|path| read_document(path, doc_type, format))
        .collect::<Result<Vec<_>, _>>()?;

    let ingestor = Ingestor::new(open_sink(db)?).with_config(config);
    let span = tracing::info_span!("merged_ingest", documents = documents.len());
    let ctx = IngestContext::new(span);

    let report = runtime()?
        .block_on(ingestor.merged_ingest(&ctx, &documents))
        .map_err(|e| e.to_string())?;

    println!(
        "Ingested {} documents ({} bundles) in {} flushes, {:.2?}",
        report.documents, report.bundles_merged, report.flushes, report.elapsed
    );
    println!(
        "  {} nouns, {} relations",
        report.ids.noun_count(),
        report.ids.relation_count()
    );
    for (kind, ids) in &report.ids.relations {
        println!("  {:<20} {:>7}", kind.as_str(), ids.len());
    }
    Ok(())
}

fn cmd_ingest_one(
    path: &Path,
    doc_type: DocumentType,
    format: DocumentFormat,
    db: Option<PathBuf>,
) -> Result<(), String> {
    let document = read_document(path, doc_type, format)?;
    let ingestor = Ingestor::new(open_sink(db)?);
    let span = tracing::info_span!("ingest", source = %document.source_information);
    let ctx = IngestContext::new(span);

    let ids = runtime()?
        .block_on(ingestor.ingest(&ctx, &document))
        .map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&ids).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Ingest {
            paths,
            doc_type,
            format,
            db,
            flush_threshold,
            config,
        } => load_config(config.as_deref(), flush_threshold)
            .and_then(|config| cmd_ingest(&paths, doc_type, format.unwrap_or_default(), db, config)),
        Commands::IngestOne {
            path,
            doc_type,
            format,
            db,
        } => cmd_ingest_one(&path, doc_type, format.unwrap_or_default(), db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
