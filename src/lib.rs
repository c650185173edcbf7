//! attestgraph: supply-chain attestation ingestion
//!
//! Turns attestation documents (license scans, SBOMs, provenance, ...) into
//! typed graph predicates and bulk-writes them to a graph store.
//!
//! # Pipeline
//!
//! - **Tree builder**: expands a document into its embedded sub-documents
//! - **Dispatcher**: runs one registered parser per tree node
//! - **Accumulator**: merges predicate bundles and flushes them in batches
//! - **Sink**: performs the bulk write and returns assigned ids
//!
//! # Example
//!
//! ```
//! use attestgraph::{IngestContext, Ingestor, SqliteSink};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sink = Arc::new(SqliteSink::open_in_memory().unwrap());
//! let report = Ingestor::new(sink)
//!     .merged_ingest(&IngestContext::detached(), &[])
//!     .await
//!     .unwrap();
//! assert_eq!(report.flushes, 1);
//! # });
//! ```

pub mod document;
pub mod ingest;
pub mod parser;
pub mod predicate;
pub mod storage;

pub use document::{Document, DocumentFormat, DocumentTree, DocumentType, SourceInformation, TreeBuilder};
pub use ingest::{
    BatchReport, CancellationToken, IngestConfig, IngestContext, IngestError, IngestedIds, Ingestor,
    PredicateSink, SinkError,
};
pub use parser::{DocumentParser, ParserRegistry};
pub use predicate::{IngestPredicates, RelationKind};
pub use storage::SqliteSink;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
