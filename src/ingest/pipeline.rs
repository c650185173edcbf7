//! The ingest entry points
//!
//! `ingest` runs one document end to end. `merged_ingest` runs a sequence
//! of documents through one accumulator, flushing every `flush_threshold`
//! merged bundles and once more, unconditionally, at the end.
//!
//! Per document: build tree → dispatch parsers → merge. Identifier emission
//! is best-effort and its failure is logged, never returned.

use super::accumulator::Accumulator;
use super::config::IngestConfig;
use super::context::IngestContext;
use super::emitter::{IdentifierEmitter, NoopEmitter};
use super::error::IngestError;
use super::sink::{IngestedIds, PredicateSink};
use crate::document::{Document, TreeBuilder};
use crate::parser::{parse_document_tree, IdentifierStrings, ParsedTree, ParserRegistry};
use crate::predicate::IngestPredicates;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of a successful batch ingest.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub documents: usize,
    /// Bundles merged into the accumulator; one per parsed tree node
    pub bundles_merged: usize,
    /// Sink calls made, including the final one
    pub flushes: usize,
    pub ids: IngestedIds,
    pub elapsed: Duration,
}

/// The ingestion pipeline.
///
/// Holds no per-run state, so one instance can serve concurrent calls.
/// Accumulators, parsers, and identifier lists live inside each call.
pub struct Ingestor {
    tree_builder: TreeBuilder,
    registry: ParserRegistry,
    sink: Arc<dyn PredicateSink>,
    emitter: Arc<dyn IdentifierEmitter>,
    config: IngestConfig,
}

impl Ingestor {
    /// Pipeline with the built-in unpackers and parsers and no emitter.
    pub fn new(sink: Arc<dyn PredicateSink>) -> Self {
        Self {
            tree_builder: TreeBuilder::with_defaults(),
            registry: ParserRegistry::with_defaults(),
            sink,
            emitter: Arc::new(NoopEmitter),
            config: IngestConfig::default(),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn IdentifierEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_registry(mut self, registry: ParserRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tree_builder(mut self, tree_builder: TreeBuilder) -> Self {
        self.tree_builder = tree_builder;
        self
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest one document and return the ids the sink assigned.
    pub async fn ingest(
        &self,
        ctx: &IngestContext,
        document: &Document,
    ) -> Result<IngestedIds, IngestError> {
        let start = Instant::now();

        let parsed = self.process(ctx, document)?;
        let predicates = parsed.merged();

        self.emit(ctx, &parsed.identifiers).await;

        let source_info = document.source_information.source.clone();
        let ids = self.flush(ctx, &predicates, &source_info).await?;

        info!(
            parent: &ctx.span,
            elapsed_ms = start.elapsed().as_millis() as u64,
            source = %document.source_information,
            "completed doc"
        );
        Ok(ids)
    }

    /// Ingest a sequence of documents in order through one accumulator.
    ///
    /// A sink failure aborts the run; flushes made before it stay committed.
    pub async fn merged_ingest(
        &self,
        ctx: &IngestContext,
        documents: &[Document],
    ) -> Result<BatchReport, IngestError> {
        self.config.validate()?;
        let start = Instant::now();
        let batch_info = format!("batch of {} documents", documents.len());

        let mut accumulator = Accumulator::new(self.config.flush_threshold);
        let mut identifiers: Vec<IdentifierStrings> = Vec::new();
        let mut report = BatchReport {
            documents: documents.len(),
            ..Default::default()
        };

        info!(parent: &ctx.span, documents = documents.len(), "starting merged ingest");

        for (index, document) in documents.iter().enumerate() {
            let parsed = self.process(ctx, document)?;
            debug!(
                parent: &ctx.span,
                index,
                bundles = parsed.bundles.len(),
                source = %document.source_information,
                "document parsed"
            );

            for bundle in parsed.bundles {
                report.bundles_merged += 1;
                if accumulator.merge(ctx, bundle) {
                    let batch = accumulator.take();
                    let ids = self.flush(ctx, &batch, &batch_info).await?;
                    report.ids.extend(ids);
                    report.flushes += 1;
                }
            }
            identifiers.extend(parsed.identifiers);
        }

        self.emit(ctx, &identifiers).await;

        let remaining = accumulator.take();
        let ids = self.flush(ctx, &remaining, &batch_info).await?;
        report.ids.extend(ids);
        report.flushes += 1;

        report.elapsed = start.elapsed();
        info!(
            parent: &ctx.span,
            elapsed_ms = report.elapsed.as_millis() as u64,
            documents = report.documents,
            flushes = report.flushes,
            "completed docs"
        );
        Ok(report)
    }

    /// Build the document tree and run the parsers over it.
    fn process(&self, ctx: &IngestContext, document: &Document) -> Result<ParsedTree, IngestError> {
        ctx.check_cancelled("document")?;

        let tree = self
            .tree_builder
            .build(document)
            .map_err(|source| IngestError::Process {
                format: document.format,
                doc_type: document.doc_type,
                source_info: document.source_information.to_string(),
                source,
            })?;

        Ok(parse_document_tree(ctx, &self.registry, &tree)?)
    }

    async fn flush(
        &self,
        ctx: &IngestContext,
        predicates: &IngestPredicates,
        source_info: &str,
    ) -> Result<IngestedIds, IngestError> {
        ctx.check_cancelled("flush")?;

        info!(parent: &ctx.span, relations = predicates.total(), "calling assembler");
        self.sink
            .assemble(predicates)
            .await
            .map_err(|source| IngestError::Sink {
                source_info: source_info.to_string(),
                source,
            })
    }

    async fn emit(&self, ctx: &IngestContext, identifiers: &[IdentifierStrings]) {
        if let Err(e) = self.emitter.emit(identifiers).await {
            warn!(parent: &ctx.span, error = %e, "unable to create collect entries, continuing");
        }
    }
}
