//! Ingestion: batching parsed predicates into the sink
//!
//! An [`Ingestor`] drives documents through tree building and parser
//! dispatch, merges the resulting bundles in an [`Accumulator`], and flushes
//! them to a [`PredicateSink`]. Discovered identifiers go to an
//! [`IdentifierEmitter`] on a best-effort basis.

mod accumulator;
mod config;
mod context;
mod emitter;
mod error;
mod pipeline;
mod sink;

#[cfg(test)]
mod integration_tests;

pub use accumulator::Accumulator;
pub use config::{ConfigError, IngestConfig, DEFAULT_FLUSH_THRESHOLD};
pub use context::{CancellationToken, IngestContext};
pub use emitter::{
    collect_entries, CollectDataType, CollectEntry, CollectRegistrar, CollectSubEmitter,
    EmitterError, IdentifierEmitter, NoopEmitter,
};
pub use error::IngestError;
pub use pipeline::{BatchReport, Ingestor};
pub use sink::{IngestedIds, PredicateSink, SinkError};
