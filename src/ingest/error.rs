//! Errors surfaced by the ingest entry points
//!
//! Every variant carries enough document context (format, type, provenance)
//! to diagnose the failure without re-running.

use super::config::ConfigError;
use super::sink::SinkError;
use crate::document::{DocumentFormat, DocumentType, TreeError};
use crate::parser::{DispatchError, ParseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unable to process doc {source_info} (format: {format}, type: {doc_type}): {source}")]
    Process {
        format: DocumentFormat,
        doc_type: DocumentType,
        source_info: String,
        #[source]
        source: TreeError,
    },
    #[error("no parser registered for format {format}, type {doc_type}")]
    Dispatch {
        format: DocumentFormat,
        doc_type: DocumentType,
    },
    #[error("unable to ingest doc tree: {doc_type} document ({format}) from {source_info}: {source}")]
    Parse {
        format: DocumentFormat,
        doc_type: DocumentType,
        source_info: String,
        #[source]
        source: ParseError,
    },
    #[error("error assembling graphs for {source_info}: {source}")]
    Sink {
        source_info: String,
        #[source]
        source: SinkError,
    },
    #[error("ingest cancelled before {stage}")]
    Cancelled { stage: &'static str },
    #[error("invalid ingest config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl From<DispatchError> for IngestError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NoParser { format, doc_type } => IngestError::Dispatch { format, doc_type },
            DispatchError::Parse {
                format,
                doc_type,
                source_info,
                source,
            } => IngestError::Parse {
                format,
                doc_type,
                source_info,
                source,
            },
        }
    }
}
