//! Tree builder: expands a document into its embedded documents
//!
//! Expansion is delegated to per-type `Unpacker`s. Any failure at any
//! level aborts the whole tree; partial trees are never returned.

use super::types::{Document, DocumentFormat, DocumentTree, DocumentType, SourceInformation};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("malformed {format} payload in {doc_type} document: {source}")]
    Decode {
        format: DocumentFormat,
        doc_type: DocumentType,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to unpack {doc_type} document: {reason}")]
    Unpack { doc_type: DocumentType, reason: String },
    #[error("document nesting exceeds {0} levels")]
    DepthExceeded(usize),
}

/// Extracts the documents embedded in a container document.
pub trait Unpacker: Send + Sync {
    fn unpack(&self, document: &Document) -> Result<Vec<Document>, TreeError>;
}

/// Builds document trees using registered unpackers.
///
/// Documents whose type has no unpacker are leaves.
#[derive(Clone)]
pub struct TreeBuilder {
    unpackers: HashMap<DocumentType, Arc<dyn Unpacker>>,
    max_depth: usize,
}

impl TreeBuilder {
    /// A builder with no unpackers; every document is a leaf.
    pub fn new() -> Self {
        Self {
            unpackers: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// A builder that understands bundle documents.
    pub fn with_defaults() -> Self {
        let mut builder = Self::new();
        builder.register(DocumentType::Bundle, Arc::new(BundleUnpacker));
        builder
    }

    pub fn register(&mut self, doc_type: DocumentType, unpacker: Arc<dyn Unpacker>) {
        self.unpackers.insert(doc_type, unpacker);
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Build the tree for `document`.
    pub fn build(&self, document: &Document) -> Result<DocumentTree, TreeError> {
        self.expand(document.clone(), 0)
    }

    fn expand(&self, document: Document, depth: usize) -> Result<DocumentTree, TreeError> {
        if depth > self.max_depth {
            return Err(TreeError::DepthExceeded(self.max_depth));
        }
        let document = validate_format(document)?;

        let Some(unpacker) = self.unpackers.get(&document.doc_type) else {
            return Ok(DocumentTree::leaf(document));
        };

        let children = unpacker
            .unpack(&document)?
            .into_iter()
            .map(|child| self.expand(child, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentTree { document, children })
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Check JSON payloads decode, and settle unknown formats that do.
fn validate_format(mut document: Document) -> Result<Document, TreeError> {
    match document.format {
        DocumentFormat::Json => {
            serde_json::from_slice::<serde::de::IgnoredAny>(&document.blob).map_err(|source| {
                TreeError::Decode {
                    format: document.format,
                    doc_type: document.doc_type,
                    source,
                }
            })?;
        }
        DocumentFormat::Unknown => {
            if serde_json::from_slice::<serde::de::IgnoredAny>(&document.blob).is_ok() {
                document.format = DocumentFormat::Json;
            }
        }
        DocumentFormat::JsonLines | DocumentFormat::Xml => {}
    }
    Ok(document)
}

#[derive(Debug, Deserialize)]
struct BundlePayload {
    documents: Vec<EmbeddedDocument>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedDocument {
    #[serde(default)]
    format: DocumentFormat,
    #[serde(rename = "type")]
    doc_type: DocumentType,
    #[serde(default)]
    source: Option<String>,
    payload: serde_json::Value,
}

/// Unpacks `{"documents": [{"format", "type", "source", "payload"}]}`.
///
/// A string payload is taken as the raw embedded blob; any other JSON value
/// is re-serialized. Children without a source inherit the parent's.
pub struct BundleUnpacker;

impl Unpacker for BundleUnpacker {
    fn unpack(&self, document: &Document) -> Result<Vec<Document>, TreeError> {
        let bundle: BundlePayload =
            serde_json::from_slice(&document.blob).map_err(|source| TreeError::Decode {
                format: document.format,
                doc_type: document.doc_type,
                source,
            })?;

        bundle
            .documents
            .into_iter()
            .enumerate()
            .map(|(index, embedded)| {
                let blob = match embedded.payload {
                    serde_json::Value::String(raw) => raw.into_bytes(),
                    other => serde_json::to_vec(&other).map_err(|e| TreeError::Unpack {
                        doc_type: document.doc_type,
                        reason: e.to_string(),
                    })?,
                };
                let parent = &document.source_information;
                let source_information = SourceInformation {
                    collector: parent.collector.clone(),
                    source: embedded.source.unwrap_or_else(|| parent.source.clone()),
                    document_ref: format!("{}#{}", parent.document_ref, index),
                };
                Ok(Document::new(
                    blob,
                    embedded.format,
                    embedded.doc_type,
                    source_information,
                ))
            })
            .collect()
    }
}
