//! Dispatcher: walks a document tree and runs one parser per node
//!
//! Container nodes are skipped. Any node without a registered parser, or
//! whose parser fails, aborts the whole tree.

use super::registry::ParserRegistry;
use super::traits::{IdentifierStrings, ParseError, TrustInformation};
use crate::document::{DocumentFormat, DocumentTree, DocumentType};
use crate::ingest::IngestContext;
use crate::predicate::IngestPredicates;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no parser registered for format {format}, type {doc_type}")]
    NoParser {
        format: DocumentFormat,
        doc_type: DocumentType,
    },
    #[error("unable to parse {doc_type} document ({format}) from {source_info}: {source}")]
    Parse {
        format: DocumentFormat,
        doc_type: DocumentType,
        source_info: String,
        #[source]
        source: ParseError,
    },
}

/// Everything extracted from one document tree.
#[derive(Debug, Clone, Default)]
pub struct ParsedTree {
    /// One bundle per parsed node, in pre-order
    pub bundles: Vec<IngestPredicates>,
    pub identifiers: Vec<IdentifierStrings>,
    pub identities: Vec<TrustInformation>,
}

impl ParsedTree {
    /// All node bundles merged into the document-level bundle.
    pub fn merged(&self) -> IngestPredicates {
        self.bundles
            .iter()
            .cloned()
            .fold(IngestPredicates::new(), IngestPredicates::merged)
    }
}

/// Parse every non-container node of `tree`.
pub fn parse_document_tree(
    ctx: &IngestContext,
    registry: &ParserRegistry,
    tree: &DocumentTree,
) -> Result<ParsedTree, DispatchError> {
    let mut parsed = ParsedTree::default();

    for document in tree.documents() {
        if document.doc_type.is_container() {
            continue;
        }

        let mut parser = registry
            .create(document.format, document.doc_type)
            .ok_or(DispatchError::NoParser {
                format: document.format,
                doc_type: document.doc_type,
            })?;

        let wrap = |source: ParseError| DispatchError::Parse {
            format: document.format,
            doc_type: document.doc_type,
            source_info: document.source_information.to_string(),
            source,
        };

        parser.parse(ctx, document).map_err(wrap)?;

        parsed.bundles.push(parser.predicates(ctx));
        parsed.identities.extend(parser.identities(ctx));

        match parser.identifiers(ctx) {
            Ok(ids) if ids.is_empty() => {}
            Ok(ids) => parsed.identifiers.push(ids),
            Err(ParseError::NotImplemented { capability, doc_type }) => {
                debug!(parent: &ctx.span, %doc_type, capability, "parser reports no identifiers");
            }
            Err(e) => return Err(wrap(e)),
        }
    }

    Ok(parsed)
}
