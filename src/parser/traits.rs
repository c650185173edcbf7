//! DocumentParser trait: the contract every format parser implements
//!
//! A parser owns the state of one document: `parse` fills it, the three
//! getters read it. Parsers are constructed fresh per document by the
//! registry and `parse` resets any prior state regardless.

use crate::document::{Document, DocumentType};
use crate::ingest::IngestContext;
use crate::predicate::{IngestPredicates, LocatorError, RelationKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a single document. All are terminal for it.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to decode {doc_type} document: {source}")]
    Decode {
        doc_type: DocumentType,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse uri '{locator}' to a package or source: {source}")]
    SubjectResolution {
        locator: String,
        #[source]
        source: LocatorError,
    },
    #[error("package nor source specified for {predicate}")]
    MissingSubject { predicate: RelationKind },
    #[error("{capability} not implemented for {doc_type} documents")]
    NotImplemented {
        capability: &'static str,
        doc_type: DocumentType,
    },
}

/// Identity or signer information carried by a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustInformation {
    pub issuer: String,
    pub identity: String,
    pub verified: bool,
}

/// Artifact locators discovered while parsing, used to seed collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierStrings {
    pub oci_strings: Vec<String>,
    pub vcs_strings: Vec<String>,
    pub purl_strings: Vec<String>,
    pub github_release_strings: Vec<String>,
    pub unclassified_strings: Vec<String>,
}

impl IdentifierStrings {
    pub fn len(&self) -> usize {
        self.oci_strings.len()
            + self.vcs_strings.len()
            + self.purl_strings.len()
            + self.github_release_strings.len()
            + self.unclassified_strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The capability set every document parser provides.
pub trait DocumentParser: Send {
    /// Decode `document` and build its predicates, replacing prior state.
    ///
    /// On error no partial state is kept.
    fn parse(&mut self, ctx: &IngestContext, document: &Document) -> Result<(), ParseError>;

    /// Predicates built by the last successful `parse`.
    fn predicates(&self, ctx: &IngestContext) -> IngestPredicates;

    /// Trust information from the last document; may be empty.
    fn identities(&self, ctx: &IngestContext) -> Vec<TrustInformation>;

    /// Identifiers discovered in the last document.
    ///
    /// Formats that never report identifiers return
    /// `ParseError::NotImplemented` rather than an empty set.
    fn identifiers(&self, ctx: &IngestContext) -> Result<IdentifierStrings, ParseError>;
}
