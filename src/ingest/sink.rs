//! PredicateSink trait and the ids a flush returns
//!
//! The sink is the bulk assembler: it receives one predicate bundle per
//! flush and writes it to the graph. `assemble()` is async, and the batcher
//! awaits each call before continuing.

use crate::predicate::{IngestPredicates, RelationKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from a bulk write.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("bundle rejected: {0}")]
    Rejected(String),
}

/// Graph ids assigned by one or more flushes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestedIds {
    pub packages: Vec<String>,
    pub sources: Vec<String>,
    pub artifacts: Vec<String>,
    pub licenses: Vec<String>,
    pub vulnerabilities: Vec<String>,
    /// Relation ids keyed by relation kind; kinds with no records are absent
    pub relations: BTreeMap<RelationKind, Vec<String>>,
}

impl IngestedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the ids from a later flush into this set.
    pub fn extend(&mut self, other: IngestedIds) {
        self.packages.extend(other.packages);
        self.sources.extend(other.sources);
        self.artifacts.extend(other.artifacts);
        self.licenses.extend(other.licenses);
        self.vulnerabilities.extend(other.vulnerabilities);
        for (kind, ids) in other.relations {
            self.relations.entry(kind).or_default().extend(ids);
        }
    }

    pub fn relation_ids(&self, kind: RelationKind) -> &[String] {
        self.relations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn noun_count(&self) -> usize {
        self.packages.len()
            + self.sources.len()
            + self.artifacts.len()
            + self.licenses.len()
            + self.vulnerabilities.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.noun_count() == 0 && self.relation_count() == 0
    }
}

/// The bulk assembler the pipeline flushes into.
///
/// Shared across concurrent pipeline invocations, so implementations must
/// be safe for concurrent use. An empty bundle is a valid flush.
#[async_trait]
pub trait PredicateSink: Send + Sync {
    async fn assemble(&self, predicates: &IngestPredicates) -> Result<IngestedIds, SinkError>;
}
