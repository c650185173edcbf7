//! Identifier emission: forwarding discovered locators to collection
//!
//! Emission is best-effort. Callers log an `EmitterError` and carry on;
//! nothing here is ever fatal to ingestion.

use crate::parser::IdentifierStrings;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("collect registrar error: {0}")]
    Registrar(String),
}

/// What kind of locator a collect entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectDataType {
    Git,
    Oci,
    Purl,
    GithubRelease,
}

/// One locator to be fetched by the collection subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectEntry {
    pub kind: CollectDataType,
    pub value: String,
    /// Only collect data newer than this
    pub since: DateTime<Utc>,
}

/// Convert identifier strings into collect entries.
///
/// Order follows the input; repeats of the same (kind, value) are dropped.
/// Unclassified strings have no collector and are skipped.
pub fn collect_entries(identifiers: &[IdentifierStrings], since: DateTime<Utc>) -> Vec<CollectEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for ids in identifiers {
        let typed = [
            (CollectDataType::Git, &ids.vcs_strings),
            (CollectDataType::Purl, &ids.purl_strings),
            (CollectDataType::Oci, &ids.oci_strings),
            (CollectDataType::GithubRelease, &ids.github_release_strings),
        ];
        for (kind, values) in typed {
            for value in values {
                if seen.insert((kind, value.as_str())) {
                    entries.push(CollectEntry {
                        kind,
                        value: value.clone(),
                        since,
                    });
                }
            }
        }
    }
    entries
}

/// The downstream collection registrar.
#[async_trait]
pub trait CollectRegistrar: Send + Sync {
    async fn add_collect_entries(&self, entries: &[CollectEntry]) -> Result<(), EmitterError>;
}

/// Forwards the identifiers accumulated by an ingest run.
#[async_trait]
pub trait IdentifierEmitter: Send + Sync {
    async fn emit(&self, identifiers: &[IdentifierStrings]) -> Result<(), EmitterError>;
}

/// Emitter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmitter;

#[async_trait]
impl IdentifierEmitter for NoopEmitter {
    async fn emit(&self, _identifiers: &[IdentifierStrings]) -> Result<(), EmitterError> {
        Ok(())
    }
}

/// Emitter backed by an optional collect registrar.
#[derive(Clone, Default)]
pub struct CollectSubEmitter {
    registrar: Option<Arc<dyn CollectRegistrar>>,
}

impl CollectSubEmitter {
    pub fn new(registrar: Arc<dyn CollectRegistrar>) -> Self {
        Self {
            registrar: Some(registrar),
        }
    }

    /// An emitter with no registrar configured.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.registrar.is_some()
    }
}

#[async_trait]
impl IdentifierEmitter for CollectSubEmitter {
    async fn emit(&self, identifiers: &[IdentifierStrings]) -> Result<(), EmitterError> {
        let Some(registrar) = &self.registrar else {
            return Ok(());
        };
        let entries = collect_entries(identifiers, Utc::now());
        if entries.is_empty() {
            return Ok(());
        }
        registrar.add_collect_entries(&entries).await
    }
}
