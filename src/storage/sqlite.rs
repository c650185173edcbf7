//! SQLite-backed bulk assembler
//!
//! Nouns (packages, sources, artifacts, licenses, vulnerabilities) are
//! stored once per canonical key; relation records are stored as JSON
//! bodies tagged with their relation kind. Each flush is one transaction.

use crate::ingest::{IngestedIds, PredicateSink, SinkError};
use crate::predicate::{
    ArtifactInputSpec, IngestPredicates, LicenseInputSpec, PackageOrArtifact, PackageOrSource,
    PackageSourceOrArtifact, PkgInputSpec, RelationKind, SourceInputSpec, VulnerabilityInputSpec,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NounKind {
    Package,
    Source,
    Artifact,
    License,
    Vulnerability,
}

impl NounKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Source => "source",
            Self::Artifact => "artifact",
            Self::License => "license",
            Self::Vulnerability => "vulnerability",
        }
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(e: rusqlite::Error) -> Self {
        SinkError::Storage(e.to_string())
    }
}

/// Nouns referenced by a bundle, in first-seen order, without repeats.
#[derive(Default)]
struct NounSet {
    seen: HashSet<(NounKind, String)>,
    nouns: Vec<(NounKind, String, serde_json::Value)>,
}

impl NounSet {
    fn add<T: Serialize>(&mut self, kind: NounKind, key: String, body: &T) -> Result<(), SinkError> {
        if self.seen.insert((kind, key.clone())) {
            self.nouns.push((kind, key, serde_json::to_value(body)?));
        }
        Ok(())
    }

    fn pkg(&mut self, pkg: &PkgInputSpec) -> Result<(), SinkError> {
        self.add(NounKind::Package, pkg.key(), pkg)
    }

    fn src(&mut self, src: &SourceInputSpec) -> Result<(), SinkError> {
        self.add(NounKind::Source, src.key(), src)
    }

    fn artifact(&mut self, artifact: &ArtifactInputSpec) -> Result<(), SinkError> {
        self.add(NounKind::Artifact, artifact.key(), artifact)
    }

    fn license(&mut self, license: &LicenseInputSpec) -> Result<(), SinkError> {
        self.add(NounKind::License, license.key(), license)
    }

    fn vuln(&mut self, vuln: &VulnerabilityInputSpec) -> Result<(), SinkError> {
        self.add(NounKind::Vulnerability, vuln.key(), vuln)
    }

    fn pkg_or_src(&mut self, subject: &PackageOrSource) -> Result<(), SinkError> {
        match subject {
            PackageOrSource::Package(p) => self.pkg(p),
            PackageOrSource::Source(s) => self.src(s),
        }
    }

    fn pkg_or_artifact(&mut self, subject: &PackageOrArtifact) -> Result<(), SinkError> {
        match subject {
            PackageOrArtifact::Package(p) => self.pkg(p),
            PackageOrArtifact::Artifact(a) => self.artifact(a),
        }
    }

    fn any_subject(&mut self, subject: &PackageSourceOrArtifact) -> Result<(), SinkError> {
        match subject {
            PackageSourceOrArtifact::Package(p) => self.pkg(p),
            PackageSourceOrArtifact::Source(s) => self.src(s),
            PackageSourceOrArtifact::Artifact(a) => self.artifact(a),
        }
    }

    fn collect(p: &IngestPredicates) -> Result<Self, SinkError> {
        let mut set = Self::default();
        for r in &p.certify_scorecard {
            set.src(&r.source)?;
        }
        for r in &p.is_dependency {
            set.pkg(&r.pkg)?;
            set.pkg(&r.dep_pkg)?;
        }
        for r in &p.is_occurrence {
            set.pkg_or_src(&r.subject)?;
            set.artifact(&r.artifact)?;
        }
        for r in &p.has_slsa {
            set.artifact(&r.artifact)?;
            for m in &r.materials {
                set.artifact(m)?;
            }
        }
        for r in &p.certify_vuln {
            set.pkg(&r.pkg)?;
            set.vuln(&r.vulnerability)?;
        }
        for r in &p.vuln_equal {
            set.vuln(&r.vulnerability)?;
            set.vuln(&r.equal_vulnerability)?;
        }
        for r in &p.has_source_at {
            set.pkg(&r.pkg)?;
            set.src(&r.src)?;
        }
        for r in &p.certify_bad {
            set.any_subject(&r.subject)?;
        }
        for r in &p.certify_good {
            set.any_subject(&r.subject)?;
        }
        for r in &p.has_sbom {
            set.pkg_or_artifact(&r.subject)?;
        }
        for r in &p.hash_equal {
            set.artifact(&r.artifact)?;
            set.artifact(&r.equal_artifact)?;
        }
        for r in &p.pkg_equal {
            set.pkg(&r.pkg)?;
            set.pkg(&r.equal_pkg)?;
        }
        for r in &p.vex {
            set.pkg_or_artifact(&r.subject)?;
            set.vuln(&r.vulnerability)?;
        }
        for r in &p.point_of_contact {
            set.any_subject(&r.subject)?;
        }
        for r in &p.vuln_metadata {
            set.vuln(&r.vulnerability)?;
        }
        for r in &p.has_metadata {
            set.any_subject(&r.subject)?;
        }
        for r in &p.certify_legal {
            set.pkg_or_src(&r.subject)?;
            for l in r.declared.iter().chain(&r.discovered) {
                set.license(l)?;
            }
        }
        Ok(set)
    }
}

/// SQLite-backed predicate sink
///
/// Thread-safe via an internal mutex on the connection, so one sink can be
/// shared across concurrent ingest calls.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    fn init_schema(conn: &Connection) -> Result<(), SinkError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS nouns (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                key TEXT NOT NULL,
                body_json TEXT NOT NULL,
                UNIQUE (kind, key)
            );

            CREATE TABLE IF NOT EXISTS predicates (
                id INTEGER PRIMARY KEY,
                kind TEXT NOT NULL,
                body_json TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_predicates_kind ON predicates(kind);

            -- Readers are not blocked by a flush in progress
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Open or create a sink at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| SinkError::Storage(e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SinkError> {
        self.conn
            .lock()
            .map_err(|_| SinkError::Storage("connection mutex poisoned".into()))
    }

    /// Stored records of one relation kind
    pub fn relation_count(&self, kind: RelationKind) -> Result<usize, SinkError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM predicates WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Distinct stored nouns of one kind
    pub fn noun_count(&self, kind: NounKind) -> Result<usize, SinkError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM nouns WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn write_bundle(&self, predicates: &IngestPredicates) -> Result<IngestedIds, SinkError> {
        let nouns = NounSet::collect(predicates)?;
        let records = serde_json::to_value(predicates)?;
        let ingested_at = chrono::Utc::now().to_rfc3339();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut ids = IngestedIds::new();

        for (kind, key, body) in &nouns.nouns {
            let id = upsert_noun(&tx, *kind, key, body)?;
            let list = match kind {
                NounKind::Package => &mut ids.packages,
                NounKind::Source => &mut ids.sources,
                NounKind::Artifact => &mut ids.artifacts,
                NounKind::License => &mut ids.licenses,
                NounKind::Vulnerability => &mut ids.vulnerabilities,
            };
            list.push(format!("{}:{}", kind.as_str(), id));
        }

        for kind in RelationKind::ALL {
            let Some(list) = records.get(kind.as_str()).and_then(|v| v.as_array()) else {
                continue;
            };
            for record in list {
                tx.execute(
                    "INSERT INTO predicates (kind, body_json, ingested_at) VALUES (?1, ?2, ?3)",
                    params![kind.as_str(), record.to_string(), ingested_at],
                )?;
                ids.relations
                    .entry(kind)
                    .or_default()
                    .push(format!("{}:{}", kind.as_str(), tx.last_insert_rowid()));
            }
        }

        tx.commit()?;
        Ok(ids)
    }
}

fn upsert_noun(
    tx: &Transaction<'_>,
    kind: NounKind,
    key: &str,
    body: &serde_json::Value,
) -> Result<i64, SinkError> {
    tx.execute(
        "INSERT INTO nouns (kind, key, body_json) VALUES (?1, ?2, ?3) ON CONFLICT(kind, key) DO NOTHING",
        params![kind.as_str(), key, body.to_string()],
    )?;
    let id = tx.query_row(
        "SELECT id FROM nouns WHERE kind = ?1 AND key = ?2",
        params![kind.as_str(), key],
        |row| row.get(0),
    )?;
    Ok(id)
}

#[async_trait]
impl PredicateSink for SqliteSink {
    async fn assemble(&self, predicates: &IngestPredicates) -> Result<IngestedIds, SinkError> {
        self.write_bundle(predicates)
    }
}
