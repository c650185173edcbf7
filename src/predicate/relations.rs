//! Relation records: one struct per relation kind
//!
//! A record references its subject through one of the exclusive subject
//! enums in `types`, so "both" or "neither" cannot be represented.

use super::types::{
    ArtifactInputSpec, BuilderInputSpec, LicenseInputSpec, PackageOrArtifact, PackageOrSource,
    PackageSourceOrArtifact, PkgInputSpec, PkgMatchType, SourceInputSpec, VulnerabilityInputSpec,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardCheck {
    pub check: String,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifyScorecardIngest {
    pub source: SourceInputSpec,
    pub checks: Vec<ScorecardCheck>,
    pub aggregate_score: f64,
    pub time_scanned: DateTime<Utc>,
    pub scorecard_version: String,
    pub scorecard_commit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Direct,
    Indirect,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsDependencyIngest {
    pub pkg: PkgInputSpec,
    pub dep_pkg: PkgInputSpec,
    pub dep_pkg_match: PkgMatchType,
    pub dependency_type: DependencyType,
    pub version_range: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsOccurrenceIngest {
    pub subject: PackageOrSource,
    pub artifact: ArtifactInputSpec,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlsaPredicateEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasSlsaIngest {
    pub artifact: ArtifactInputSpec,
    pub builder: BuilderInputSpec,
    pub materials: Vec<ArtifactInputSpec>,
    pub build_type: String,
    pub slsa_predicate: Vec<SlsaPredicateEntry>,
    pub slsa_version: String,
    pub started_on: Option<DateTime<Utc>>,
    pub finished_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifyVulnIngest {
    pub pkg: PkgInputSpec,
    pub vulnerability: VulnerabilityInputSpec,
    pub time_scanned: DateTime<Utc>,
    pub db_uri: String,
    pub db_version: String,
    pub scanner_uri: String,
    pub scanner_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnEqualIngest {
    pub vulnerability: VulnerabilityInputSpec,
    pub equal_vulnerability: VulnerabilityInputSpec,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasSourceAtIngest {
    pub pkg: PkgInputSpec,
    pub pkg_match: PkgMatchType,
    pub src: SourceInputSpec,
    pub known_since: DateTime<Utc>,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifyBadIngest {
    pub subject: PackageSourceOrArtifact,
    pub pkg_match: PkgMatchType,
    pub justification: String,
    pub known_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertifyGoodIngest {
    pub subject: PackageSourceOrArtifact,
    pub pkg_match: PkgMatchType,
    pub justification: String,
    pub known_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasSbomIngest {
    pub subject: PackageOrArtifact,
    pub uri: String,
    pub algorithm: String,
    pub digest: String,
    pub download_location: String,
    pub known_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashEqualIngest {
    pub artifact: ArtifactInputSpec,
    pub equal_artifact: ArtifactInputSpec,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PkgEqualIngest {
    pub pkg: PkgInputSpec,
    pub equal_pkg: PkgInputSpec,
    pub justification: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexStatus {
    NotAffected,
    Affected,
    Fixed,
    UnderInvestigation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VexIngest {
    pub subject: PackageOrArtifact,
    pub vulnerability: VulnerabilityInputSpec,
    pub status: VexStatus,
    pub vex_justification: String,
    pub statement: String,
    pub status_notes: String,
    pub known_since: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfContactIngest {
    pub subject: PackageSourceOrArtifact,
    pub pkg_match: PkgMatchType,
    pub email: String,
    pub info: String,
    pub since: DateTime<Utc>,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnMetadataIngest {
    pub vulnerability: VulnerabilityInputSpec,
    pub score_type: String,
    pub score_value: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasMetadataIngest {
    pub subject: PackageSourceOrArtifact,
    pub pkg_match: PkgMatchType,
    pub key: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
    pub justification: String,
}

/// The scalar fields of a legal certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyLegalInputSpec {
    pub declared_license: String,
    pub discovered_license: String,
    pub attribution: String,
    pub justification: String,
    pub time_scanned: DateTime<Utc>,
}

/// A legal certification about exactly one package or source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifyLegalIngest {
    pub subject: PackageOrSource,
    pub declared: Vec<LicenseInputSpec>,
    pub discovered: Vec<LicenseInputSpec>,
    pub certify_legal: CertifyLegalInputSpec,
}

impl CertifyLegalIngest {
    pub fn pkg(&self) -> Option<&PkgInputSpec> {
        self.subject.pkg()
    }

    pub fn src(&self) -> Option<&SourceInputSpec> {
        self.subject.src()
    }
}
