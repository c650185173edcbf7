//! The predicate bundle: every relation list, always present
//!
//! Merging two bundles appends each list to its same-named counterpart.
//! `append` destructures its argument exhaustively, so adding a relation
//! kind without extending the merge fails to compile.

use super::relations::{
    CertifyBadIngest, CertifyGoodIngest, CertifyLegalIngest, CertifyScorecardIngest,
    CertifyVulnIngest, HasMetadataIngest, HasSbomIngest, HasSlsaIngest, HasSourceAtIngest,
    HashEqualIngest, IsDependencyIngest, IsOccurrenceIngest, PkgEqualIngest,
    PointOfContactIngest, VexIngest, VulnEqualIngest, VulnMetadataIngest,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the relation lists carried by [`IngestPredicates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    CertifyScorecard,
    IsDependency,
    IsOccurrence,
    HasSlsa,
    CertifyVuln,
    VulnEqual,
    HasSourceAt,
    CertifyBad,
    CertifyGood,
    HasSbom,
    HashEqual,
    PkgEqual,
    Vex,
    PointOfContact,
    VulnMetadata,
    HasMetadata,
    CertifyLegal,
}

impl RelationKind {
    pub const ALL: [RelationKind; 17] = [
        Self::CertifyScorecard,
        Self::IsDependency,
        Self::IsOccurrence,
        Self::HasSlsa,
        Self::CertifyVuln,
        Self::VulnEqual,
        Self::HasSourceAt,
        Self::CertifyBad,
        Self::CertifyGood,
        Self::HasSbom,
        Self::HashEqual,
        Self::PkgEqual,
        Self::Vex,
        Self::PointOfContact,
        Self::VulnMetadata,
        Self::HasMetadata,
        Self::CertifyLegal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CertifyScorecard => "certify_scorecard",
            Self::IsDependency => "is_dependency",
            Self::IsOccurrence => "is_occurrence",
            Self::HasSlsa => "has_slsa",
            Self::CertifyVuln => "certify_vuln",
            Self::VulnEqual => "vuln_equal",
            Self::HasSourceAt => "has_source_at",
            Self::CertifyBad => "certify_bad",
            Self::CertifyGood => "certify_good",
            Self::HasSbom => "has_sbom",
            Self::HashEqual => "hash_equal",
            Self::PkgEqual => "pkg_equal",
            Self::Vex => "vex",
            Self::PointOfContact => "point_of_contact",
            Self::VulnMetadata => "vuln_metadata",
            Self::HasMetadata => "has_metadata",
            Self::CertifyLegal => "certify_legal",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete set of typed relation lists.
///
/// List order is append order across merged documents; it carries no
/// meaning beyond debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestPredicates {
    pub certify_scorecard: Vec<CertifyScorecardIngest>,
    pub is_dependency: Vec<IsDependencyIngest>,
    pub is_occurrence: Vec<IsOccurrenceIngest>,
    pub has_slsa: Vec<HasSlsaIngest>,
    pub certify_vuln: Vec<CertifyVulnIngest>,
    pub vuln_equal: Vec<VulnEqualIngest>,
    pub has_source_at: Vec<HasSourceAtIngest>,
    pub certify_bad: Vec<CertifyBadIngest>,
    pub certify_good: Vec<CertifyGoodIngest>,
    pub has_sbom: Vec<HasSbomIngest>,
    pub hash_equal: Vec<HashEqualIngest>,
    pub pkg_equal: Vec<PkgEqualIngest>,
    pub vex: Vec<VexIngest>,
    pub point_of_contact: Vec<PointOfContactIngest>,
    pub vuln_metadata: Vec<VulnMetadataIngest>,
    pub has_metadata: Vec<HasMetadataIngest>,
    pub certify_legal: Vec<CertifyLegalIngest>,
}

impl IngestPredicates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every list of `other` onto the same-named list of `self`.
    pub fn append(&mut self, other: IngestPredicates) {
        let IngestPredicates {
            certify_scorecard,
            is_dependency,
            is_occurrence,
            has_slsa,
            certify_vuln,
            vuln_equal,
            has_source_at,
            certify_bad,
            certify_good,
            has_sbom,
            hash_equal,
            pkg_equal,
            vex,
            point_of_contact,
            vuln_metadata,
            has_metadata,
            certify_legal,
        } = other;

        self.certify_scorecard.extend(certify_scorecard);
        self.is_dependency.extend(is_dependency);
        self.is_occurrence.extend(is_occurrence);
        self.has_slsa.extend(has_slsa);
        self.certify_vuln.extend(certify_vuln);
        self.vuln_equal.extend(vuln_equal);
        self.has_source_at.extend(has_source_at);
        self.certify_bad.extend(certify_bad);
        self.certify_good.extend(certify_good);
        self.has_sbom.extend(has_sbom);
        self.hash_equal.extend(hash_equal);
        self.pkg_equal.extend(pkg_equal);
        self.vex.extend(vex);
        self.point_of_contact.extend(point_of_contact);
        self.vuln_metadata.extend(vuln_metadata);
        self.has_metadata.extend(has_metadata);
        self.certify_legal.extend(certify_legal);
    }

    /// Builder-style merge.
    pub fn merged(mut self, other: IngestPredicates) -> Self {
        self.append(other);
        self
    }

    /// Number of records in one relation list.
    pub fn len_of(&self, kind: RelationKind) -> usize {
        match kind {
            RelationKind::CertifyScorecard => self.certify_scorecard.len(),
            RelationKind::IsDependency => self.is_dependency.len(),
            RelationKind::IsOccurrence => self.is_occurrence.len(),
            RelationKind::HasSlsa => self.has_slsa.len(),
            RelationKind::CertifyVuln => self.certify_vuln.len(),
            RelationKind::VulnEqual => self.vuln_equal.len(),
            RelationKind::HasSourceAt => self.has_source_at.len(),
            RelationKind::CertifyBad => self.certify_bad.len(),
            RelationKind::CertifyGood => self.certify_good.len(),
            RelationKind::HasSbom => self.has_sbom.len(),
            RelationKind::HashEqual => self.hash_equal.len(),
            RelationKind::PkgEqual => self.pkg_equal.len(),
            RelationKind::Vex => self.vex.len(),
            RelationKind::PointOfContact => self.point_of_contact.len(),
            RelationKind::VulnMetadata => self.vuln_metadata.len(),
            RelationKind::HasMetadata => self.has_metadata.len(),
            RelationKind::CertifyLegal => self.certify_legal.len(),
        }
    }

    /// Total records across all lists.
    pub fn total(&self) -> usize {
        RelationKind::ALL.iter().map(|k| self.len_of(*k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Non-empty lists with their sizes, in declaration order.
    pub fn counts(&self) -> Vec<(RelationKind, usize)> {
        RelationKind::ALL
            .iter()
            .map(|k| (*k, self.len_of(*k)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}
