//! Predicate data model
//!
//! Typed relation records grouped into a structurally complete bundle,
//! plus the locator and license helpers parsers use to build them.

mod bundle;
pub mod license;
mod purl;
mod relations;
mod source;
mod types;

pub use bundle::{IngestPredicates, RelationKind};
pub use purl::{purl_to_pkg, LocatorError};
pub use relations::{
    CertifyBadIngest, CertifyGoodIngest, CertifyLegalIngest, CertifyLegalInputSpec,
    CertifyScorecardIngest, CertifyVulnIngest, DependencyType, HasMetadataIngest, HasSbomIngest,
    HasSlsaIngest, HasSourceAtIngest, HashEqualIngest, IsDependencyIngest, IsOccurrenceIngest,
    PkgEqualIngest, PointOfContactIngest, ScorecardCheck, SlsaPredicateEntry, VexIngest,
    VexStatus, VulnEqualIngest, VulnMetadataIngest,
};
pub use source::locator_to_source;
pub use types::{
    ArtifactInputSpec, BuilderInputSpec, LicenseInputSpec, PackageOrArtifact, PackageOrSource,
    PackageQualifier, PackageSourceOrArtifact, PkgInputSpec, PkgMatchType, SourceInputSpec,
    VulnerabilityInputSpec,
};
