//! Graph nouns referenced by relation records
//!
//! Packages, sources, artifacts, licenses, vulnerabilities and builders.
//! Each noun exposes a canonical `key()` used by sinks to deduplicate
//! entities across records and flushes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `key=value` package-URL qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageQualifier {
    pub key: String,
    pub value: String,
}

/// A package identity, as parsed from a package URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PkgInputSpec {
    pub pkg_type: String,
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<String>,
    /// Sorted by key.
    pub qualifiers: Vec<PackageQualifier>,
    pub subpath: Option<String>,
}

impl PkgInputSpec {
    pub fn new(pkg_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pkg_type: pkg_type.into(),
            namespace: None,
            name: name.into(),
            version: None,
            qualifiers: Vec::new(),
            subpath: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Canonical package-URL rendering.
    pub fn key(&self) -> String {
        let mut out = format!("pkg:{}/", self.pkg_type);
        if let Some(ns) = &self.namespace {
            out.push_str(ns);
            out.push('/');
        }
        out.push_str(&self.name);
        if let Some(version) = &self.version {
            out.push('@');
            out.push_str(version);
        }
        if !self.qualifiers.is_empty() {
            let pairs: Vec<String> = self
                .qualifiers
                .iter()
                .map(|q| format!("{}={}", q.key, q.value))
                .collect();
            out.push('?');
            out.push_str(&pairs.join("&"));
        }
        if let Some(subpath) = &self.subpath {
            out.push('#');
            out.push_str(subpath);
        }
        out
    }
}

impl fmt::Display for PkgInputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A source repository identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInputSpec {
    /// Repository kind, e.g. "git"
    pub src_type: String,
    /// Host plus owning path, e.g. "github.com/guacsec"
    pub namespace: String,
    pub name: String,
    pub tag: Option<String>,
    pub commit: Option<String>,
}

impl SourceInputSpec {
    /// Build a source from already-split location parts.
    ///
    /// A revision that looks like a full commit hash is stored as the commit;
    /// anything else non-empty is stored as a tag.
    pub fn from_location(
        src_type: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        revision: Option<&str>,
    ) -> Self {
        let mut spec = Self {
            src_type: src_type.into(),
            namespace: namespace.into(),
            name: name.into(),
            tag: None,
            commit: None,
        };
        match revision {
            Some(rev) if is_commit_hash(rev) => spec.commit = Some(rev.to_lowercase()),
            Some(rev) if !rev.is_empty() => spec.tag = Some(rev.to_string()),
            _ => {}
        }
        spec
    }

    /// Canonical locator rendering: `type+namespace/name[@rev]`.
    pub fn key(&self) -> String {
        let mut out = format!("{}+{}/{}", self.src_type, self.namespace, self.name);
        if let Some(rev) = self.commit.as_ref().or(self.tag.as_ref()) {
            out.push('@');
            out.push_str(rev);
        }
        out
    }
}

impl fmt::Display for SourceInputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

fn is_commit_hash(rev: &str) -> bool {
    matches!(rev.len(), 40 | 64) && rev.chars().all(|c| c.is_ascii_hexdigit())
}

/// A content-addressed artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactInputSpec {
    pub algorithm: String,
    pub digest: String,
}

impl ArtifactInputSpec {
    pub fn new(algorithm: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into().to_lowercase(),
            digest: digest.into().to_lowercase(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.algorithm, self.digest)
    }
}

/// A license identifier, optionally carrying inline text for custom refs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LicenseInputSpec {
    pub name: String,
    pub inline: Option<String>,
    pub list_version: Option<String>,
}

impl LicenseInputSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inline: None,
            list_version: None,
        }
    }

    pub fn key(&self) -> String {
        match &self.list_version {
            Some(v) => format!("{}:{}", self.name, v),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VulnerabilityInputSpec {
    /// e.g. "cve", "ghsa", "osv", or "novuln"
    pub vuln_type: String,
    pub vulnerability_id: String,
}

impl VulnerabilityInputSpec {
    pub fn new(vuln_type: impl Into<String>, vulnerability_id: impl Into<String>) -> Self {
        Self {
            vuln_type: vuln_type.into().to_lowercase(),
            vulnerability_id: vulnerability_id.into().to_lowercase(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.vuln_type, self.vulnerability_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuilderInputSpec {
    pub uri: String,
}

/// How broadly a package reference should match existing graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PkgMatchType {
    #[default]
    SpecificVersion,
    AllVersions,
}

/// Exactly one of a package or a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOrSource {
    Package(PkgInputSpec),
    Source(SourceInputSpec),
}

impl PackageOrSource {
    pub fn pkg(&self) -> Option<&PkgInputSpec> {
        match self {
            Self::Package(p) => Some(p),
            Self::Source(_) => None,
        }
    }

    pub fn src(&self) -> Option<&SourceInputSpec> {
        match self {
            Self::Source(s) => Some(s),
            Self::Package(_) => None,
        }
    }
}

/// Exactly one of a package or an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageOrArtifact {
    Package(PkgInputSpec),
    Artifact(ArtifactInputSpec),
}

/// Exactly one of a package, a source, or an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageSourceOrArtifact {
    Package(PkgInputSpec),
    Source(SourceInputSpec),
    Artifact(ArtifactInputSpec),
}

impl From<PackageOrSource> for PackageSourceOrArtifact {
    fn from(subject: PackageOrSource) -> Self {
        match subject {
            PackageOrSource::Package(p) => Self::Package(p),
            PackageOrSource::Source(s) => Self::Source(s),
        }
    }
}
