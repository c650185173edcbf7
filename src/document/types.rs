//! Documents and document trees

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload encoding of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    JsonLines,
    Xml,
    #[default]
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::JsonLines => "jsonlines",
            Self::Xml => "xml",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "jsonlines" | "jsonl" => Ok(Self::JsonLines),
            "xml" => Ok(Self::Xml),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown document format '{}'", other)),
        }
    }
}

/// What a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// ClearlyDefined legal-certification attestation
    ClearlyDefined,
    /// Container of embedded documents
    Bundle,
    Slsa,
    Spdx,
    CycloneDx,
    OpenVex,
    Scorecard,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClearlyDefined => "clearlydefined",
            Self::Bundle => "bundle",
            Self::Slsa => "slsa",
            Self::Spdx => "spdx",
            Self::CycloneDx => "cyclonedx",
            Self::OpenVex => "openvex",
            Self::Scorecard => "scorecard",
            Self::Unknown => "unknown",
        }
    }

    /// Container documents only hold other documents and yield no predicates.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Bundle)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clearlydefined" | "clearly-defined" => Ok(Self::ClearlyDefined),
            "bundle" => Ok(Self::Bundle),
            "slsa" => Ok(Self::Slsa),
            "spdx" => Ok(Self::Spdx),
            "cyclonedx" => Ok(Self::CycloneDx),
            "openvex" => Ok(Self::OpenVex),
            "scorecard" => Ok(Self::Scorecard),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown document type '{}'", other)),
        }
    }
}

/// Where a document came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInformation {
    /// Collector that fetched the document (e.g. "file", "clearlydefined")
    pub collector: String,
    /// Provenance string (path, URL, ...)
    pub source: String,
    /// Reference to the stored blob, if any
    pub document_ref: String,
}

impl SourceInformation {
    pub fn new(collector: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            collector: collector.into(),
            source: source.into(),
            document_ref: String::new(),
        }
    }
}

impl fmt::Display for SourceInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collector, self.source)?;
        if !self.document_ref.is_empty() {
            write!(f, " ({})", self.document_ref)?;
        }
        Ok(())
    }
}

/// A format-tagged payload with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub blob: Vec<u8>,
    pub format: DocumentFormat,
    pub doc_type: DocumentType,
    pub source_information: SourceInformation,
}

impl Document {
    pub fn new(
        blob: impl Into<Vec<u8>>,
        format: DocumentFormat,
        doc_type: DocumentType,
        source_information: SourceInformation,
    ) -> Self {
        Self {
            blob: blob.into(),
            format,
            doc_type,
            source_information,
        }
    }
}

/// A document and the documents embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTree {
    pub document: Document,
    pub children: Vec<DocumentTree>,
}

impl DocumentTree {
    pub fn leaf(document: Document) -> Self {
        Self {
            document,
            children: Vec::new(),
        }
    }

    /// Documents in pre-order (node before its children).
    pub fn documents(&self) -> Vec<&Document> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Document>) {
        out.push(&self.document);
        for child in &self.children {
            child.collect(out);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DocumentTree::node_count).sum::<usize>()
    }
}
