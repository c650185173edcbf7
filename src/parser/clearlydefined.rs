//! ClearlyDefined legal-certification parser
//!
//! Maps a ClearlyDefined definition attestation to graph predicates:
//! - A declared certify-legal record from `licensed.declared`, carrying the
//!   `licensed.facets.core.discovered.expressions` AND-ed together
//! - Otherwise, a discovered-only record when discovered expressions exist
//! - A has-source-at record from `described.sourceLocation` when the
//!   subject is a package
//!
//! The subject is the statement's subject URI, parsed as a package URL
//! first and as a source locator second.

use super::traits::{DocumentParser, IdentifierStrings, ParseError, TrustInformation};
use crate::document::{Document, DocumentType};
use crate::ingest::IngestContext;
use crate::predicate::license::{combine_licenses, parse_licenses};
use crate::predicate::{
    locator_to_source, purl_to_pkg, CertifyLegalIngest, CertifyLegalInputSpec, HasSourceAtIngest,
    IngestPredicates, PackageOrSource, PkgInputSpec, PkgMatchType, RelationKind, SourceInputSpec,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

const JUSTIFICATION: &str = "Retrieved from ClearlyDefined";

/// Stored when a definition carries no timestamp: 0001-01-01T00:00:00Z.
fn zero_time() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

// in-toto statement wrapping a ClearlyDefined definition

#[derive(Debug, Deserialize)]
struct Statement {
    #[serde(default)]
    subject: Vec<Subject>,
    #[serde(default)]
    predicate: Predicate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Subject {
    uri: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Predicate {
    definition: Definition,
    metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Metadata {
    scanned_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Definition {
    described: Described,
    licensed: Licensed,
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Described {
    source_location: Option<SourceLocation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceLocation {
    #[serde(rename = "type")]
    location_type: String,
    namespace: String,
    name: String,
    revision: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Licensed {
    declared: String,
    facets: Facets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Facets {
    core: CoreFacet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CoreFacet {
    attribution: Attribution,
    discovered: Discovered,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Attribution {
    parties: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Discovered {
    expressions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Meta {
    updated: Option<DateTime<Utc>>,
}

/// Parser for ClearlyDefined legal attestations.
#[derive(Debug, Default)]
pub struct ClearlyDefinedParser {
    pkg: Option<PkgInputSpec>,
    src: Option<SourceInputSpec>,
    certify_legal: Vec<CertifyLegalIngest>,
    has_source_at: Vec<HasSourceAtIngest>,
}

impl ClearlyDefinedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last purl subject wins; the first source-only subject ends the scan.
    fn resolve_subject(&mut self, statement: &Statement) -> Result<(), ParseError> {
        for subject in &statement.subject {
            match purl_to_pkg(&subject.uri) {
                Ok(pkg) => self.pkg = Some(pkg),
                Err(_) => {
                    let src = locator_to_source(&subject.uri).map_err(|source| {
                        ParseError::SubjectResolution {
                            locator: subject.uri.clone(),
                            source,
                        }
                    })?;
                    self.src = Some(src);
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn legal_subject(&self) -> Result<PackageOrSource, ParseError> {
        if let Some(pkg) = &self.pkg {
            Ok(PackageOrSource::Package(pkg.clone()))
        } else if let Some(src) = &self.src {
            Ok(PackageOrSource::Source(src.clone()))
        } else {
            Err(ParseError::MissingSubject {
                predicate: RelationKind::CertifyLegal,
            })
        }
    }

    fn collect(&mut self, ctx: &IngestContext, statement: &Statement) -> Result<(), ParseError> {
        let definition = &statement.predicate.definition;
        let licensed = &definition.licensed;
        let core = &licensed.facets.core;
        let time_scanned = statement.predicate.metadata.scanned_on.unwrap_or_else(zero_time);
        let attribution = core.attribution.parties.join(",");
        let has_discovered = !core.discovered.expressions.is_empty();

        if !licensed.declared.is_empty() {
            let (discovered_license, discovered) = if has_discovered {
                let combined = combine_licenses(&core.discovered.expressions);
                let parsed = parse_licenses(&combined, None);
                (combined, parsed)
            } else {
                (String::new(), Vec::new())
            };

            self.certify_legal.push(CertifyLegalIngest {
                subject: self.legal_subject()?,
                declared: parse_licenses(&licensed.declared, None),
                discovered,
                certify_legal: CertifyLegalInputSpec {
                    declared_license: licensed.declared.clone(),
                    discovered_license,
                    attribution,
                    justification: JUSTIFICATION.to_string(),
                    time_scanned,
                },
            });
        } else if has_discovered {
            // Discovered-only: declared fields stay empty.
            let combined = combine_licenses(&core.discovered.expressions);
            self.certify_legal.push(CertifyLegalIngest {
                subject: self.legal_subject()?,
                declared: Vec::new(),
                discovered: parse_licenses(&combined, None),
                certify_legal: CertifyLegalInputSpec {
                    declared_license: String::new(),
                    discovered_license: combined,
                    attribution,
                    justification: JUSTIFICATION.to_string(),
                    time_scanned,
                },
            });
        }

        if let Some(location) = &definition.described.source_location {
            let src = SourceInputSpec::from_location(
                location.location_type.as_str(),
                location.namespace.as_str(),
                location.name.as_str(),
                Some(location.revision.as_str()),
            );
            debug!(parent: &ctx.span, source = %src, "source location found");

            if let Some(pkg) = &self.pkg {
                self.has_source_at.push(HasSourceAtIngest {
                    pkg: pkg.clone(),
                    pkg_match: PkgMatchType::SpecificVersion,
                    src,
                    known_since: definition.meta.updated.unwrap_or_else(zero_time),
                    justification: JUSTIFICATION.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl DocumentParser for ClearlyDefinedParser {
    fn parse(&mut self, ctx: &IngestContext, document: &Document) -> Result<(), ParseError> {
        *self = Self::new();

        let statement: Statement =
            serde_json::from_slice(&document.blob).map_err(|source| ParseError::Decode {
                doc_type: DocumentType::ClearlyDefined,
                source,
            })?;

        let mut next = Self::new();
        next.resolve_subject(&statement)?;
        next.collect(ctx, &statement)?;
        *self = next;

        debug!(
            parent: &ctx.span,
            certify_legal = self.certify_legal.len(),
            has_source_at = self.has_source_at.len(),
            "parsed clearlydefined document"
        );
        Ok(())
    }

    fn predicates(&self, _ctx: &IngestContext) -> IngestPredicates {
        IngestPredicates {
            certify_legal: self.certify_legal.clone(),
            has_source_at: self.has_source_at.clone(),
            ..Default::default()
        }
    }

    fn identities(&self, _ctx: &IngestContext) -> Vec<TrustInformation> {
        Vec::new()
    }

    fn identifiers(&self, _ctx: &IngestContext) -> Result<IdentifierStrings, ParseError> {
        Err(ParseError::NotImplemented {
            capability: "identifiers",
            doc_type: DocumentType::ClearlyDefined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, SourceInformation};
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(body: serde_json::Value) -> Document {
        Document::new(
            serde_json::to_vec(&body).unwrap(),
            DocumentFormat::Json,
            DocumentType::ClearlyDefined,
            SourceInformation::new("test", "cd.json"),
        )
    }

    fn statement(uri: &str, definition: serde_json::Value) -> serde_json::Value {
        json!({
            "_type": "https://in-toto.io/Statement/v0.1",
            "predicateType": "https://in-toto.io/attestation/clearlydefined/v0.1",
            "subject": [{ "uri": uri }],
            "predicate": {
                "definition": definition,
                "metadata": { "scannedOn": "2024-03-01T10:30:00+02:00" }
            }
        })
    }

    fn parse(body: serde_json::Value) -> Result<ClearlyDefinedParser, ParseError> {
        let mut parser = ClearlyDefinedParser::new();
        parser.parse(&IngestContext::detached(), &doc(body))?;
        Ok(parser)
    }

    #[test]
    fn declared_only_license() {
        let parser = parse(statement(
            "pkg:npm/left-pad@1.3.0",
            json!({ "licensed": { "declared": "MIT" } }),
        ))
        .unwrap();
        let preds = parser.predicates(&IngestContext::detached());

        assert_eq!(preds.certify_legal.len(), 1);
        let legal = &preds.certify_legal[0];
        assert_eq!(legal.certify_legal.declared_license, "MIT");
        assert_eq!(legal.certify_legal.discovered_license, "");
        assert_eq!(legal.certify_legal.justification, "Retrieved from ClearlyDefined");
        assert_eq!(legal.declared.len(), 1);
        assert!(legal.discovered.is_empty());
        assert_eq!(legal.pkg().map(|p| p.name.as_str()), Some("left-pad"));
        assert!(legal.src().is_none());
        // +02:00 converted to UTC
        assert_eq!(
            legal.certify_legal.time_scanned,
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
        );
        assert!(preds.has_source_at.is_empty());
    }

    #[test]
    fn declared_with_discovered_and_attribution() {
        let parser = parse(statement(
            "pkg:npm/left-pad@1.3.0",
            json!({ "licensed": {
                "declared": "MIT",
                "facets": { "core": {
                    "attribution": { "parties": ["Copyright Alice", "Copyright Bob"] },
                    "discovered": { "expressions": ["MIT", "ISC"] }
                }}
            }}),
        ))
        .unwrap();
        let preds = parser.predicates(&IngestContext::detached());

        assert_eq!(preds.certify_legal.len(), 1);
        let legal = &preds.certify_legal[0].certify_legal;
        assert_eq!(legal.declared_license, "MIT");
        assert_eq!(legal.discovered_license, "MIT AND ISC");
        assert_eq!(legal.attribution, "Copyright Alice,Copyright Bob");
        assert_eq!(preds.certify_legal[0].discovered.len(), 2);
    }

    #[test]
    fn discovered_only_record() {
        let parser = parse(statement(
            "pkg:pypi/requests@2.31.0",
            json!({ "licensed": { "facets": { "core": {
                "discovered": { "expressions": ["MIT", "Apache-2.0"] }
            }}}}),
        ))
        .unwrap();
        let preds = parser.predicates(&IngestContext::detached());

        assert_eq!(preds.certify_legal.len(), 1);
        let legal = &preds.certify_legal[0];
        assert_eq!(legal.certify_legal.discovered_license, "MIT AND Apache-2.0");
        assert_eq!(legal.certify_legal.declared_license, "");
        assert!(legal.declared.is_empty());
        let names: Vec<_> = legal.discovered.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["MIT", "Apache-2.0"]);
    }

    #[test]
    fn no_license_information_emits_nothing() {
        let parser = parse(statement("pkg:npm/left-pad@1.3.0", json!({}))).unwrap();
        assert!(parser.predicates(&IngestContext::detached()).is_empty());
    }

    #[test]
    fn source_subject_when_purl_fails() {
        let parser = parse(statement(
            "git+https://github.com/left-pad/left-pad@v1.3.0",
            json!({
                "licensed": { "declared": "WTFPL" },
                "described": { "sourceLocation": {
                    "type": "git", "provider": "github",
                    "namespace": "left-pad", "name": "left-pad", "revision": "v1.3.0"
                }}
            }),
        ))
        .unwrap();
        let preds = parser.predicates(&IngestContext::detached());

        let legal = &preds.certify_legal[0];
        assert!(legal.pkg().is_none());
        let src = legal.src().unwrap();
        assert_eq!(src.namespace, "github.com/left-pad");
        assert_eq!(src.tag.as_deref(), Some("v1.3.0"));
        // A source subject cannot "have a source".
        assert!(preds.has_source_at.is_empty());
    }

    #[test]
    fn package_with_source_location_links_has_source_at() {
        let commit = "a".repeat(40);
        let parser = parse(statement(
            "pkg:npm/left-pad@1.3.0",
            json!({
                "licensed": { "declared": "WTFPL" },
                "described": { "sourceLocation": {
                    "type": "git", "namespace": "left-pad", "name": "left-pad", "revision": commit
                }},
                "meta": { "updated": "2024-02-01T00:00:00Z" }
            }),
        ))
        .unwrap();
        let preds = parser.predicates(&IngestContext::detached());

        assert_eq!(preds.has_source_at.len(), 1);
        let hsa = &preds.has_source_at[0];
        assert_eq!(hsa.pkg_match, PkgMatchType::SpecificVersion);
        assert_eq!(hsa.justification, JUSTIFICATION);
        assert_eq!(hsa.src.commit.as_deref(), Some(commit.as_str()));
        assert_eq!(hsa.known_since, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn missing_timestamps_fall_back_to_zero_time() {
        let body = json!({
            "subject": [{ "uri": "pkg:npm/left-pad@1.3.0" }],
            "predicate": { "definition": {
                "licensed": { "declared": "MIT" },
                "described": { "sourceLocation": {
                    "type": "git", "namespace": "left-pad", "name": "left-pad", "revision": "v1.3.0"
                }}
            }}
        });
        let preds = parse(body).unwrap().predicates(&IngestContext::detached());

        let zero = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(preds.certify_legal[0].certify_legal.time_scanned, zero);
        assert_eq!(preds.has_source_at[0].known_since, zero);
        assert_eq!(zero.to_rfc3339(), "0001-01-01T00:00:00+00:00");
    }

    #[test]
    fn unparseable_subject_is_resolution_error() {
        let err = parse(statement("not a locator", json!({ "licensed": { "declared": "MIT" } })))
            .unwrap_err();
        match err {
            ParseError::SubjectResolution { locator, .. } => assert_eq!(locator, "not a locator"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_subject_fails_without_partial_records() {
        let body = json!({
            "subject": [],
            "predicate": { "definition": { "licensed": { "declared": "MIT" } } }
        });
        let mut parser = ClearlyDefinedParser::new();
        let ctx = IngestContext::detached();

        parser
            .parse(&ctx, &doc(statement("pkg:npm/a@1", json!({ "licensed": { "declared": "MIT" } }))))
            .unwrap();
        let err = parser.parse(&ctx, &doc(body)).unwrap_err();

        assert!(matches!(
            err,
            ParseError::MissingSubject { predicate: RelationKind::CertifyLegal }
        ));
        // Neither the failed document nor the previous one leaks through.
        assert!(parser.predicates(&ctx).is_empty());
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        let mut parser = ClearlyDefinedParser::new();
        let bad = Document::new(
            b"[1, 2]".to_vec(),
            DocumentFormat::Json,
            DocumentType::ClearlyDefined,
            SourceInformation::default(),
        );
        let err = parser.parse(&IngestContext::detached(), &bad).unwrap_err();
        assert!(matches!(err, ParseError::Decode { .. }));
    }

    #[test]
    fn identifiers_are_not_implemented() {
        let parser = ClearlyDefinedParser::new();
        let err = parser.identifiers(&IngestContext::detached()).unwrap_err();
        assert!(matches!(err, ParseError::NotImplemented { capability: "identifiers", .. }));
        assert!(parser.identities(&IngestContext::detached()).is_empty());
    }
}
