//! End-to-end tests: documents through tree building, parsing, batching, and the sink

#[cfg(test)]
mod tests {
    use crate::document::{Document, DocumentFormat, DocumentType, SourceInformation};
    use crate::ingest::{
        CancellationToken, EmitterError, IdentifierEmitter, IngestConfig, IngestContext,
        IngestError, IngestedIds, Ingestor, PredicateSink, SinkError,
    };
    use crate::parser::{
        DocumentParser, IdentifierStrings, ParseError, ParserRegistry, TrustInformation,
    };
    use crate::predicate::{IngestPredicates, RelationKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    // ================================================================
    // Fakes
    // ================================================================

    /// Records every bundle it is asked to assemble.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<IngestPredicates>>,
        fail_on_call: Option<usize>,
        cancel_on_call: Option<CancellationToken>,
    }

    impl RecordingSink {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Default::default()
            }
        }

        fn cancelling(token: CancellationToken) -> Self {
            Self {
                cancel_on_call: Some(token),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<IngestPredicates> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PredicateSink for RecordingSink {
        async fn assemble(&self, predicates: &IngestPredicates) -> Result<IngestedIds, SinkError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(predicates.clone());
            let call = calls.len();

            if let Some(token) = &self.cancel_on_call {
                token.cancel();
            }
            if self.fail_on_call == Some(call) {
                return Err(SinkError::Rejected(format!("call {call} refused")));
            }

            let mut ids = IngestedIds::new();
            for (i, legal) in predicates.certify_legal.iter().enumerate() {
                if let Some(pkg) = legal.pkg() {
                    ids.packages.push(pkg.key());
                }
                ids.relations
                    .entry(RelationKind::CertifyLegal)
                    .or_default()
                    .push(format!("legal-{call}-{i}"));
            }
            Ok(ids)
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        calls: Mutex<Vec<Vec<IdentifierStrings>>>,
        fail: bool,
    }

    #[async_trait]
    impl IdentifierEmitter for RecordingEmitter {
        async fn emit(&self, identifiers: &[IdentifierStrings]) -> Result<(), EmitterError> {
            self.calls.lock().unwrap().push(identifiers.to_vec());
            if self.fail {
                return Err(EmitterError::Registrar("collectsub unreachable".into()));
            }
            Ok(())
        }
    }

    /// Treats the blob as a purl and reports it as an identifier.
    #[derive(Default)]
    struct PurlListParser {
        purl: String,
    }

    impl DocumentParser for PurlListParser {
        fn parse(&mut self, _ctx: &IngestContext, document: &Document) -> Result<(), ParseError> {
            self.purl = String::from_utf8_lossy(&document.blob).trim().to_string();
            Ok(())
        }

        fn predicates(&self, _ctx: &IngestContext) -> IngestPredicates {
            IngestPredicates::new()
        }

        fn identities(&self, _ctx: &IngestContext) -> Vec<TrustInformation> {
            Vec::new()
        }

        fn identifiers(&self, _ctx: &IngestContext) -> Result<IdentifierStrings, ParseError> {
            Ok(IdentifierStrings {
                purl_strings: vec![self.purl.clone()],
                ..Default::default()
            })
        }
    }

    /// Raises the run's cancellation token while parsing, like a caller
    /// giving up mid-document.
    #[derive(Default)]
    struct CancellingParser;

    impl DocumentParser for CancellingParser {
        fn parse(&mut self, ctx: &IngestContext, _document: &Document) -> Result<(), ParseError> {
            ctx.cancel.cancel();
            Ok(())
        }

        fn predicates(&self, _ctx: &IngestContext) -> IngestPredicates {
            IngestPredicates::new()
        }

        fn identities(&self, _ctx: &IngestContext) -> Vec<TrustInformation> {
            Vec::new()
        }

        fn identifiers(&self, _ctx: &IngestContext) -> Result<IdentifierStrings, ParseError> {
            Ok(IdentifierStrings::default())
        }
    }

    // ================================================================
    // Documents
    // ================================================================

    fn clearlydefined(name: &str) -> serde_json::Value {
        json!({
            "subject": [{ "uri": format!("pkg:npm/{name}@1.0.0") }],
            "predicate": {
                "definition": { "licensed": { "declared": "MIT" } },
                "metadata": { "scannedOn": "2024-03-01T00:00:00Z" }
            }
        })
    }

    fn cd_doc(name: &str) -> Document {
        Document::new(
            serde_json::to_vec(&clearlydefined(name)).unwrap(),
            DocumentFormat::Json,
            DocumentType::ClearlyDefined,
            SourceInformation::new("file", format!("{name}.json")),
        )
    }

    fn cd_docs(n: usize) -> Vec<Document> {
        (0..n).map(|i| cd_doc(&format!("pkg-{i}"))).collect()
    }

    fn ingestor(sink: Arc<RecordingSink>, threshold: usize) -> Ingestor {
        Ingestor::new(sink).with_config(IngestConfig::default().with_flush_threshold(threshold))
    }

    // ================================================================
    // Single-document ingest
    // ================================================================

    #[tokio::test]
    async fn single_ingest_returns_sink_ids() {
        let sink = Arc::new(RecordingSink::default());
        let ids = Ingestor::new(sink.clone())
            .ingest(&IngestContext::detached(), &cd_doc("left-pad"))
            .await
            .unwrap();

        assert_eq!(ids.packages, vec!["pkg:npm/left-pad@1.0.0"]);
        assert_eq!(ids.relation_ids(RelationKind::CertifyLegal), ["legal-1-0"]);
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn emitter_failure_does_not_block_single_ingest() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = Arc::new(RecordingEmitter {
            fail: true,
            ..Default::default()
        });
        let ingestor = Ingestor::new(sink.clone()).with_emitter(emitter.clone());

        let ids = ingestor
            .ingest(&IngestContext::detached(), &cd_doc("left-pad"))
            .await
            .unwrap();

        assert_eq!(ids.relation_count(), 1);
        assert_eq!(emitter.calls.lock().unwrap().len(), 1);
        assert_eq!(sink.calls().len(), 1);
    }

    #[tokio::test]
    async fn single_ingest_sink_error_names_source() {
        let sink = Arc::new(RecordingSink::failing_on(1));
        let err = Ingestor::new(sink)
            .ingest(&IngestContext::detached(), &cd_doc("left-pad"))
            .await
            .unwrap_err();

        match err {
            IngestError::Sink { source_info, .. } => assert_eq!(source_info, "left-pad.json"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unregistered_type_is_a_dispatch_error() {
        let sink = Arc::new(RecordingSink::default());
        let doc = Document::new(
            b"{}".to_vec(),
            DocumentFormat::Json,
            DocumentType::OpenVex,
            SourceInformation::new("file", "vex.json"),
        );

        let err = Ingestor::new(sink.clone())
            .ingest(&IngestContext::detached(), &doc)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Dispatch { doc_type: DocumentType::OpenVex, .. }));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_fails_in_tree_builder() {
        let sink = Arc::new(RecordingSink::default());
        let doc = Document::new(
            b"{not json".to_vec(),
            DocumentFormat::Json,
            DocumentType::ClearlyDefined,
            SourceInformation::new("file", "bad.json"),
        );

        let err = Ingestor::new(sink.clone())
            .ingest(&IngestContext::detached(), &doc)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Process { .. }));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn bundle_children_are_parsed_and_merged() {
        let sink = Arc::new(RecordingSink::default());
        let bundle = json!({ "documents": [
            { "type": "clearlydefined", "payload": clearlydefined("a") },
            { "type": "clearlydefined", "payload": clearlydefined("b").to_string() }
        ]});
        let doc = Document::new(
            serde_json::to_vec(&bundle).unwrap(),
            DocumentFormat::Json,
            DocumentType::Bundle,
            SourceInformation::new("file", "bundle.json"),
        );

        let ids = Ingestor::new(sink.clone())
            .ingest(&IngestContext::detached(), &doc)
            .await
            .unwrap();

        assert_eq!(ids.packages, vec!["pkg:npm/a@1.0.0", "pkg:npm/b@1.0.0"]);
        assert_eq!(sink.calls()[0].certify_legal.len(), 2);
    }

    // ================================================================
    // Batch ingest
    // ================================================================

    #[tokio::test]
    async fn flushes_every_threshold_plus_final() {
        let sink = Arc::new(RecordingSink::default());
        let report = ingestor(sink.clone(), 2)
            .merged_ingest(&IngestContext::detached(), &cd_docs(5))
            .await
            .unwrap();

        let sizes: Vec<_> = sink.calls().iter().map(|p| p.certify_legal.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(report.flushes, 3);
        assert_eq!(report.documents, 5);
        assert_eq!(report.bundles_merged, 5);
        assert_eq!(report.ids.packages.len(), 5);
    }

    #[tokio::test]
    async fn final_flush_happens_even_when_empty() {
        let sink = Arc::new(RecordingSink::default());
        let report = ingestor(sink.clone(), 2)
            .merged_ingest(&IngestContext::detached(), &cd_docs(4))
            .await
            .unwrap();

        let sizes: Vec<_> = sink.calls().iter().map(|p| p.certify_legal.len()).collect();
        assert_eq!(sizes, vec![2, 2, 0]);
        assert_eq!(report.flushes, 3);
    }

    #[tokio::test]
    async fn default_threshold_flushes_at_five_thousand() {
        let sink = Arc::new(RecordingSink::default());
        let report = Ingestor::new(sink.clone())
            .merged_ingest(&IngestContext::detached(), &cd_docs(5001))
            .await
            .unwrap();

        let sizes: Vec<_> = sink.calls().iter().map(|p| p.certify_legal.len()).collect();
        assert_eq!(sizes, vec![5000, 1]);
        assert_eq!(report.flushes, 2);
        assert_eq!(report.bundles_merged, 5001);
        assert_eq!(report.ids.packages.len(), 5001);
    }

    #[tokio::test]
    async fn empty_batch_flushes_once() {
        let sink = Arc::new(RecordingSink::default());
        let report = Ingestor::new(sink.clone())
            .merged_ingest(&IngestContext::detached(), &[])
            .await
            .unwrap();

        assert_eq!(report.flushes, 1);
        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_empty());
    }

    #[tokio::test]
    async fn bundle_documents_count_per_node() {
        let sink = Arc::new(RecordingSink::default());
        let bundle = json!({ "documents": [
            { "type": "clearlydefined", "payload": clearlydefined("a") },
            { "type": "clearlydefined", "payload": clearlydefined("b") }
        ]});
        let doc = Document::new(
            serde_json::to_vec(&bundle).unwrap(),
            DocumentFormat::Json,
            DocumentType::Bundle,
            SourceInformation::new("file", "bundle.json"),
        );

        // One document with two parsed nodes hits a threshold of 2.
        let report = ingestor(sink.clone(), 2)
            .merged_ingest(&IngestContext::detached(), &[doc])
            .await
            .unwrap();

        assert_eq!(report.bundles_merged, 2);
        assert_eq!(report.flushes, 2);
        assert_eq!(sink.calls()[0].certify_legal.len(), 2);
    }

    #[tokio::test]
    async fn sink_error_aborts_but_keeps_earlier_flushes() {
        let sink = Arc::new(RecordingSink::failing_on(2));
        let err = ingestor(sink.clone(), 2)
            .merged_ingest(&IngestContext::detached(), &cd_docs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Sink { .. }));
        let calls = sink.calls();
        // First flush went through; the run stopped at the second.
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].certify_legal.len(), 2);
    }

    #[tokio::test]
    async fn parse_error_aborts_before_any_flush() {
        let sink = Arc::new(RecordingSink::default());
        let mut docs = cd_docs(2);
        docs.push(Document::new(
            serde_json::to_vec(&json!({
                "subject": [],
                "predicate": { "definition": { "licensed": { "declared": "MIT" } } }
            }))
            .unwrap(),
            DocumentFormat::Json,
            DocumentType::ClearlyDefined,
            SourceInformation::new("file", "orphan.json"),
        ));

        let err = Ingestor::new(sink.clone())
            .merged_ingest(&IngestContext::detached(), &docs)
            .await
            .unwrap_err();

        match err {
            IngestError::Parse {
                source_info,
                source: ParseError::MissingSubject { .. },
                ..
            } => assert_eq!(source_info, "file:orphan.json"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn identifiers_concatenate_and_emit_once() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = Arc::new(RecordingEmitter::default());
        let mut registry = ParserRegistry::with_defaults();
        registry.register(DocumentFormat::JsonLines, DocumentType::Spdx, || {
            Box::new(PurlListParser::default())
        });

        let purl_doc = |purl: &str| {
            Document::new(
                purl.as_bytes().to_vec(),
                DocumentFormat::JsonLines,
                DocumentType::Spdx,
                SourceInformation::new("file", purl),
            )
        };
        let docs = vec![purl_doc("pkg:npm/a@1"), cd_doc("c"), purl_doc("pkg:npm/a@1")];

        Ingestor::new(sink)
            .with_registry(registry)
            .with_emitter(emitter.clone())
            .merged_ingest(&IngestContext::detached(), &docs)
            .await
            .unwrap();

        let calls = emitter.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        // Not deduplicated across documents.
        let purls: Vec<_> = calls[0].iter().flat_map(|ids| ids.purl_strings.clone()).collect();
        assert_eq!(purls, vec!["pkg:npm/a@1", "pkg:npm/a@1"]);
    }

    #[tokio::test]
    async fn emitter_failure_does_not_block_batch() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = Arc::new(RecordingEmitter {
            fail: true,
            ..Default::default()
        });

        let report = Ingestor::new(sink.clone())
            .with_emitter(emitter)
            .merged_ingest(&IngestContext::detached(), &cd_docs(3))
            .await
            .unwrap();

        assert_eq!(report.flushes, 1);
        assert_eq!(sink.calls()[0].certify_legal.len(), 3);
    }

    #[tokio::test]
    async fn zero_threshold_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let err = ingestor(sink.clone(), 0)
            .merged_ingest(&IngestContext::detached(), &cd_docs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::InvalidConfig(_)));
        assert!(sink.calls().is_empty());
    }

    // ================================================================
    // Cancellation
    // ================================================================

    #[tokio::test]
    async fn cancelled_before_start_touches_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let token = CancellationToken::new();
        token.cancel();
        let ctx = IngestContext::detached().with_cancellation(token);

        let err = Ingestor::new(sink.clone())
            .merged_ingest(&ctx, &cd_docs(3))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Cancelled { stage: "document" }));
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_flush_stops_at_next_document() {
        let token = CancellationToken::new();
        let sink = Arc::new(RecordingSink::cancelling(token.clone()));
        let ctx = IngestContext::detached().with_cancellation(token);

        let err = ingestor(sink.clone(), 1)
            .merged_ingest(&ctx, &cd_docs(3))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Cancelled { stage: "document" }));
        // The flush in progress completed; nothing after it ran.
        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].certify_legal.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_while_parsing_stops_before_next_document() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = Arc::new(RecordingEmitter::default());
        let mut registry = ParserRegistry::with_defaults();
        registry.register(DocumentFormat::JsonLines, DocumentType::Spdx, || {
            Box::new(CancellingParser)
        });
        let doc = Document::new(
            b"pkg:npm/a@1".to_vec(),
            DocumentFormat::JsonLines,
            DocumentType::Spdx,
            SourceInformation::new("file", "a.jsonl"),
        );

        let err = Ingestor::new(sink.clone())
            .with_registry(registry)
            .with_emitter(emitter.clone())
            .merged_ingest(&IngestContext::detached(), &[cd_doc("first"), doc, cd_doc("last")])
            .await
            .unwrap_err();

        // The document after the cancelling one never ran, so nothing was flushed.
        assert!(matches!(err, IngestError::Cancelled { stage: "document" }));
        assert!(sink.calls().is_empty());
        assert!(emitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn single_ingest_cancelled_after_parse_never_reaches_sink() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = ParserRegistry::new();
        registry.register(DocumentFormat::JsonLines, DocumentType::Spdx, || {
            Box::new(CancellingParser)
        });
        let doc = Document::new(
            b"pkg:npm/a@1".to_vec(),
            DocumentFormat::JsonLines,
            DocumentType::Spdx,
            SourceInformation::new("file", "a.jsonl"),
        );

        let err = Ingestor::new(sink.clone())
            .with_registry(registry)
            .ingest(&IngestContext::detached(), &doc)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Cancelled { stage: "flush" }));
        assert!(sink.calls().is_empty());
    }

    // ================================================================
    // Storage
    // ================================================================

    #[tokio::test]
    async fn batch_into_sqlite_sink() {
        let sink = Arc::new(crate::storage::SqliteSink::open_in_memory().unwrap());
        let report = Ingestor::new(sink.clone())
            .with_config(IngestConfig::default().with_flush_threshold(2))
            .merged_ingest(&IngestContext::detached(), &cd_docs(3))
            .await
            .unwrap();

        assert_eq!(report.flushes, 2);
        assert_eq!(report.ids.packages.len(), 3);
        assert_eq!(sink.relation_count(RelationKind::CertifyLegal).unwrap(), 3);
    }
}
