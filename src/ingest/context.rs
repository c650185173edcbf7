//! Per-invocation context threaded through the pipeline
//!
//! Carries the tracing span every pipeline event is parented to and the
//! caller's cancellation token. Nothing here is process-wide.
//!
//! Cancellation is cooperative. The pipeline checks the token before it
//! processes a document and before it calls the sink, so a flush already
//! handed to the sink completes and earlier flushes stay committed.

use super::error::IngestError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, Span};

/// Shared flag a caller raises to stop an ingest run.
///
/// Clones observe the same flag, so the caller keeps one and hands another to
/// the [`IngestContext`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct IngestContext {
    /// Parent span for all events emitted on behalf of this invocation
    pub span: Span,
    pub cancel: CancellationToken,
}

impl IngestContext {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            cancel: CancellationToken::new(),
        }
    }

    /// A context whose events attach to no span.
    pub fn detached() -> Self {
        Self::new(Span::none())
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop at a pipeline checkpoint if the caller has cancelled.
    ///
    /// `stage` names the work that would have run next.
    pub fn check_cancelled(&self, stage: &'static str) -> Result<(), IngestError> {
        if !self.is_cancelled() {
            return Ok(());
        }
        info!(parent: &self.span, stage, "ingest cancelled");
        Err(IngestError::Cancelled { stage })
    }
}

impl Default for IngestContext {
    fn default() -> Self {
        Self::detached()
    }
}
