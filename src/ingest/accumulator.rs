//! Bounded accumulator for batch ingest
//!
//! Holds one in-flight bundle and the number of bundles merged into it since
//! the last flush. The batcher asks `merge` whether the threshold was hit,
//! then `take`s the bundle to flush it.
//!
//! Source references are counted as bundles arrive; a source is reported
//! once, when it first appears a second time in the current batch.

use super::context::IngestContext;
use crate::predicate::{IngestPredicates, SourceInputSpec};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Accumulator {
    predicates: IngestPredicates,
    merged: usize,
    threshold: usize,
    source_counts: BTreeMap<String, usize>,
}

impl Accumulator {
    /// `threshold` is clamped to at least 1.
    pub fn new(threshold: usize) -> Self {
        Self {
            predicates: IngestPredicates::new(),
            merged: 0,
            threshold: threshold.max(1),
            source_counts: BTreeMap::new(),
        }
    }

    /// Append `bundle` and count it. Returns true when a flush is due.
    pub fn merge(&mut self, ctx: &IngestContext, bundle: IngestPredicates) -> bool {
        for source in self.count_sources(&bundle) {
            warn!(parent: &ctx.span, %source, "source appears more than once in accumulated predicates");
        }
        self.predicates.append(bundle);
        self.merged += 1;

        debug!(
            parent: &ctx.span,
            certify_legal = self.predicates.certify_legal.len(),
            has_source_at = self.predicates.has_source_at.len(),
            merged = self.merged,
            "merged bundle into accumulator"
        );

        self.merged >= self.threshold
    }

    /// Hand over the accumulated bundle and reset to empty.
    pub fn take(&mut self) -> IngestPredicates {
        self.merged = 0;
        self.source_counts.clear();
        std::mem::take(&mut self.predicates)
    }

    /// Bundles merged since the last `take`
    pub fn merged(&self) -> usize {
        self.merged
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn predicates(&self) -> &IngestPredicates {
        &self.predicates
    }

    /// Source names referenced more than once across certify-legal and
    /// has-source-at records, with their counts. Revisions are ignored.
    pub fn duplicate_sources(&self) -> Vec<(String, usize)> {
        self.source_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(source, count)| (source.clone(), *count))
            .collect()
    }

    /// Count the sources `bundle` references. Returns those that became
    /// duplicates with it.
    fn count_sources(&mut self, bundle: &IngestPredicates) -> Vec<String> {
        let legal = bundle.certify_legal.iter().filter_map(|cl| cl.src());
        let located = bundle.has_source_at.iter().map(|hs| &hs.src);
        let mut newly_duplicated = Vec::new();
        for src in legal.chain(located) {
            let key = source_name_key(src);
            let count = self.source_counts.entry(key.clone()).or_default();
            *count += 1;
            if *count == 2 {
                newly_duplicated.push(key);
            }
        }
        newly_duplicated
    }
}

fn source_name_key(src: &SourceInputSpec) -> String {
    format!("{}+{}/{}", src.src_type, src.namespace, src.name)
}
