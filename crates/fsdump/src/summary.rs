//! Export summary and reporting.

use std::time::Duration;

use tracing::{info, warn};

/// Kind of node a failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Collection,
}

/// A node that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    pub kind: NodeKind,
    pub path: String,
    pub message: String,
}

/// Counters for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    /// Document files written
    pub documents_exported: usize,
    /// Subcollection manifests written
    pub manifests_written: usize,
    /// Collections whose listing was attempted
    pub collections_visited: usize,
    /// Documents that did not exist
    pub missing_documents: usize,
    /// Failed nodes, in traversal order
    pub failures: Vec<NodeFailure>,
    /// Duration of the export
    pub duration: Duration,
}

impl ExportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, kind: NodeKind, path: &str, message: impl Into<String>) {
        self.failures.push(NodeFailure {
            kind,
            path: path.to_string(),
            message: message.into(),
        });
    }

    pub fn failed_documents(&self) -> usize {
        self.count_failures(NodeKind::Document)
    }

    pub fn failed_collections(&self) -> usize {
        self.count_failures(NodeKind::Collection)
    }

    fn count_failures(&self, kind: NodeKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// True when every visited node was exported.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Log the totals at the end of a run.
    pub fn log(&self) {
        info!(
            documents = self.documents_exported,
            manifests = self.manifests_written,
            collections = self.collections_visited,
            missing = self.missing_documents,
            duration_ms = self.duration.as_millis() as u64,
            "Export finished"
        );
        if !self.is_complete() {
            warn!(
                failed_documents = self.failed_documents(),
                failed_collections = self.failed_collections(),
                "Some nodes could not be exported"
            );
        }
    }
}
