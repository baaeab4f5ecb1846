//! Depth-first export of a collection tree to JSON files.
//!
//! Every document is written before its subcollections are visited, and a
//! document's whole subtree is finished before its next sibling. A failure
//! on one node is logged, recorded in the summary, and the walk moves on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use fsdump_firestore::{paths, Document, FirestoreError, ListDocumentsParams, PathKind};
use tracing::{debug, error, info, warn};

use crate::encode;
use crate::error::{ExportError, ExportResult};
use crate::layout::DocumentFiles;
use crate::store::DocumentStore;
use crate::summary::{ExportSummary, NodeKind};

/// Knobs for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Root of the exported tree
    pub output_dir: PathBuf,
    /// Documents requested per listing page; server default when unset
    pub page_size: Option<u32>,
    /// Walk into subcollections of documents that have no data
    pub include_missing: bool,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            page_size: None,
            include_missing: false,
        }
    }
}

/// Walks a store and mirrors it on disk.
pub struct Exporter<S> {
    store: S,
    options: ExportOptions,
    summary: ExportSummary,
}

impl<S: DocumentStore> Exporter<S> {
    pub fn new(store: S, options: ExportOptions) -> Self {
        Self {
            store,
            options,
            summary: ExportSummary::new(),
        }
    }

    /// Export everything under `root`.
    ///
    /// `root` is normally a collection path; a document path exports that
    /// document and its subtree. Only a malformed root or an unusable output
    /// directory fail the run.
    pub async fn run(&mut self, root: &str) -> ExportResult<ExportSummary> {
        let kind = PathKind::of(root)?;
        let start = Instant::now();
        self.summary = ExportSummary::new();

        self.prepare_output_dir().await?;

        match kind {
            PathKind::Collection => {
                self.export_collection(root).await;
                info!("Retrieved collection '{}' with all subcollections", root);
            }
            PathKind::Document => {
                self.export_document_at(root).await;
                info!("Retrieved document '{}' with all subcollections", root);
            }
        }

        self.summary.duration = start.elapsed();
        Ok(std::mem::take(&mut self.summary))
    }

    async fn prepare_output_dir(&self) -> ExportResult<()> {
        let dir = &self.options.output_dir;
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ExportError::output_dir(
                dir,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "not a directory"),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| ExportError::output_dir(dir, e))?;
                info!("Created directory: {}", dir.display());
                Ok(())
            }
            Err(e) => Err(ExportError::output_dir(dir, e)),
        }
    }

    /// Export every document of a collection, page by page.
    pub async fn export_collection(&mut self, collection_path: &str) {
        self.summary.collections_visited += 1;
        debug!(collection = %collection_path, "Processing collection");

        let mut params = ListDocumentsParams {
            page_size: self.options.page_size,
            page_token: None,
            show_missing: self.options.include_missing,
        };

        loop {
            let page = match self.store.list_documents(collection_path, &params).await {
                Ok(page) => page,
                Err(e) => {
                    error!(
                        collection = %collection_path,
                        "Error processing collection {}: {}", collection_path, e
                    );
                    self.summary
                        .record_failure(NodeKind::Collection, collection_path, e.to_string());
                    return;
                }
            };

            for doc in page.documents.unwrap_or_default() {
                self.export_document(doc).await;
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => params.page_token = Some(token),
                None => break,
            }
        }
    }

    /// Read one document by path and export it with its subtree.
    pub async fn export_document_at(&mut self, document_path: &str) {
        match self.store.get_document(document_path).await {
            Ok(Some(doc)) => self.export_document(doc).await,
            Ok(None) => self.skip_missing(document_path).await,
            Err(e) => self.document_failed(document_path, &e.into()),
        }
    }

    /// Export an already fetched document with its subtree.
    pub async fn export_document(&mut self, doc: Document) {
        let path = doc.path().to_string();
        if path.is_empty() {
            let e = FirestoreError::InvalidResponse("document has no name".to_string());
            self.document_failed("<unnamed>", &e.into());
            return;
        }
        if doc.is_missing() {
            self.skip_missing(&path).await;
            return;
        }

        if let Err(e) = self.write_document(&path, &doc).await {
            self.document_failed(&path, &e);
        }
    }

    async fn write_document(&mut self, path: &str, doc: &Document) -> ExportResult<()> {
        let files = DocumentFiles::new(&self.options.output_dir, path);

        let body = encode::to_pretty(&encode::encode_fields(doc.fields.as_ref()))?;
        write_file(&files.dir, &files.data, body).await?;
        self.summary.documents_exported += 1;
        info!("Saved document {} to {}", path, files.data.display());

        let subcollections = self.store.list_collection_ids(path).await?;
        if subcollections.is_empty() {
            return Ok(());
        }

        let manifest = serde_json::to_string_pretty(&subcollections)?;
        write_file(&files.dir, &files.manifest, manifest).await?;
        self.summary.manifests_written += 1;

        for id in &subcollections {
            Box::pin(self.export_collection(&paths::child(path, id))).await;
        }
        Ok(())
    }

    /// A path with no document data: nothing is written for it.
    async fn skip_missing(&mut self, path: &str) {
        warn!("Document {} does not exist", path);
        self.summary.missing_documents += 1;

        if !self.options.include_missing {
            return;
        }
        match self.store.list_collection_ids(path).await {
            Ok(ids) => {
                for id in &ids {
                    Box::pin(self.export_collection(&paths::child(path, id))).await;
                }
            }
            Err(e) => self.document_failed(path, &e.into()),
        }
    }

    fn document_failed(&mut self, path: &str, e: &ExportError) {
        error!(document = %path, "Error processing document {}: {}", path, e);
        self.summary
            .record_failure(NodeKind::Document, path, e.to_string());
    }
}

async fn write_file(dir: &Path, path: &Path, contents: String) -> ExportResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ExportError::write(dir, e))?;
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| ExportError::write(path, e))
}

// =============================================================================
// Tests
// =============================================================================
