//! Read access to the document store.
//!
//! The exporter only needs three calls, so it talks to the store through
//! this trait rather than the concrete client.

use async_trait::async_trait;
use fsdump_firestore::{
    Document, FirestoreClient, FirestoreResult, ListDocumentsParams, ListDocumentsResponse,
};

/// Hierarchical document store the exporter walks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One page of documents in a collection.
    async fn list_documents(
        &self,
        collection_path: &str,
        params: &ListDocumentsParams,
    ) -> FirestoreResult<ListDocumentsResponse>;

    /// A single document, or `None` when it does not exist.
    async fn get_document(&self, document_path: &str) -> FirestoreResult<Option<Document>>;

    /// Every child collection id of a document.
    async fn list_collection_ids(&self, document_path: &str) -> FirestoreResult<Vec<String>>;
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn list_documents(
        &self,
        collection_path: &str,
        params: &ListDocumentsParams,
    ) -> FirestoreResult<ListDocumentsResponse> {
        FirestoreClient::list_documents(self, collection_path, params).await
    }

    async fn get_document(&self, document_path: &str) -> FirestoreResult<Option<Document>> {
        FirestoreClient::get_document(self, document_path).await
    }

    async fn list_collection_ids(&self, document_path: &str) -> FirestoreResult<Vec<String>> {
        self.list_all_collection_ids(document_path).await
    }
}
