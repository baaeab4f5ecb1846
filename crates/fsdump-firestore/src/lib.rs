//! Firestore REST API client.
//!
//! This crate provides:
//! - Service account authentication via gcp_auth, or emulator access
//! - Document reads, paged collection listings and subcollection discovery
//! - Typed Firestore values that tolerate unknown value kinds
//! - Token caching and optional retry with backoff

pub mod auth;
pub mod client;
pub mod error;
pub mod paths;
pub mod retry;
pub mod types;


pub use client::{FirestoreClient, FirestoreConfig, ListDocumentsParams};
pub use error::{FirestoreError, FirestoreResult};
pub use paths::PathKind;
pub use types::{Document, GeoPoint, ListCollectionIdsResponse, ListDocumentsResponse, Value};
