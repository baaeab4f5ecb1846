//! Slash-delimited Firestore resource paths.
//!
//! Paths here are relative to the database documents root, e.g.
//! `users/u1/orders/o7`. Collections have an odd number of segments,
//! documents an even number.

use crate::error::{FirestoreError, FirestoreResult};

/// What a relative path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Collection,
    Document,
}

impl PathKind {
    /// Classify a path, rejecting empty segments.
    pub fn of(path: &str) -> FirestoreResult<Self> {
        let segments = segments(path)?;
        if segments.len() % 2 == 1 {
            Ok(Self::Collection)
        } else {
            Ok(Self::Document)
        }
    }
}

/// Split a path into its segments.
pub fn segments(path: &str) -> FirestoreResult<Vec<&str>> {
    if path.is_empty() {
        return Err(FirestoreError::invalid_path("path is empty"));
    }
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|s| s.is_empty()) {
        return Err(FirestoreError::invalid_path(format!(
            "{} contains an empty segment",
            path
        )));
    }
    Ok(parts)
}

/// Ensure a path names a collection.
pub fn validate_collection_path(path: &str) -> FirestoreResult<()> {
    match PathKind::of(path)? {
        PathKind::Collection => Ok(()),
        PathKind::Document => Err(FirestoreError::invalid_path(format!(
            "{} is a document path, expected a collection",
            path
        ))),
    }
}

/// Ensure a path names a document.
pub fn validate_document_path(path: &str) -> FirestoreResult<()> {
    match PathKind::of(path)? {
        PathKind::Document => Ok(()),
        PathKind::Collection => Err(FirestoreError::invalid_path(format!(
            "{} is a collection path, expected a document",
            path
        ))),
    }
}

/// Strip the `projects/<p>/databases/<d>/documents/` prefix from a resource
/// name.
///
/// The prefix is matched by position, so project or database ids that are
/// themselves `documents` are handled. Names without the prefix are returned
/// unchanged.
pub fn relative_name(name: &str) -> &str {
    let mut parts = name.splitn(6, '/');
    match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some("projects"), Some(_), Some("databases"), Some(_), Some("documents"), Some(rest)) => {
            rest
        }
        _ => name,
    }
}

/// Join a parent path and a child id.
pub fn child(parent: &str, id: &str) -> String {
    format!("{}/{}", parent, id)
}

/// Percent-encode each segment for use in a URL.
pub fn encode_for_url(path: &str) -> String {
    path.split('/')
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_kind_by_segment_parity() {
        assert_eq!(PathKind::of("users").unwrap(), PathKind::Collection);
        assert_eq!(PathKind::of("users/u1").unwrap(), PathKind::Document);
        assert_eq!(PathKind::of("users/u1/orders").unwrap(), PathKind::Collection);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert!(PathKind::of("").is_err());
        assert!(PathKind::of("/users").is_err());
        assert!(PathKind::of("users/").is_err());
        assert!(PathKind::of("users//u1").is_err());
    }

    #[test]
    fn test_validate_kind() {
        assert!(validate_collection_path("users").is_ok());
        assert!(validate_collection_path("users/u1").is_err());
        assert!(validate_document_path("users/u1").is_ok());
        assert!(validate_document_path("users").is_err());
    }

    #[test]
    fn test_relative_name_strips_database_prefix() {
        assert_eq!(
            relative_name("projects/demo/databases/(default)/documents/users/u1"),
            "users/u1"
        );
        assert_eq!(relative_name("users/u1"), "users/u1");
    }

    #[test]
    fn test_relative_name_with_ids_named_documents() {
        assert_eq!(
            relative_name("projects/demo/databases/documents/documents/users/u1"),
            "users/u1"
        );
        assert_eq!(
            relative_name("projects/documents/databases/(default)/documents/users/u1"),
            "users/u1"
        );
        assert_eq!(
            relative_name("projects/documents/databases/documents/documents/documents/d1"),
            "documents/d1"
        );
    }

    #[test]
    fn test_relative_name_requires_full_prefix() {
        assert_eq!(
            relative_name("projects/demo/databases/(default)/documents"),
            "projects/demo/databases/(default)/documents"
        );
        assert_eq!(relative_name("a/b/c/d/documents/x"), "a/b/c/d/documents/x");
    }

    #[test]
    fn test_encode_for_url_keeps_separators() {
        assert_eq!(encode_for_url("users/ann smith"), "users/ann%20smith");
        assert_eq!(encode_for_url("a/b#c"), "a/b%23c");
    }
}
