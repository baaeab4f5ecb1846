//! Mapping from store paths to files under the output directory.
//!
//! `users/u1` is written to `<out>/users/u1.json`, its manifest to
//! `<out>/users/u1_subcollections.json`, and its subcollections under
//! `<out>/users/u1/<collection>/...`.

use std::path::{Path, PathBuf};

/// Suffix of the file listing a document's subcollections.
pub const MANIFEST_SUFFIX: &str = "_subcollections.json";

/// Output locations for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFiles {
    /// `<out>/<collection path>`; holds the data file and manifest
    pub dir: PathBuf,
    /// Field data
    pub data: PathBuf,
    /// Subcollection manifest
    pub manifest: PathBuf,
}

impl DocumentFiles {
    /// Locate the files for a document path such as `users/u1/orders/o7`.
    pub fn new(output_dir: &Path, document_path: &str) -> Self {
        let mut segments: Vec<&str> = document_path.split('/').collect();
        let id = segments.pop().unwrap_or_default();

        let dir = segments
            .iter()
            .fold(output_dir.to_path_buf(), |dir, segment| dir.join(segment));
        let data = dir.join(format!("{}.json", id));
        let manifest = dir.join(format!("{}{}", id, MANIFEST_SUFFIX));

        Self { dir, data, manifest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_document() {
        let files = DocumentFiles::new(Path::new("output"), "users/u1");
        assert_eq!(files.dir, Path::new("output/users"));
        assert_eq!(files.data, Path::new("output/users/u1.json"));
        assert_eq!(files.manifest, Path::new("output/users/u1_subcollections.json"));
    }

    #[test]
    fn test_nested_document_mirrors_path() {
        let files = DocumentFiles::new(Path::new("/tmp/out"), "users/u1/orders/o7");
        assert_eq!(files.data, Path::new("/tmp/out/users/u1/orders/o7.json"));
    }

    #[test]
    fn test_dotted_ids_keep_their_dots() {
        let files = DocumentFiles::new(Path::new("out"), "files/report.v2");
        assert_eq!(files.data, Path::new("out/files/report.v2.json"));
        assert_eq!(files.manifest, Path::new("out/files/report.v2_subcollections.json"));
    }
}
