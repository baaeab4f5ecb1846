//! Firestore collection exporter.
//!
//! Walks a collection (or a single document) depth-first and writes every
//! document as a pretty-printed JSON file under an output directory, with a
//! manifest listing each document's subcollections.

pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod exporter;
pub mod layout;
pub mod logging;
pub mod store;
pub mod summary;

pub use cli::{Cli, LogFormat};
pub use config::RunConfig;
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportOptions, Exporter};
pub use layout::DocumentFiles;
pub use store::DocumentStore;
pub use summary::{ExportSummary, NodeFailure, NodeKind};
