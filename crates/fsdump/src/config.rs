//! Run configuration assembled from the environment and CLI flags.

use fsdump_firestore::{paths, FirestoreConfig};

use crate::cli::Cli;
use crate::error::{ExportError, ExportResult};
use crate::exporter::ExportOptions;

/// Everything needed to start an export.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Collection or document path the export starts from
    pub root: String,
    pub export: ExportOptions,
    pub firestore: FirestoreConfig,
}

impl RunConfig {
    /// Layer CLI flags over environment-derived client settings.
    pub fn from_cli(cli: &Cli) -> ExportResult<Self> {
        Self::with_firestore(cli, FirestoreConfig::from_env())
    }

    /// Layer CLI flags over the given client settings.
    pub fn with_firestore(cli: &Cli, mut firestore: FirestoreConfig) -> ExportResult<Self> {
        let root = cli.collection.trim().to_string();
        paths::segments(&root)
            .map_err(|e| ExportError::config_error(format!("invalid --collection: {}", e)))?;

        if let Some(project_id) = non_empty(cli.project_id.as_deref()) {
            firestore.project_id = Some(project_id);
        }
        if let Some(database) = non_empty(cli.database.as_deref()) {
            firestore.database_id = database;
        }
        if let Some(credentials) = &cli.credentials {
            firestore.credentials_file = Some(credentials.clone());
        }

        let export = ExportOptions {
            output_dir: cli.output.clone(),
            page_size: cli.page_size,
            include_missing: cli.include_missing,
        };

        Ok(Self {
            root,
            export,
            firestore,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("fsdump").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_override_environment_settings() {
        let base = FirestoreConfig {
            project_id: Some("from-env".to_string()),
            database_id: "env-db".to_string(),
            ..FirestoreConfig::default()
        };
        let cli = parse(&[
            "--collection",
            "users",
            "--project-id",
            "from-flag",
            "--database",
            "flag-db",
            "--credentials",
            "key.json",
        ]);

        let config = RunConfig::with_firestore(&cli, base).unwrap();

        assert_eq!(config.firestore.project_id.as_deref(), Some("from-flag"));
        assert_eq!(config.firestore.database_id, "flag-db");
        assert_eq!(config.firestore.credentials_file, Some(PathBuf::from("key.json")));
    }

    #[test]
    fn test_unset_flags_keep_environment_settings() {
        let base = FirestoreConfig {
            project_id: Some("from-env".to_string()),
            ..FirestoreConfig::default()
        };
        let cli = parse(&["--collection", "users", "--project-id", "  "]);

        let config = RunConfig::with_firestore(&cli, base).unwrap();

        assert_eq!(config.firestore.project_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_export_options_from_flags() {
        let cli = parse(&[
            "--collection",
            "users/u1/orders",
            "--output",
            "dump",
            "--page-size",
            "10",
            "--include-missing",
        ]);

        let config = RunConfig::with_firestore(&cli, FirestoreConfig::default()).unwrap();

        assert_eq!(config.root, "users/u1/orders");
        assert_eq!(config.export.output_dir, PathBuf::from("dump"));
        assert_eq!(config.export.page_size, Some(10));
        assert!(config.export.include_missing);
    }

    #[test]
    fn test_malformed_root_rejected() {
        for root in ["", "/", "/users", "users/", "users//orders"] {
            let cli = parse(&["--collection", root]);
            let err = RunConfig::with_firestore(&cli, FirestoreConfig::default()).unwrap_err();
            assert!(matches!(err, ExportError::ConfigError(_)), "root {:?}", root);
        }
    }
}
