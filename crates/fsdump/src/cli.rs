//! CLI interface and argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// fsdump - export a Firestore collection tree to JSON files
#[derive(Parser, Debug)]
#[command(name = "fsdump")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Service account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Collection to export, or a document path to export a single subtree
    #[arg(short, long)]
    pub collection: String,

    /// Directory the export is written to
    #[arg(short, long, default_value = "firestore_data")]
    pub output: PathBuf,

    /// GCP project ID (defaults to the environment, then the key file)
    #[arg(long)]
    pub project_id: Option<String>,

    /// Database ID
    #[arg(long, env = "FIRESTORE_DATABASE_ID")]
    pub database: Option<String>,

    /// Documents requested per listing page
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// Walk into subcollections of documents that have no data
    #[arg(long)]
    pub include_missing: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "LOG_FORMAT", ignore_case = true)]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored output
    Pretty,
    /// One JSON object per line
    Json,
}
