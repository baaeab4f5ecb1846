//! fsdump binary.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use fsdump::{Cli, ExportSummary, Exporter, RunConfig};
use fsdump_firestore::FirestoreClient;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = fsdump::logging::init_tracing(cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    match run(&cli).await {
        Ok(summary) => summary.log(),
        Err(e) => {
            error!("Export failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<ExportSummary> {
    let config = RunConfig::from_cli(cli)?;

    let client = FirestoreClient::new(config.firestore.clone())
        .await
        .context("Failed to create Firestore client")?;
    info!(
        project_id = %client.project_id(),
        database_id = %client.database_id(),
        root = %config.root,
        output = %config.export.output_dir.display(),
        "Starting export"
    );

    let mut exporter = Exporter::new(client, config.export);
    let summary = exporter.run(&config.root).await?;
    Ok(summary)
}
