use std::process::ExitCode;

use anyhow::Context;

use splintboard::config::DataConfig;
use splintboard::logging::{init_logging, LoggingConfig};
use splintboard::services::pipeline_service::{run_pipeline, PipelineReport};

async fn run() -> anyhow::Result<PipelineReport> {
    let config = DataConfig::from_env();
    let data_dir = config.data_dir.clone();

    tokio::task::spawn_blocking(move || run_pipeline(&config))
        .await
        .context("Preprocessing task panicked")?
        .with_context(|| format!("Preprocessing failed for {}", data_dir.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    if let Err(e) = init_logging(LoggingConfig::from_env("splintboard-preprocess")) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(report) => {
            tracing::info!(
                "Wrote {} rows ({} dropped) for {} assets in {} chunks",
                report.parsed_rows,
                report.dropped_rows,
                report.total_assets,
                report.total_chunks
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("❌ Error processing CSV: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
