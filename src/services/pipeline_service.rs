//! Offline CSV -> JSON preprocessing.
//!
//! One run reads `assets.csv`, normalizes every row, builds the filter
//! vocabularies and the per-asset series, then writes:
//!
//! - `chunks/assets-chunk-{n}.json`: fixed-size pages of the row sequence
//! - `assets-metadata.json`: vocabularies, grouped series and counts, no rows
//! - `assets.json`: everything in one document for single-request clients
//!
//! A run replaces the previous artifact set completely. Row content is a pure
//! function of the input, only `lastUpdated` changes between identical runs.

use std::fs;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info};

use crate::config::DataConfig;
use crate::errors::PipelineError;
use crate::models::{
    DatasetMetadata, FullDataArtifact, IndexVocabulary, MetadataArtifact, ProcessedRow,
    ARTIFACT_VERSION,
};
use crate::services::chunk_writer::{write_chunks, write_json_atomic};
use crate::services::csv_ingest_service::ingest_csv;
use crate::services::date_service::DateEncoding;
use crate::services::grouping_service::group_by_asset;
use crate::services::index_service::build_indexes;
use crate::services::row_processor::process_rows;

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub input_bytes: u64,
    pub parsed_rows: usize,
    pub dropped_rows: usize,
    pub total_assets: usize,
    pub total_chunks: usize,
    pub full_data_bytes: u64,
}

impl PipelineReport {
    /// Percentage by which `assets.json` is smaller than the CSV (negative if larger).
    pub fn size_reduction_pct(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        (self.input_bytes as f64 - self.full_data_bytes as f64) / self.input_bytes as f64 * 100.0
    }
}

/// Everything one run derives from the CSV, before anything is written.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub rows: Vec<ProcessedRow>,
    pub indexes: IndexVocabulary,
    pub dropped_rows: usize,
}

/// Parses and normalizes CSV text along the string-date path.
pub fn prepare_dataset(csv_content: &str) -> Result<PreparedDataset, PipelineError> {
    let report = ingest_csv(csv_content, DateEncoding::SlashString)
        .map_err(|e| PipelineError::Parse(format!("{:#}", e)))?;

    let rows = process_rows(report.rows);
    info!("Processed {} rows", rows.len());

    let indexes = build_indexes(&rows);
    info!(
        "Created indexes: {} categories, {} subcategories, {} experts, {} assets",
        indexes.categories.len(),
        indexes.subcategories.len(),
        indexes.experts.len(),
        indexes.assets.len()
    );

    Ok(PreparedDataset {
        rows,
        indexes,
        dropped_rows: report.dropped,
    })
}

pub fn run_pipeline(config: &DataConfig) -> Result<PipelineReport, PipelineError> {
    run_pipeline_at(config, Utc::now())
}

/// Runs the whole pipeline stamping `now` as the artifacts' `lastUpdated`.
pub fn run_pipeline_at(config: &DataConfig, now: DateTime<Utc>) -> Result<PipelineReport, PipelineError> {
    config.validate().map_err(|_| PipelineError::InvalidChunkSize)?;

    let csv_path = config.csv_path();
    if !csv_path.exists() {
        error!("CSV input not found at {}", csv_path.display());
        return Err(PipelineError::MissingInput(csv_path));
    }

    info!("Starting CSV preprocessing from {}", csv_path.display());
    let csv_content = fs::read_to_string(&csv_path).map_err(|e| PipelineError::io(&csv_path, e))?;
    info!("Read CSV file: {} characters", csv_content.len());

    let dataset = prepare_dataset(&csv_content)?;
    let grouped = group_by_asset(&dataset.rows);
    info!("Grouped data for {} assets", grouped.len());

    fs::create_dir_all(&config.data_dir).map_err(|e| PipelineError::io(&config.data_dir, e))?;
    let total_chunks = write_chunks(config, &dataset.rows)?;

    let last_updated = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let total_rows = dataset.rows.len();
    let total_assets = grouped.len();

    let metadata = MetadataArtifact {
        indexes: dataset.indexes.clone(),
        grouped_data: grouped,
        metadata: DatasetMetadata {
            total_rows,
            total_assets,
            total_chunks: Some(total_chunks),
            chunk_size: Some(config.chunk_size),
            last_updated: last_updated.clone(),
            version: ARTIFACT_VERSION.to_string(),
        },
    };
    write_json_atomic(&config.metadata_path(), &metadata, true)?;
    info!("Created metadata file: {}", config.metadata_path().display());

    let full = FullDataArtifact {
        data: dataset.rows,
        indexes: metadata.indexes,
        grouped_data: metadata.grouped_data,
        metadata: DatasetMetadata {
            total_rows,
            total_assets,
            total_chunks: None,
            chunk_size: None,
            last_updated,
            version: ARTIFACT_VERSION.to_string(),
        },
    };
    let full_data_bytes = write_json_atomic(&config.full_data_path(), &full, false)?;

    let report = PipelineReport {
        input_bytes: csv_content.len() as u64,
        parsed_rows: total_rows,
        dropped_rows: dataset.dropped_rows,
        total_assets,
        total_chunks,
        full_data_bytes,
    };

    info!("✅ Preprocessing complete!");
    info!("📊 Original CSV: {:.1} KB", report.input_bytes as f64 / 1024.0);
    info!("📊 Optimized JSON: {:.1} KB", report.full_data_bytes as f64 / 1024.0);
    info!("📊 Size reduction: {:.1}%", report.size_reduction_pct());
    info!("📁 Output: {}", config.full_data_path().display());

    Ok(report)
}
