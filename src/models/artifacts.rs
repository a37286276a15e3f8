use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::asset_row::ProcessedRow;

pub const ARTIFACT_VERSION: &str = "2.0";

/// The four filter vocabularies, each sorted ascending and deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexVocabulary {
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
    pub experts: Vec<String>,
    pub assets: Vec<String>,
}

/// Asset name -> that asset's rows in chronological order.
pub type GroupedSeries = BTreeMap<String, Vec<ProcessedRow>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    pub total_rows: usize,
    pub total_assets: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    pub last_updated: String,
    pub version: String,
}

/// Contents of `assets-metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataArtifact {
    pub indexes: IndexVocabulary,
    pub grouped_data: GroupedSeries,
    pub metadata: DatasetMetadata,
}

/// Contents of `assets.json`, the single-request artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullDataArtifact {
    pub data: Vec<ProcessedRow>,
    pub indexes: IndexVocabulary,
    pub grouped_data: GroupedSeries,
    pub metadata: DatasetMetadata,
}
