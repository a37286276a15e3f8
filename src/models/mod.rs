mod asset_row;
mod artifacts;
mod chart;
mod filter;

pub use asset_row::{Language, ProcessedRow, RawDate, RawRow, INDEXED_COLUMN};
pub use artifacts::{
    DatasetMetadata, FullDataArtifact, GroupedSeries, IndexVocabulary, MetadataArtifact,
    ARTIFACT_VERSION,
};
pub use chart::{ChartPoint, ChartSeries};
pub use filter::{DateRange, Dimension, FilterOptions, FilterSelection};
