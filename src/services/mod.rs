pub mod artifact_cache;
pub mod chart_service;
pub mod chunk_writer;
pub mod csv_ingest_service;
pub mod date_service;
pub mod filter_service;
pub mod grouping_service;
pub mod index_service;
pub mod pipeline_service;
pub mod row_processor;
pub mod table_service;

#[cfg(test)]
pub(crate) mod fixtures;
