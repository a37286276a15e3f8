use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{parse_chunk_file_name, DataConfig};
use crate::errors::PipelineError;
use crate::models::ProcessedRow;

/// Splits rows into contiguous pages of `chunk_size`; only the last page may be short.
pub fn plan_chunks(rows: &[ProcessedRow], chunk_size: usize) -> Result<Vec<&[ProcessedRow]>, PipelineError> {
    if chunk_size == 0 {
        return Err(PipelineError::InvalidChunkSize);
    }
    Ok(rows.chunks(chunk_size).collect())
}

/// Writes `value` next to `path` and renames it into place, so readers never
/// observe a half-written artifact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<u64, PipelineError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &bytes).map_err(|e| PipelineError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| PipelineError::io(path, e))?;

    Ok(bytes.len() as u64)
}

/// Persists every page as `chunks/assets-chunk-{n}.json` and removes pages
/// left over from an earlier, larger run. Returns the number of chunks written.
pub fn write_chunks(config: &DataConfig, rows: &[ProcessedRow]) -> Result<usize, PipelineError> {
    let chunks_dir = config.chunks_dir();
    fs::create_dir_all(&chunks_dir).map_err(|e| PipelineError::io(&chunks_dir, e))?;

    let chunks = plan_chunks(rows, config.chunk_size)?;
    let total = chunks.len();
    info!("Creating {} chunks of {} rows each", total, config.chunk_size);

    for (i, chunk) in chunks.iter().enumerate() {
        let page = i + 1;
        write_json_atomic(&config.chunk_path(page), chunk, true)?;
        info!("Created chunk {}/{}: {} rows", page, total, chunk.len());
    }

    remove_stale_chunks(&chunks_dir, total)?;

    Ok(total)
}

fn remove_stale_chunks(chunks_dir: &Path, keep: usize) -> Result<(), PipelineError> {
    let entries = fs::read_dir(chunks_dir).map_err(|e| PipelineError::io(chunks_dir, e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(page) = parse_chunk_file_name(&path) {
            if page > keep {
                debug!("Removing stale chunk {}", path.display());
                fs::remove_file(&path).map_err(|e| PipelineError::io(&path, e))?;
            }
        }
    }
    Ok(())
}
