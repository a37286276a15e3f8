use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::IgnoredAny;
use tracing::{debug, info};

use crate::errors::AppError;

/// One artifact file as last read from disk.
#[derive(Debug)]
pub struct CachedArtifact {
    pub modified: SystemTime,
    pub raw: Vec<u8>,
    pub gzip: Vec<u8>,
    pub etag: String,
    pub last_modified: String,
}

/// Process-scoped cache of artifact files, keyed by path and valid for one
/// modification time.
///
/// A changed mtime forces a re-read. When the map grows past `capacity` it is
/// cleared wholesale; this is a coarse bound, not LRU.
#[derive(Clone)]
pub struct ArtifactCache {
    entries: Arc<DashMap<PathBuf, Arc<CachedArtifact>>>,
    capacity: usize,
}

pub fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// RFC 7231 HTTP-date.
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Strong validator derived from the modification time in milliseconds.
pub fn etag_for(time: SystemTime) -> String {
    let millis = time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("\"{}\"", millis)
}

impl ArtifactCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            capacity,
        }
    }

    /// Returns the artifact at `path`, re-reading it only if its mtime moved.
    /// The file must hold valid JSON.
    pub async fn load_json(&self, path: &Path) -> Result<Arc<CachedArtifact>, AppError> {
        let modified = tokio::fs::metadata(path).await?.modified()?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                debug!("Artifact cache hit for {}", path.display());
                return Ok(entry.value().clone());
            }
        }

        let raw = tokio::fs::read(path).await?;
        serde_json::from_slice::<IgnoredAny>(&raw)?;
        let gzip = gzip(&raw)?;

        let artifact = Arc::new(CachedArtifact {
            modified,
            etag: etag_for(modified),
            last_modified: http_date(modified),
            raw,
            gzip,
        });

        if self.entries.len() >= self.capacity && !self.entries.contains_key(path) {
            info!("Artifact cache reached {} entries, clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(path.to_path_buf(), artifact.clone());
        info!(
            "Loaded {} ({} bytes, {} gzipped)",
            path.display(),
            artifact.raw.len(),
            artifact.gzip.len()
        );

        Ok(artifact)
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
