use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Where the pipeline reads its CSV and where every artifact lives.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public").join("data")),
            chunk_size: env_or("CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("CHUNK_SIZE must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join("assets.csv")
    }

    pub fn full_data_path(&self) -> PathBuf {
        self.data_dir.join("assets.json")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join("assets-metadata.json")
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.data_dir.join("chunks")
    }

    /// Chunk files are numbered from 1.
    pub fn chunk_path(&self, page: usize) -> PathBuf {
        self.chunks_dir().join(chunk_file_name(page))
    }
}

pub fn chunk_file_name(page: usize) -> String {
    format!("assets-chunk-{}.json", page)
}

/// Inverse of [`chunk_file_name`].
pub fn parse_chunk_file_name(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix("assets-chunk-")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub cache_max_age_secs: u64,
    pub fallback_max_age_secs: u64,
    pub artifact_cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cache_max_age_secs: 3600,
            fallback_max_age_secs: 300,
            artifact_cache_capacity: 64,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            cache_max_age_secs: env_or("CACHE_MAX_AGE_SECS", defaults.cache_max_age_secs),
            fallback_max_age_secs: env_or("FALLBACK_MAX_AGE_SECS", defaults.fallback_max_age_secs),
            artifact_cache_capacity: env_or(
                "ARTIFACT_CACHE_CAPACITY",
                defaults.artifact_cache_capacity,
            ),
        }
    }
}

/// Client-side loader settings.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub base_url: String,
    /// Pause between background chunk fetches.
    pub inter_page_delay: Duration,
    pub request_timeout: Duration,
}

impl LoaderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            inter_page_delay: Duration::from_millis(10),
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_inter_page_delay(mut self, delay: Duration) -> Self {
        self.inter_page_delay = delay;
        self
    }
}
