use std::sync::Arc;

use crate::config::{DataConfig, ServerConfig};
use crate::services::artifact_cache::ArtifactCache;

#[derive(Clone)]
pub struct AppState {
    pub data: Arc<DataConfig>,
    pub server: Arc<ServerConfig>,
    pub artifacts: ArtifactCache,
}

impl AppState {
    pub fn new(data: DataConfig, server: ServerConfig) -> Self {
        let artifacts = ArtifactCache::new(server.artifact_cache_capacity);
        Self {
            data: Arc::new(data),
            server: Arc::new(server),
            artifacts,
        }
    }
}
