use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

use crate::config::LoaderConfig;
use crate::models::{FullDataArtifact, MetadataArtifact, ProcessedRow};

#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Body of the full-data endpoint, which degrades to the raw CSV when the
/// JSON artifact is unavailable.
#[derive(Debug, Clone)]
pub enum FullDataset {
    Json(FullDataArtifact),
    Csv(String),
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_metadata(&self) -> Result<MetadataArtifact, DataSourceError>;

    /// One 1-based page of rows. A page past the end is an empty vector.
    async fn fetch_chunk(&self, page: usize) -> Result<Vec<ProcessedRow>, DataSourceError>;

    async fn fetch_full_dataset(&self) -> Result<FullDataset, DataSourceError>;

    async fn fetch_raw_csv(&self) -> Result<String, DataSourceError>;
}

pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpDataSource {
    pub fn new(config: &LoaderConfig) -> Result<Self, DataSourceError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| DataSourceError::BadResponse(format!("invalid base url {}: {}", config.base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DataSourceError::Network(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DataSourceError> {
        self.base_url
            .join(path)
            .map_err(|e| DataSourceError::BadResponse(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<reqwest::Response, DataSourceError> {
        let resp = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| DataSourceError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DataSourceError::BadResponse(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch_metadata(&self) -> Result<MetadataArtifact, DataSourceError> {
        self.get(self.endpoint("api/data/metadata")?, &[])
            .await?
            .json()
            .await
            .map_err(|e| DataSourceError::Parse(e.to_string()))
    }

    async fn fetch_chunk(&self, page: usize) -> Result<Vec<ProcessedRow>, DataSourceError> {
        self.get(self.endpoint("api/data/chunks")?, &[("page", page.to_string())])
            .await?
            .json()
            .await
            .map_err(|e| DataSourceError::Parse(e.to_string()))
    }

    async fn fetch_full_dataset(&self) -> Result<FullDataset, DataSourceError> {
        let resp = self.get(self.endpoint("api/data")?, &[]).await?;

        // The server answers with the raw CSV when its JSON artifact is gone
        let is_csv = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/csv"));

        if is_csv {
            let text = resp
                .text()
                .await
                .map_err(|e| DataSourceError::Network(e.to_string()))?;
            return Ok(FullDataset::Csv(text));
        }

        resp.json()
            .await
            .map(FullDataset::Json)
            .map_err(|e| DataSourceError::Parse(e.to_string()))
    }

    async fn fetch_raw_csv(&self) -> Result<String, DataSourceError> {
        self.get(self.endpoint("data/assets.csv")?, &[])
            .await?
            .text()
            .await
            .map_err(|e| DataSourceError::Network(e.to_string()))
    }
}
