use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::ProcessedRow;
use crate::services::artifact_cache::{gzip, CachedArtifact};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_full_data))
        .route("/metadata", get(get_metadata))
        .route("/chunks", get(get_chunk))
}

#[derive(Debug, Deserialize)]
pub struct ChunkQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

fn cache_control(max_age: u64, shared: bool) -> HeaderValue {
    let value = if shared {
        format!("public, max-age={}, s-maxage={}", max_age, max_age)
    } else {
        format!("public, max-age={}", max_age)
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("no-cache"))
}

fn gzip_json_response(body: Vec<u8>, cache: HeaderValue) -> Response {
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
            (header::CONTENT_ENCODING, HeaderValue::from_static("gzip")),
            (header::CACHE_CONTROL, cache),
        ],
        body,
    )
        .into_response()
}

/// Serves a cached artifact, answering 304 when the client's validator matches.
fn artifact_response(artifact: &CachedArtifact, request: &HeaderMap, cache: HeaderValue) -> Response {
    let not_modified = request
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|tag| tag.split(',').any(|t| t.trim() == artifact.etag));

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        gzip_json_response(artifact.gzip.clone(), cache.clone())
    };

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, cache);
    if let Ok(etag) = HeaderValue::from_str(&artifact.etag) {
        headers.insert(header::ETAG, etag);
    }
    if let Ok(last_modified) = HeaderValue::from_str(&artifact.last_modified) {
        headers.insert(header::LAST_MODIFIED, last_modified);
    }
    response
}

fn error_payload(message: &str) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
}

pub async fn get_metadata(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/data/metadata - Serving dataset metadata");
    let path = state.data.metadata_path();

    match state.artifacts.load_json(&path).await {
        Ok(artifact) => artifact_response(
            &artifact,
            &headers,
            cache_control(state.server.cache_max_age_secs, false),
        ),
        Err(e) => {
            error!("Error reading metadata file {}: {}", path.display(), e);
            error_payload("Failed to load metadata")
        }
    }
}

pub async fn get_full_data(State(state): State<AppState>, headers: HeaderMap) -> Response {
    info!("GET /api/data - Serving full dataset");
    let path = state.data.full_data_path();

    match state.artifacts.load_json(&path).await {
        Ok(artifact) => {
            return artifact_response(
                &artifact,
                &headers,
                cache_control(state.server.cache_max_age_secs, true),
            )
        }
        Err(e) => warn!("Error reading JSON file {}: {}. Falling back to CSV", path.display(), e),
    }

    let csv_path = state.data.csv_path();
    match tokio::fs::read_to_string(&csv_path).await {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
                (
                    header::CACHE_CONTROL,
                    cache_control(state.server.fallback_max_age_secs, false),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => {
            error!("Fallback CSV loading failed for {}: {}", csv_path.display(), e);
            error_payload("Failed to load data")
        }
    }
}

/// The CSV itself, for clients whose JSON paths all failed.
pub async fn get_raw_csv(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("GET /data/assets.csv - Serving raw CSV");
    let csv_path = state.data.csv_path();
    let csv = tokio::fs::read_to_string(&csv_path)
        .await
        .map_err(|_| AppError::NotFound(format!("{} is not available", csv_path.display())))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv")),
            (
                header::CACHE_CONTROL,
                cache_control(state.server.fallback_max_age_secs, false),
            ),
        ],
        csv,
    )
        .into_response())
}

pub async fn get_chunk(
    State(state): State<AppState>,
    Query(query): Query<ChunkQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let page = query.page.unwrap_or(1);
    info!("GET /api/data/chunks - page {} (limit {:?})", page, query.limit);

    if page == 0 {
        return Err(AppError::Validation("page must be at least 1".to_string()));
    }

    let Some(limit) = query.limit else {
        return Ok(serve_chunk_file(&state, page, &headers).await);
    };
    if limit == 0 {
        return Err(AppError::Validation("limit must be at least 1".to_string()));
    }

    match persisted_chunk_size(&state).await {
        Some(chunk_size) if chunk_size == limit => Ok(serve_chunk_file(&state, page, &headers).await),
        Some(chunk_size) => serve_page(&state, page, limit, chunk_size).await,
        None => {
            warn!("Chunk size unknown, serving chunk {} without applying limit {}", page, limit);
            Ok(serve_chunk_file(&state, page, &headers).await)
        }
    }
}

/// Only the `metadata.chunkSize` field of the metadata artifact; the grouped
/// series are skipped.
#[derive(Deserialize)]
struct PersistedLayout {
    metadata: ChunkSizeField,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChunkSizeField {
    #[serde(default)]
    chunk_size: Option<usize>,
}

/// The chunk size the artifacts were written with. Zero counts as unknown.
async fn persisted_chunk_size(state: &AppState) -> Option<usize> {
    let artifact = state.artifacts.load_json(&state.data.metadata_path()).await.ok()?;
    let layout: PersistedLayout = serde_json::from_slice(&artifact.raw).ok()?;
    layout.metadata.chunk_size.filter(|&size| size > 0)
}

fn empty_page(state: &AppState) -> Response {
    match gzip(b"[]") {
        Ok(body) => gzip_json_response(body, cache_control(state.server.fallback_max_age_secs, false)),
        Err(e) => {
            error!("Failed to compress empty chunk: {}", e);
            error_payload("Failed to load data chunk")
        }
    }
}

async fn serve_chunk_file(state: &AppState, page: usize, headers: &HeaderMap) -> Response {
    let path = state.data.chunk_path(page);
    match state.artifacts.load_json(&path).await {
        Ok(artifact) => artifact_response(
            &artifact,
            headers,
            cache_control(state.server.cache_max_age_secs, false),
        ),
        Err(e) => {
            info!("Chunk {} unavailable ({}), returning empty page", page, e);
            empty_page(state)
        }
    }
}

async fn load_chunk_rows(state: &AppState, chunk: usize) -> Option<Arc<Vec<ProcessedRow>>> {
    let artifact = state.artifacts.load_json(&state.data.chunk_path(chunk)).await.ok()?;
    match serde_json::from_slice::<Vec<ProcessedRow>>(&artifact.raw) {
        Ok(rows) => Some(Arc::new(rows)),
        Err(e) => {
            error!("Chunk {} does not hold rows: {}", chunk, e);
            None
        }
    }
}

/// Rows `[(page - 1) * limit, page * limit)` of the full sequence, stitched
/// together from however many chunk files they span.
async fn serve_page(state: &AppState, page: usize, limit: usize, chunk_size: usize) -> Result<Response, AppError> {
    let start = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::Validation("page is out of range".to_string()))?;
    let end = start.saturating_add(limit);

    let mut rows: Vec<ProcessedRow> = Vec::with_capacity(limit.min(chunk_size));
    let mut chunk = start / chunk_size + 1;
    let mut position = start;

    while position < end {
        let Some(chunk_rows) = load_chunk_rows(state, chunk).await else {
            break;
        };
        let chunk_start = (chunk - 1) * chunk_size;
        let from = position - chunk_start;
        if from >= chunk_rows.len() {
            break;
        }
        let to = (end - chunk_start).min(chunk_rows.len());
        rows.extend_from_slice(&chunk_rows[from..to]);
        position = chunk_start + to;
        chunk += 1;
    }

    if rows.is_empty() {
        return Ok(empty_page(state));
    }

    let body = gzip(&serde_json::to_vec(&rows)?)?;
    Ok(gzip_json_response(
        body,
        cache_control(state.server.cache_max_age_secs, false),
    ))
}
