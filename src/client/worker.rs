use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{FilterSelection, ProcessedRow};
use crate::services::csv_ingest_service::ingest_csv;
use crate::services::date_service::DateEncoding;
use crate::services::filter_service::filter_rows;
use crate::services::row_processor::process_rows;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayload {
    pub csv_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterPayload {
    pub filters: FilterSelection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerRequest {
    ProcessData { payload: ProcessPayload },
    FilterData { payload: FilterPayload },
    ClearCache,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsPayload {
    pub data: Vec<ProcessedRow>,
    pub count: usize,
}

impl RowsPayload {
    fn new(data: Vec<ProcessedRow>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerResponse {
    DataProcessed { payload: RowsPayload },
    DataFiltered { payload: RowsPayload },
    CacheCleared,
    Error { error: String },
}

/// Off-session CSV parsing and filtering.
///
/// Owns the last processed row set; nothing is shared with the caller, all
/// traffic goes through the request and response channels.
#[derive(Default)]
pub struct DataWorker {
    processed: Option<Arc<Vec<ProcessedRow>>>,
}

impl DataWorker {
    pub fn handle(&mut self, request: WorkerRequest) -> WorkerResponse {
        match request {
            WorkerRequest::ProcessData { payload } => match ingest_csv(&payload.csv_text, DateEncoding::SlashString) {
                Ok(report) => {
                    let rows = process_rows(report.rows);
                    info!("Worker processed {} rows", rows.len());
                    self.processed = Some(Arc::new(rows.clone()));
                    WorkerResponse::DataProcessed {
                        payload: RowsPayload::new(rows),
                    }
                }
                Err(e) => WorkerResponse::Error {
                    error: format!("{:#}", e),
                },
            },
            WorkerRequest::FilterData { payload } => match &self.processed {
                Some(rows) => {
                    let filtered: Vec<ProcessedRow> =
                        filter_rows(rows, &payload.filters).into_iter().cloned().collect();
                    debug!("Worker filtered {} -> {} rows", rows.len(), filtered.len());
                    WorkerResponse::DataFiltered {
                        payload: RowsPayload::new(filtered),
                    }
                }
                None => WorkerResponse::Error {
                    error: "No data available for filtering".to_string(),
                },
            },
            WorkerRequest::ClearCache => {
                self.processed = None;
                WorkerResponse::CacheCleared
            }
        }
    }

    /// Moves a worker onto its own task. It exits once the handle is dropped.
    pub fn spawn() -> WorkerHandle {
        let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>(CHANNEL_CAPACITY);

        let task = tokio::spawn(async move {
            let mut worker = DataWorker::default();
            while let Some(request) = request_rx.recv().await {
                let response = worker.handle(request);
                if response_tx.send(response).await.is_err() {
                    warn!("Worker response receiver dropped, stopping");
                    break;
                }
            }
            debug!("Worker stopped");
        });

        WorkerHandle {
            requests: request_tx,
            responses: response_rx,
            task,
        }
    }
}

pub struct WorkerHandle {
    requests: mpsc::Sender<WorkerRequest>,
    responses: mpsc::Receiver<WorkerResponse>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    pub async fn post(&self, request: WorkerRequest) -> bool {
        self.requests.send(request).await.is_ok()
    }

    pub async fn next_response(&mut self) -> Option<WorkerResponse> {
        self.responses.recv().await
    }

    /// Posts one request and waits for its answer. Responses arrive in
    /// request order.
    pub async fn request(&mut self, request: WorkerRequest) -> Option<WorkerResponse> {
        if !self.post(request).await {
            return None;
        }
        self.next_response().await
    }

    pub async fn shutdown(self) {
        drop(self.requests);
        let _ = self.task.await;
    }
}
