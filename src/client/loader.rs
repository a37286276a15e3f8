//! Progressive client-side loading.
//!
//! The loader fetches the metadata artifact, then page 1, publishes a usable
//! snapshot and keeps appending pages 2..N from a background task. When the
//! chunked artifacts are unavailable it walks the fallback chain: full JSON
//! dataset, then raw CSV, then an explicit empty state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::client::data_source::{DataSource, FullDataset};
use crate::config::LoaderConfig;
use crate::models::{IndexVocabulary, ProcessedRow};
use crate::services::csv_ingest_service::ingest_csv;
use crate::services::date_service::DateEncoding;
use crate::services::index_service::build_indexes;
use crate::services::row_processor::process_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    LoadingMetadata,
    LoadingFirstPage,
    LoadingRemainingPages,
    LoadingFullDataset,
    Ready,
    /// Data came from the raw CSV fallback.
    DegradedReady,
    Empty,
}

impl LoadState {
    /// Whether the rows are usable, even if more are still arriving.
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            LoadState::LoadingRemainingPages | LoadState::Ready | LoadState::DegradedReady
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Ready | LoadState::DegradedReady | LoadState::Empty)
    }
}

/// What the UI sees after every transition or appended page.
#[derive(Debug, Clone)]
pub struct LoadSnapshot {
    pub state: LoadState,
    pub rows: Arc<Vec<ProcessedRow>>,
    pub indexes: Option<Arc<IndexVocabulary>>,
    pub pages_loaded: usize,
    pub total_pages: usize,
    pub failed_pages: Vec<usize>,
}

impl Default for LoadSnapshot {
    fn default() -> Self {
        Self {
            state: LoadState::Idle,
            rows: Arc::new(Vec::new()),
            indexes: None,
            pages_loaded: 0,
            total_pages: 0,
            failed_pages: Vec::new(),
        }
    }
}

pub struct DataLoader {
    source: Arc<dyn DataSource>,
    config: LoaderConfig,
    snapshot: Arc<watch::Sender<LoadSnapshot>>,
}

impl DataLoader {
    pub fn new(source: Arc<dyn DataSource>, config: LoaderConfig) -> Self {
        let (snapshot, _) = watch::channel(LoadSnapshot::default());
        Self {
            source,
            config,
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        self.snapshot.borrow().clone()
    }

    fn set_state(&self, state: LoadState) {
        info!("Loader state -> {:?}", state);
        self.snapshot.send_modify(|s| s.state = state);
    }

    /// Runs the load until something is interactive or the chain is exhausted.
    ///
    /// Returns the handle of the background task fetching pages 2..N, if one
    /// was started. The returned snapshot state is never `Idle` or a
    /// `Loading*` state other than `LoadingRemainingPages`.
    pub async fn load(&self) -> Option<JoinHandle<()>> {
        self.set_state(LoadState::LoadingMetadata);

        match self.source.fetch_metadata().await {
            Ok(metadata) => {
                let total_pages = metadata.metadata.total_chunks.unwrap_or(1);
                info!(
                    "📦 Metadata loaded: {} rows across {} chunks",
                    metadata.metadata.total_rows, total_pages
                );
                self.snapshot.send_modify(|s| {
                    s.indexes = Some(Arc::new(metadata.indexes));
                    s.total_pages = total_pages;
                });

                if total_pages == 0 {
                    self.set_state(LoadState::Ready);
                    return None;
                }

                self.set_state(LoadState::LoadingFirstPage);
                match self.source.fetch_chunk(1).await {
                    Ok(rows) => {
                        info!("✓ First page loaded ({} rows)", rows.len());
                        self.snapshot.send_modify(|s| {
                            s.rows = Arc::new(rows);
                            s.pages_loaded = 1;
                        });

                        if total_pages == 1 {
                            self.set_state(LoadState::Ready);
                            return None;
                        }

                        self.set_state(LoadState::LoadingRemainingPages);
                        return Some(self.spawn_remaining_pages(total_pages));
                    }
                    Err(e) => {
                        warn!("First page failed: {}. Falling back to full dataset", e);
                        self.snapshot.send_modify(|s| s.indexes = None);
                    }
                }
            }
            Err(e) => {
                warn!("Metadata unavailable: {}. Falling back to full dataset", e);
            }
        }

        self.load_fallbacks().await;
        None
    }

    fn spawn_remaining_pages(&self, total_pages: usize) -> JoinHandle<()> {
        let source = self.source.clone();
        let snapshot = self.snapshot.clone();
        let delay = self.config.inter_page_delay;

        tokio::spawn(async move {
            for page in 2..=total_pages {
                tokio::time::sleep(delay).await;

                match source.fetch_chunk(page).await {
                    Ok(rows) => {
                        if rows.is_empty() {
                            warn!("Page {} came back empty", page);
                        }
                        snapshot.send_modify(|s| {
                            Arc::make_mut(&mut s.rows).extend(rows);
                            s.pages_loaded += 1;
                        });
                    }
                    Err(e) => {
                        warn!("Skipping page {}/{}: {}", page, total_pages, e);
                        snapshot.send_modify(|s| s.failed_pages.push(page));
                    }
                }
            }

            snapshot.send_modify(|s| s.state = LoadState::Ready);
            let current = snapshot.borrow();
            info!(
                "✅ Background loading finished: {} rows, {} pages skipped",
                current.rows.len(),
                current.failed_pages.len()
            );
        })
    }

    async fn load_fallbacks(&self) {
        self.set_state(LoadState::LoadingFullDataset);

        match self.source.fetch_full_dataset().await {
            Ok(FullDataset::Json(full)) => {
                info!("✓ Full dataset loaded ({} rows)", full.data.len());
                self.snapshot.send_modify(|s| {
                    s.indexes = Some(Arc::new(full.indexes));
                    s.rows = Arc::new(full.data);
                    s.state = LoadState::Ready;
                });
                return;
            }
            Ok(FullDataset::Csv(csv)) => {
                warn!("Full dataset endpoint served CSV, parsing locally");
                if self.apply_csv(&csv) {
                    return;
                }
            }
            Err(e) => {
                warn!("Full dataset unavailable: {}. Falling back to raw CSV", e);
            }
        }

        match self.source.fetch_raw_csv().await {
            Ok(csv) => {
                if self.apply_csv(&csv) {
                    return;
                }
            }
            Err(e) => {
                error!("Raw CSV unavailable: {}", e);
            }
        }

        error!("All data sources failed, showing empty state");
        self.snapshot.send_modify(|s| {
            s.rows = Arc::new(Vec::new());
            s.indexes = None;
            s.state = LoadState::Empty;
        });
    }

    /// Parses CSV with numeric date columns. Returns false when it yields nothing.
    fn apply_csv(&self, csv: &str) -> bool {
        let report = match ingest_csv(csv, DateEncoding::ExcelSerial) {
            Ok(report) => report,
            Err(e) => {
                warn!("CSV fallback could not be parsed: {:#}", e);
                return false;
            }
        };

        let rows = process_rows(report.rows);
        if rows.is_empty() {
            warn!("CSV fallback contained no usable rows");
            return false;
        }

        let indexes = build_indexes(&rows);
        info!("⚠️ Loaded {} rows from CSV fallback", rows.len());
        self.snapshot.send_modify(|s| {
            s.indexes = Some(Arc::new(indexes));
            s.rows = Arc::new(rows);
            s.state = LoadState::DegradedReady;
        });
        true
    }
}
