/// Progressive loading over real HTTP against the artifact server.
mod common;

use std::sync::Arc;
use std::time::Duration;

use splintboard::app::create_app;
use splintboard::client::{DataLoader, HttpDataSource, LoadState};
use splintboard::config::{DataConfig, LoaderConfig, ServerConfig};
use splintboard::models::{FullDataArtifact, Dimension};
use splintboard::services::filter_service::FilterSession;
use splintboard::services::pipeline_service::run_pipeline;
use splintboard::state::AppState;
use tempfile::TempDir;
use tokio::net::TcpListener;

use common::{csv_with_rows, read_json, write_csv};

async fn serve(rows: usize, chunk_size: usize) -> (TempDir, DataConfig, String) {
    let dir = tempfile::tempdir().unwrap();
    let config = DataConfig::new(dir.path()).with_chunk_size(chunk_size);
    write_csv(&config, &csv_with_rows(rows));
    run_pipeline(&config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_app(AppState::new(config.clone(), ServerConfig::default()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (dir, config, format!("http://{}", addr))
}

fn loader(base_url: &str) -> DataLoader {
    let config = LoaderConfig::new(base_url).with_inter_page_delay(Duration::from_millis(1));
    let source = HttpDataSource::new(&config).unwrap();
    DataLoader::new(Arc::new(source), config)
}

#[tokio::test]
async fn test_chunked_load_reproduces_full_dataset() {
    let (_dir, config, base_url) = serve(95, 20).await;
    let loader = loader(&base_url);
    let mut updates = loader.subscribe();

    let background = loader.load().await.expect("five pages need a background task");
    assert!(loader.snapshot().state.is_interactive());
    assert!(loader.snapshot().rows.len() >= 20);

    background.await.unwrap();
    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.pages_loaded, 5);
    assert!(snapshot.failed_pages.is_empty());

    let full: FullDataArtifact = serde_json::from_value(read_json(&config.full_data_path())).unwrap();
    assert_eq!(*snapshot.rows, full.data);
    assert_eq!(snapshot.indexes.unwrap().as_ref(), &full.indexes);
}

#[tokio::test]
async fn test_missing_chunk_is_skipped() {
    let (_dir, config, base_url) = serve(60, 20).await;
    std::fs::remove_file(config.chunk_path(2)).unwrap();

    let loader = loader(&base_url);
    loader.load().await.unwrap().await.unwrap();

    let snapshot = loader.snapshot();
    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.rows.len(), 40);
}

#[tokio::test]
async fn test_missing_metadata_uses_full_dataset() {
    let (_dir, config, base_url) = serve(30, 20).await;
    std::fs::remove_file(config.metadata_path()).unwrap();

    let loader = loader(&base_url);
    assert!(loader.load().await.is_none());
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.rows.len(), 30);
}

#[tokio::test]
async fn test_only_csv_left_is_degraded() {
    let (_dir, config, base_url) = serve(8, 20).await;
    std::fs::remove_file(config.metadata_path()).unwrap();
    std::fs::remove_file(config.full_data_path()).unwrap();

    let loader = loader(&base_url);
    loader.load().await;
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.state, LoadState::DegradedReady);
    assert_eq!(snapshot.rows.len(), 8);
}

#[tokio::test]
async fn test_nothing_left_is_empty() {
    let (_dir, config, base_url) = serve(8, 20).await;
    std::fs::remove_file(config.metadata_path()).unwrap();
    std::fs::remove_file(config.full_data_path()).unwrap();
    std::fs::remove_file(config.csv_path()).unwrap();

    let loader = loader(&base_url);
    loader.load().await;
    let snapshot = loader.snapshot();
    assert_eq!(snapshot.state, LoadState::Empty);
    assert!(snapshot.rows.is_empty());
}

#[tokio::test]
async fn test_loaded_rows_drive_a_filter_session() {
    let (_dir, _config, base_url) = serve(40, 10).await;
    let loader = loader(&base_url);
    loader.load().await.unwrap().await.unwrap();

    let mut session = FilterSession::new(loader.snapshot().rows.clone());
    session.set_dimension(Dimension::Category, ["Watches"]);

    assert_eq!(session.filtered_rows().len(), 20);
    assert_eq!(session.options().assets, vec!["Daytona", "Nautilus"]);
    assert!(session.options().experts.contains(&"ExpertA".to_string()));
}
