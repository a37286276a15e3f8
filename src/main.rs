use anyhow::Context;
use tokio::net::TcpListener;

use splintboard::app;
use splintboard::config::{DataConfig, ServerConfig};
use splintboard::logging::{init_logging, LoggingConfig};
use splintboard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env("splintboard"))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let data = DataConfig::from_env();
    data.validate().map_err(anyhow::Error::msg)?;
    let server = ServerConfig::from_env();
    let addr = server.bind_addr;

    tracing::info!("📁 Serving artifacts from {}", data.data_dir.display());
    let state = AppState::new(data, server);
    let app = app::create_app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 Splintboard backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
