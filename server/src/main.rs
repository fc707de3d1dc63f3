use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing::{info, warn};

use server::{build_router, config::ServerConfig, AppState};
use tts_core::PiperLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting TTS server...");

    let config = ServerConfig::from_env();
    let loader = Arc::new(PiperLoader::new(config.model_map_path.clone()));
    let state = AppState::new(loader, config.clone());

    if config.preload {
        info!(model_id = %config.model_id, "Pre-loading model");
        // the server stays up; requests retry the load
        if let Err(e) = state.models.get_or_load().await {
            warn!("Failed to pre-load model: {e}");
        }
    } else {
        info!("Skipping model pre-load (QWEN_TTS_PRELOAD != 1)");
    }

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different QWEN_TTS_API_PORT.")
    })?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
