use clap::Parser;

use anyhow::anyhow;

use asr_gateway::ServerConfig;

/// ASR Gateway - Streaming speech recognition server
#[derive(Parser, Debug)]
#[command(name = "asr-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the recognition model (overrides VOSK_MODEL_PATH)
    #[arg(value_name = "MODEL_PATH")]
    model_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?;
    if let Some(model_path) = cli.model_path {
        config = config.with_model_path(model_path);
        config.validate().map_err(|e| anyhow!(e.to_string()))?;
    }

    serve(config).await
}

#[cfg(feature = "vosk")]
async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use tokio::net::TcpListener;
    use tracing::info;

    use asr_gateway::{NumberExtractor, VoskEngine, init, routes};

    let address = config.address();
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| anyhow!("Invalid server address '{}': {}", address, e))?;

    let app_state = init::bootstrap(config, VoskEngine::new(), Arc::new(NumberExtractor::new())).await?;
    info!(
        workers = app_state.pool.size(),
        model = %app_state.config.model_path,
        "Recognition ready"
    );

    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&socket_addr).await?;
    info!("Server listening on ws://{}", socket_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

#[cfg(feature = "vosk")]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(not(feature = "vosk"))]
async fn serve(_config: ServerConfig) -> anyhow::Result<()> {
    Err(anyhow!(
        "asr-gateway was built without a recognition engine. \
         Rebuild with `--features vosk` (requires libvosk)."
    ))
}
