//! Process bootstrap.
//!
//! Prepares everything that is shared across connections before the server
//! starts accepting: device initialization, the worker pool, the default
//! model and the optional speaker model.
//!
//! ```rust,ignore
//! let state = init::bootstrap(config, VoskEngine::new(), Arc::new(NumberExtractor::new())).await?;
//! let app = routes::create_router(state);
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::ServerConfig;
use crate::core::models::{load_model_blocking, load_speaker_model_blocking};
use crate::core::{SpeechEngine, TextNormalizer, WorkerPool};
use crate::state::AppState;

/// Build the shared application state.
pub async fn bootstrap<E: SpeechEngine>(
    config: ServerConfig,
    engine: E,
    normalizer: Arc<dyn TextNormalizer>,
) -> Result<Arc<AppState<E>>> {
    let engine = Arc::new(engine);

    engine
        .init_device()
        .with_context(|| format!("{} device initialization failed", engine.name()))?;

    let pool = {
        let engine = Arc::clone(&engine);
        WorkerPool::new(config.worker_threads, move || engine.init_worker_thread())
            .context("Failed to start recognition worker pool")?
    };

    let default_model = load_model_blocking(&engine, &config.model_path)
        .await
        .with_context(|| format!("Failed to load default model '{}'", config.model_path))?;
    info!(model = %config.model_path, engine = engine.name(), "Default model loaded");

    let speaker_model = match &config.spk_model_path {
        Some(path) => {
            let model = load_speaker_model_blocking(&engine, path)
                .await
                .with_context(|| format!("Failed to load speaker model '{path}'"))?;
            info!(model = %path, "Speaker model loaded");
            Some(model)
        }
        None => None,
    };

    Ok(AppState::new(
        config,
        engine,
        default_model,
        speaker_model,
        pool,
        normalizer,
    ))
}
