//! Shared model registry.
//!
//! Sessions may switch models with `{"config": {"model": "<path>"}}`. Loading a
//! model is slow and memory hungry, so every identifier is loaded once and
//! the handle is shared by all sessions that ask for it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::recognizer::{RecognizerError, RecognizerResult, SpeechEngine};

type ModelSlot<M> = Arc<OnceCell<Arc<M>>>;

pub struct ModelRegistry<E: SpeechEngine> {
    // One slot per id; only sessions asking for the same id wait on each other.
    models: DashMap<String, ModelSlot<E::Model>>,
}

impl<E: SpeechEngine> Default for ModelRegistry<E> {
    fn default() -> Self {
        Self {
            models: DashMap::new(),
        }
    }
}

impl<E: SpeechEngine> ModelRegistry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already loaded model under `id`.
    pub fn insert(&self, id: impl Into<String>, model: Arc<E::Model>) {
        self.models
            .insert(id.into(), Arc::new(OnceCell::new_with(Some(model))));
    }

    pub fn get(&self, id: &str) -> Option<Arc<E::Model>> {
        self.models
            .get(id)
            .and_then(|entry| entry.value().get().cloned())
    }

    /// Number of loaded models.
    pub fn len(&self) -> usize {
        self.models
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the model for `id`, loading it on a blocking thread if needed.
    pub async fn resolve(&self, engine: &Arc<E>, id: &str) -> RecognizerResult<Arc<E::Model>> {
        if let Some(model) = self.get(id) {
            debug!(model = %id, "Model cache hit");
            return Ok(model);
        }

        let slot = Arc::clone(self.models.entry(id.to_string()).or_default().value());
        let loaded = slot
            .get_or_try_init(|| async {
                info!(model = %id, engine = engine.name(), "Loading model on demand");
                load_model_blocking(engine, id).await
            })
            .await
            .map(Arc::clone);

        if loaded.is_err() {
            self.models.remove_if(id, |_, slot| !slot.initialized());
        }
        loaded
    }
}

/// Load a model on the blocking thread pool.
pub async fn load_model_blocking<E: SpeechEngine>(
    engine: &Arc<E>,
    path: &str,
) -> RecognizerResult<Arc<E::Model>> {
    let engine = Arc::clone(engine);
    let path_owned = path.to_string();
    tokio::task::spawn_blocking(move || engine.load_model(&path_owned))
        .await
        .map_err(|e| RecognizerError::ModelLoad {
            path: path.to_string(),
            reason: format!("loader task failed: {e}"),
        })?
        .map(Arc::new)
}

/// Load a speaker model on the blocking thread pool.
pub async fn load_speaker_model_blocking<E: SpeechEngine>(
    engine: &Arc<E>,
    path: &str,
) -> RecognizerResult<Arc<E::SpeakerModel>> {
    let engine = Arc::clone(engine);
    let path_owned = path.to_string();
    tokio::task::spawn_blocking(move || engine.load_speaker_model(&path_owned))
        .await
        .map_err(|e| RecognizerError::ModelLoad {
            path: path.to_string(),
            reason: format!("loader task failed: {e}"),
        })?
        .map(Arc::new)
}
