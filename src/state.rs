//! Process-wide application state.
//!
//! Built once by [`crate::init::bootstrap`] and shared read-only, through an
//! `Arc`, by every connection handler and every worker job.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::{ModelRegistry, SessionDefaults, SpeechEngine, TextNormalizer, WorkerPool};

pub struct AppState<E: SpeechEngine> {
    pub config: ServerConfig,
    pub engine: Arc<E>,
    /// Defaults every new session starts from, including the default model
    pub session_defaults: SessionDefaults<E>,
    pub speaker_model: Option<Arc<E::SpeakerModel>>,
    pub models: ModelRegistry<E>,
    pub pool: WorkerPool,
    pub normalizer: Arc<dyn TextNormalizer>,
}

impl<E: SpeechEngine> AppState<E> {
    /// Assemble state from already initialized parts.
    ///
    /// The default model is registered under the configured model path so a
    /// client asking for it by name shares the same handle.
    pub fn new(
        config: ServerConfig,
        engine: Arc<E>,
        default_model: Arc<E::Model>,
        speaker_model: Option<Arc<E::SpeakerModel>>,
        pool: WorkerPool,
        normalizer: Arc<dyn TextNormalizer>,
    ) -> Arc<Self> {
        let models = ModelRegistry::new();
        models.insert(config.model_path.clone(), Arc::clone(&default_model));

        let session_defaults = SessionDefaults {
            model: default_model,
            sample_rate: config.sample_rate,
            show_words: config.show_words,
            max_alternatives: config.max_alternatives,
        };

        Arc::new(Self {
            config,
            engine,
            session_defaults,
            speaker_model,
            models,
            pool,
            normalizer,
        })
    }
}
