//! Speech recognition engine abstraction.
//!
//! The gateway never decodes audio itself. It drives an engine through two
//! traits:
//!
//! - [`SpeechEngine`] loads models and builds recognizers. One engine instance
//!   is shared by every connection.
//! - [`Recognizer`] is the stateful decoder for a single session. It is owned
//!   by exactly one connection and only ever touched from a worker thread.
//!
//! Results are exchanged as JSON strings in the Kaldi/Vosk convention:
//! partial hypotheses carry a `partial` field, completed utterances carry
//! `text` plus `result` (word timings) and optionally `alternatives`.
//!
//! # Engines
//!
//! - **Vosk** (`vosk` feature) - offline Kaldi models through libvosk

#[cfg(feature = "vosk")]
pub mod vosk;

use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "vosk")]
pub use self::vosk::{VoskEngine, VoskRecognizer};

/// Errors raised by a speech engine or one of its recognizers.
#[derive(Debug, Error)]
pub enum RecognizerError {
    /// A model could not be loaded from the given location
    #[error("Failed to load model from '{path}': {reason}")]
    ModelLoad { path: String, reason: String },

    /// The recognizer could not be created with the requested settings
    #[error("Failed to create recognizer: {0}")]
    CreationFailed(String),

    /// Device (GPU) initialization failed
    #[error("Device initialization failed: {0}")]
    DeviceInit(String),

    /// Decoding failed while accepting audio
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
}

/// Result type for engine operations.
pub type RecognizerResult<T> = Result<T, RecognizerError>;

/// A stateful streaming decoder bound to one model and sample rate.
pub trait Recognizer: Send + 'static {
    /// Engine-specific speaker identification model.
    type SpeakerModel: Send + Sync + 'static;

    /// Feed a chunk of audio.
    ///
    /// Returns `true` when the chunk completed an utterance, in which case the
    /// caller should fetch [`Recognizer::result`]; otherwise the partial
    /// hypothesis is available from [`Recognizer::partial_result`].
    fn accept_waveform(&mut self, audio: &[u8]) -> RecognizerResult<bool>;

    /// Result for the utterance that just completed.
    fn result(&mut self) -> String;

    /// Current best guess for the utterance in progress.
    fn partial_result(&mut self) -> String;

    /// Flush the decoder and return everything not yet reported.
    fn final_result(&mut self) -> String;

    fn set_words(&mut self, enabled: bool);

    fn set_max_alternatives(&mut self, max_alternatives: u16);

    fn set_speaker_model(&mut self, model: &Self::SpeakerModel);
}

/// Factory for models and recognizers.
///
/// Every method except the two `init_*` hooks may block for a long time and
/// must not be called on an async runtime thread.
pub trait SpeechEngine: Send + Sync + 'static {
    type Model: Send + Sync + 'static;
    type SpeakerModel: Send + Sync + 'static;
    type Recognizer: Recognizer<SpeakerModel = Self::SpeakerModel>;

    /// Short engine name used in logs.
    fn name(&self) -> &'static str;

    /// Process-wide device setup, run once before serving.
    fn init_device(&self) -> RecognizerResult<()> {
        Ok(())
    }

    /// Per-thread device setup, run once by every worker thread.
    fn init_worker_thread(&self) {}

    fn load_model(&self, path: &str) -> RecognizerResult<Self::Model>;

    fn load_speaker_model(&self, path: &str) -> RecognizerResult<Self::SpeakerModel>;

    /// Build a recognizer; `phrase_list` restricts the vocabulary when given.
    fn create_recognizer(
        &self,
        model: &Self::Model,
        sample_rate: f32,
        phrase_list: Option<&[String]>,
    ) -> RecognizerResult<Self::Recognizer>;
}

/// Everything needed to construct a session's recognizer.
pub struct RecognizerParams<E: SpeechEngine> {
    pub model: Arc<E::Model>,
    pub sample_rate: f32,
    pub phrase_list: Option<Vec<String>>,
    pub show_words: bool,
    pub max_alternatives: u16,
    pub speaker_model: Option<Arc<E::SpeakerModel>>,
}

impl<E: SpeechEngine> std::fmt::Debug for RecognizerParams<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognizerParams")
            .field("sample_rate", &self.sample_rate)
            .field("phrase_list", &self.phrase_list)
            .field("show_words", &self.show_words)
            .field("max_alternatives", &self.max_alternatives)
            .field("speaker_model", &self.speaker_model.is_some())
            .finish()
    }
}

/// Construct a recognizer and apply the per-session output settings.
///
/// Blocking; call from a worker thread.
pub fn build_recognizer<E: SpeechEngine>(
    engine: &E,
    params: &RecognizerParams<E>,
) -> RecognizerResult<E::Recognizer> {
    let mut recognizer = engine.create_recognizer(
        &params.model,
        params.sample_rate,
        params.phrase_list.as_deref(),
    )?;
    recognizer.set_words(params.show_words);
    recognizer.set_max_alternatives(params.max_alternatives);
    if let Some(speaker_model) = &params.speaker_model {
        recognizer.set_speaker_model(speaker_model);
    }
    Ok(recognizer)
}
