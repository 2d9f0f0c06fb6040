pub mod models;
pub mod normalizer;
pub mod offload;
pub mod postprocess;
pub mod recognizer;
pub mod session;

// Re-export commonly used types for convenience
pub use models::ModelRegistry;
pub use normalizer::{NumberExtractor, TextNormalizer};
pub use offload::{OffloadError, WorkerPool, default_pool_size};
pub use postprocess::{PostProcessError, correct_numbers};
pub use recognizer::{
    Recognizer, RecognizerError, RecognizerParams, RecognizerResult, SpeechEngine,
    build_recognizer,
};
pub use session::{SessionConfigUpdate, SessionDefaults, SessionState, should_rebuild_recognizer};

#[cfg(feature = "vosk")]
pub use recognizer::{VoskEngine, VoskRecognizer};
