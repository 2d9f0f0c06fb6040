//! Connection-level error taxonomy.
//!
//! Every variant is fatal to the connection it occurred on and to nothing
//! else. The handler uses [`SessionError::is_transport`] and
//! [`SessionError::is_protocol`] to pick a log level.

use thiserror::Error;

use crate::core::{OffloadError, PostProcessError, RecognizerError};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The client sent something the protocol does not allow
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A config message could not be parsed or holds invalid values
    #[error("Invalid config message: {0}")]
    InvalidConfig(String),

    /// Model resolution or recognizer construction/decoding failed
    #[error("Recognition error: {0}")]
    Recognition(#[from] RecognizerError),

    /// The recognizer returned a result that could not be post-processed
    #[error("Result processing error: {0}")]
    PostProcess(#[from] PostProcessError),

    /// The worker running the recognizer failed
    #[error("Worker error: {0}")]
    Offload(#[from] OffloadError),

    /// Reading from or writing to the websocket failed
    #[error("Transport error: {0}")]
    Transport(String),
}

impl SessionError {
    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            SessionError::Protocol(_) | SessionError::InvalidConfig(_)
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
