//! WebSocket message types for the recognition protocol
//!
//! ## Client → Server
//!
//! - `{"config": {...}}` - update session settings, no response
//! - `{"eof" : 1}` - flush the recognizer, respond, then close
//! - `{"reset" : 1}` - flush the recognizer, respond, keep the session
//! - Binary frames - audio appended to the current utterance
//!
//! ## Server → Client
//!
//! One JSON text frame per audio/control frame: `{"partial": ...}` while an
//! utterance is in progress, `{"text": ..., "result": [...]}` (or
//! `{"alternatives": [...]}`) when it completes.

use bytes::Bytes;
use serde_json::Value;

use crate::core::SessionConfigUpdate;
use crate::errors::{SessionError, SessionResult};

pub const CONFIG_KEY: &str = "config";
pub const EOF_KEY: &str = "eof";
pub const RESET_KEY: &str = "reset";

/// Work handed to the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Raw audio bytes
    Audio(Bytes),
    /// Flush and keep the session open
    Reset,
    /// Flush and end the session
    Eof,
}

/// A classified incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    Config(SessionConfigUpdate),
    Chunk(Chunk),
}

impl IncomingMessage {
    /// Classify a text frame.
    ///
    /// Text frames must be JSON objects with a `config`, `eof` or `reset` key.
    /// Anything else is a protocol error.
    pub fn from_text(text: &str) -> SessionResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            if text.contains(CONFIG_KEY) {
                SessionError::InvalidConfig(e.to_string())
            } else {
                SessionError::Protocol(format!("text frame is not valid JSON: {e}"))
            }
        })?;

        let Value::Object(mut object) = value else {
            return Err(SessionError::Protocol(
                "text frame must be a JSON object".to_string(),
            ));
        };

        if let Some(config) = object.remove(CONFIG_KEY) {
            let update: SessionConfigUpdate = serde_json::from_value(config)
                .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
            update.validate().map_err(SessionError::InvalidConfig)?;
            return Ok(IncomingMessage::Config(update));
        }
        if object.contains_key(EOF_KEY) {
            return Ok(IncomingMessage::Chunk(Chunk::Eof));
        }
        if object.contains_key(RESET_KEY) {
            return Ok(IncomingMessage::Chunk(Chunk::Reset));
        }

        Err(SessionError::Protocol(format!(
            "unrecognized text frame with keys {:?}",
            object.keys().collect::<Vec<_>>()
        )))
    }

    pub fn from_binary(data: Bytes) -> Self {
        IncomingMessage::Chunk(Chunk::Audio(data))
    }
}
