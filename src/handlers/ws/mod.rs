//! Streaming recognition over WebSocket

pub mod handler;
pub mod messages;
pub mod processor;

pub use handler::ws_voice_handler;
pub use messages::{Chunk, IncomingMessage};
pub use processor::{process_chunk, recognize_chunk};
