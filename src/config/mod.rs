//! Configuration module for the ASR gateway
//!
//! This module handles server configuration from environment variables and
//! `.env` files. Priority: ENV vars > .env values > defaults. The model path
//! can additionally be overridden by the first positional CLI argument.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use asr_gateway::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

mod env;
mod validation;

use thiserror::Error;

pub use env::{
    ENV_ALTERNATIVES, ENV_INTERFACE, ENV_MODEL_PATH, ENV_PORT, ENV_SAMPLE_RATE, ENV_SHOW_WORDS,
    ENV_SPK_MODEL_PATH, ENV_WORKER_THREADS,
};

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong type
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The merged configuration is not usable
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port)
/// - Model locations (default recognition model, optional speaker model)
/// - Recognition defaults applied to every new session
/// - Worker pool size
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // Models
    /// Default recognition model, shared by all sessions
    pub model_path: String,
    /// Optional speaker identification model
    pub spk_model_path: Option<String>,

    // Session defaults
    /// Sample rate assumed until a client sends its own
    pub sample_rate: f32,
    /// Number of alternative transcripts per result
    pub max_alternatives: u16,
    /// Include per-word timing in final results
    pub show_words: bool,

    // Compute
    /// Number of blocking recognition worker threads
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::DEFAULT_INTERFACE.to_string(),
            port: env::DEFAULT_PORT,
            model_path: env::DEFAULT_MODEL_PATH.to_string(),
            spk_model_path: None,
            sample_rate: env::DEFAULT_SAMPLE_RATE,
            max_alternatives: 0,
            show_words: true,
            worker_threads: crate::core::default_pool_size(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. The result is validated before
    /// it is returned.
    ///
    /// # Errors
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the model path (used for the positional CLI argument).
    pub fn with_model_path(mut self, model_path: impl Into<String>) -> Self {
        self.model_path = model_path.into();
        self
    }

    /// Check that the configuration can be served.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_model_path(&self.model_path)?;
        validation::validate_sample_rate(self.sample_rate)?;
        validation::validate_worker_threads(self.worker_threads)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
