//! Environment variable loading.

use std::env;
use std::str::FromStr;

use super::{ConfigError, ServerConfig};

pub const ENV_INTERFACE: &str = "VOSK_SERVER_INTERFACE";
pub const ENV_PORT: &str = "VOSK_SERVER_PORT";
pub const ENV_MODEL_PATH: &str = "VOSK_MODEL_PATH";
pub const ENV_SPK_MODEL_PATH: &str = "VOSK_SPK_MODEL_PATH";
pub const ENV_SAMPLE_RATE: &str = "VOSK_SAMPLE_RATE";
pub const ENV_ALTERNATIVES: &str = "VOSK_ALTERNATIVES";
pub const ENV_SHOW_WORDS: &str = "VOSK_SHOW_WORDS";
pub const ENV_WORKER_THREADS: &str = "VOSK_WORKER_THREADS";

pub(super) const DEFAULT_INTERFACE: &str = "0.0.0.0";
pub(super) const DEFAULT_PORT: u16 = 2700;
pub(super) const DEFAULT_MODEL_PATH: &str = "model";
pub(super) const DEFAULT_SAMPLE_RATE: f32 = 8000.0;

/// Build a [`ServerConfig`] from the process environment.
pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();

    Ok(ServerConfig {
        host: env_string(ENV_INTERFACE).unwrap_or(defaults.host),
        port: env_parse(ENV_PORT)?.unwrap_or(defaults.port),
        model_path: env_string(ENV_MODEL_PATH).unwrap_or(defaults.model_path),
        spk_model_path: env_string(ENV_SPK_MODEL_PATH),
        sample_rate: env_parse(ENV_SAMPLE_RATE)?.unwrap_or(defaults.sample_rate),
        max_alternatives: env_parse(ENV_ALTERNATIVES)?.unwrap_or(defaults.max_alternatives),
        show_words: env_bool(ENV_SHOW_WORDS)?.unwrap_or(defaults.show_words),
        worker_threads: env_parse(ENV_WORKER_THREADS)?.unwrap_or(defaults.worker_threads),
    })
}

/// Non-empty, trimmed value of `name`.
fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidEnv {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn env_bool(name: &'static str) -> Result<Option<bool>, ConfigError> {
    env_string(name)
        .map(|value| match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidEnv {
                name,
                value,
                reason: "expected true/false, 1/0, yes/no or on/off".to_string(),
            }),
        })
        .transpose()
}
