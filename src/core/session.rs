//! Per-connection recognition session state.
//!
//! A [`SessionState`] is owned by one connection task. Config messages mutate
//! it through [`SessionState::apply_config`]; the recognizer itself is built
//! lazily when audio arrives and [`should_rebuild_recognizer`] says so.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::recognizer::{RecognizerParams, SpeechEngine};

/// Fields a client may send under `{"config": {...}}`.
///
/// Every field is optional; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfigUpdate {
    /// Vocabulary restriction for the next recognizer
    pub phrase_list: Option<Vec<String>>,

    /// Audio sample rate in Hz
    pub sample_rate: Option<f32>,

    /// Model identifier (a model path) replacing the current model
    pub model: Option<String>,

    /// Include per-word timing in final results
    #[serde(deserialize_with = "deserialize_truthy")]
    pub words: Option<bool>,

    /// Number of alternative transcripts to return
    pub max_alternatives: Option<u16>,
}

impl SessionConfigUpdate {
    /// Reject values the recognizer cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rate) = self.sample_rate
            && !(rate.is_finite() && rate > 0.0)
        {
            return Err(format!("sample_rate must be a positive number, got {rate}"));
        }
        if let Some(model) = &self.model
            && model.trim().is_empty()
        {
            return Err("model must not be empty".to_string());
        }
        Ok(())
    }
}

/// Accept `true`/`false` as well as numbers, where non-zero means true.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a boolean for `words`, got {other}"
        ))),
    }
}

/// Process-wide defaults a new session starts from.
pub struct SessionDefaults<E: SpeechEngine> {
    pub model: Arc<E::Model>,
    pub sample_rate: f32,
    pub show_words: bool,
    pub max_alternatives: u16,
}

impl<E: SpeechEngine> Clone for SessionDefaults<E> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            sample_rate: self.sample_rate,
            show_words: self.show_words,
            max_alternatives: self.max_alternatives,
        }
    }
}

/// Mutable recognition settings and the recognizer of one connection.
pub struct SessionState<E: SpeechEngine> {
    pub recognizer: Option<E::Recognizer>,
    pub phrase_list: Option<Vec<String>>,
    pub sample_rate: f32,
    pub show_words: bool,
    pub max_alternatives: u16,
    pub model: Arc<E::Model>,
    pub model_changed: bool,
}

impl<E: SpeechEngine> SessionState<E> {
    pub fn new(defaults: &SessionDefaults<E>) -> Self {
        Self {
            recognizer: None,
            phrase_list: None,
            sample_rate: defaults.sample_rate,
            show_words: defaults.show_words,
            max_alternatives: defaults.max_alternatives,
            model: Arc::clone(&defaults.model),
            model_changed: false,
        }
    }

    /// Merge a config update.
    ///
    /// `model` is the handle resolved from `update.model`; it is required
    /// whenever the update names a model and ignored otherwise.
    pub fn apply_config(&mut self, update: SessionConfigUpdate, model: Option<Arc<E::Model>>) {
        if let Some(phrase_list) = update.phrase_list {
            self.phrase_list = Some(phrase_list);
        }
        if let Some(sample_rate) = update.sample_rate {
            self.sample_rate = sample_rate;
        }
        if update.model.is_some()
            && let Some(model) = model
        {
            self.model = model;
            self.model_changed = true;
        }
        if let Some(words) = update.words {
            self.show_words = words;
        }
        if let Some(max_alternatives) = update.max_alternatives {
            self.max_alternatives = max_alternatives;
        }
    }

    /// Snapshot of what the next recognizer should be built with.
    pub fn recognizer_params(
        &self,
        speaker_model: Option<Arc<E::SpeakerModel>>,
    ) -> RecognizerParams<E> {
        RecognizerParams {
            model: Arc::clone(&self.model),
            sample_rate: self.sample_rate,
            phrase_list: self.phrase_list.clone(),
            show_words: self.show_words,
            max_alternatives: self.max_alternatives,
            speaker_model,
        }
    }
}

/// A recognizer is (re)built only when none exists yet or the model changed.
pub fn should_rebuild_recognizer<E: SpeechEngine>(state: &SessionState<E>) -> bool {
    state.recognizer.is_none() || state.model_changed
}
