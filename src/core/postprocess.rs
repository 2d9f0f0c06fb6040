//! Recognition result post-processing.
//!
//! Final results (those carrying both `result` and `text`) get their
//! transcript run through the number normalizer. Everything else, including
//! partial hypotheses and alternatives-only results, is passed through
//! byte-for-byte.

use serde_json::Value;
use thiserror::Error;

use super::normalizer::TextNormalizer;

#[derive(Debug, Error)]
pub enum PostProcessError {
    /// The recognizer produced something that is not JSON
    #[error("Malformed recognition result: {0}")]
    MalformedResult(#[from] serde_json::Error),
}

/// Normalize numbers in a raw recognition result.
///
/// Returns the response text to send and the unchanged `stop` flag.
pub fn correct_numbers(
    response: String,
    stop: bool,
    normalizer: &dyn TextNormalizer,
) -> Result<(String, bool), PostProcessError> {
    let mut data: Value = serde_json::from_str(&response)?;

    let Some(object) = data.as_object_mut() else {
        return Ok((response, stop));
    };
    if !object.contains_key("result") {
        return Ok((response, stop));
    }
    // `result` without a transcript passes through untouched.
    let Some(text) = object.get("text").and_then(Value::as_str) else {
        return Ok((response, stop));
    };

    let (guess, _mask) = normalizer.replace(text, true);
    object.insert("text".to_string(), Value::String(guess));

    Ok((serde_json::to_string(&data)?, stop))
}
