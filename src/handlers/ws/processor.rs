//! Recognition step executed on a worker thread.
//!
//! Everything here blocks. The connection task moves its recognizer into a
//! worker job, the job runs [`recognize_chunk`] and hands the recognizer back
//! together with the response.

use tracing::{debug, info};

use crate::core::{
    Recognizer, RecognizerError, RecognizerParams, SpeechEngine, TextNormalizer,
    build_recognizer, correct_numbers,
};
use crate::errors::SessionResult;

use super::messages::Chunk;

/// Feed one chunk to the recognizer and post-process its result.
///
/// Returns the response text and whether the session should end.
pub fn process_chunk<R: Recognizer>(
    recognizer: &mut R,
    chunk: &Chunk,
    normalizer: &dyn TextNormalizer,
) -> SessionResult<(String, bool)> {
    let (raw, stop) = match chunk {
        Chunk::Eof => {
            let final_message = recognizer.final_result();
            info!(result = %final_message, "Final result");
            (final_message, true)
        }
        Chunk::Reset => (recognizer.final_result(), false),
        Chunk::Audio(audio) => {
            if recognizer.accept_waveform(audio)? {
                (recognizer.result(), false)
            } else {
                (recognizer.partial_result(), false)
            }
        }
    };

    Ok(correct_numbers(raw, stop, normalizer)?)
}

/// Worker job: (re)build the recognizer if asked, then process the chunk.
///
/// The recognizer is always handed back unless building it failed.
pub fn recognize_chunk<E: SpeechEngine>(
    engine: &E,
    normalizer: &dyn TextNormalizer,
    recognizer: Option<E::Recognizer>,
    rebuild: Option<RecognizerParams<E>>,
    chunk: Chunk,
) -> (Option<E::Recognizer>, SessionResult<(String, bool)>) {
    let recognizer = match rebuild {
        Some(params) => {
            // Release the previous decoder before allocating a new one.
            drop(recognizer);
            debug!(engine = engine.name(), ?params, "Creating recognizer");
            match build_recognizer(engine, &params) {
                Ok(recognizer) => recognizer,
                Err(e) => return (None, Err(e.into())),
            }
        }
        None => match recognizer {
            Some(recognizer) => recognizer,
            None => {
                return (
                    None,
                    Err(RecognizerError::CreationFailed(
                        "no recognizer available for this session".to_string(),
                    )
                    .into()),
                );
            }
        },
    };

    let mut recognizer = recognizer;
    let outcome = process_chunk(&mut recognizer, &chunk, normalizer);
    (Some(recognizer), outcome)
}
