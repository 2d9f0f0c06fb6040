//! Vosk (Kaldi) engine backed by libvosk.
//!
//! Audio frames are expected as 16-bit little-endian mono PCM. libvosk returns
//! typed results, which are rendered back into the JSON shape its native API
//! produces so clients see the usual `partial` / `text` / `result` fields.

use serde_json::{Map, Value, json};
use tracing::info;
use vosk::{CompleteResult, DecodingState, Model, PartialResult, SpeakerModel, Word};

use super::{Recognizer, RecognizerError, RecognizerResult, SpeechEngine};

/// Engine backed by libvosk.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoskEngine;

impl VoskEngine {
    pub fn new() -> Self {
        vosk::set_log_level(vosk::LogLevel::Warn);
        Self
    }
}

impl SpeechEngine for VoskEngine {
    type Model = Model;
    type SpeakerModel = SpeakerModel;
    type Recognizer = VoskRecognizer;

    fn name(&self) -> &'static str {
        "vosk"
    }

    fn init_device(&self) -> RecognizerResult<()> {
        #[cfg(feature = "gpu")]
        {
            info!("Initializing GPU for Vosk decoding");
            vosk::gpu_init();
        }
        Ok(())
    }

    fn init_worker_thread(&self) {
        #[cfg(feature = "gpu")]
        {
            info!(thread = ?std::thread::current().name(), "Initializing GPU worker thread");
            vosk::gpu_thread_init();
        }
    }

    fn load_model(&self, path: &str) -> RecognizerResult<Model> {
        info!(path = %path, "Loading Vosk model");
        Model::new(path).ok_or_else(|| RecognizerError::ModelLoad {
            path: path.to_string(),
            reason: "libvosk rejected the model directory".to_string(),
        })
    }

    fn load_speaker_model(&self, path: &str) -> RecognizerResult<SpeakerModel> {
        info!(path = %path, "Loading Vosk speaker model");
        SpeakerModel::new(path).ok_or_else(|| RecognizerError::ModelLoad {
            path: path.to_string(),
            reason: "libvosk rejected the speaker model directory".to_string(),
        })
    }

    fn create_recognizer(
        &self,
        model: &Model,
        sample_rate: f32,
        phrase_list: Option<&[String]>,
    ) -> RecognizerResult<VoskRecognizer> {
        let inner = match phrase_list {
            Some(phrases) if !phrases.is_empty() => {
                vosk::Recognizer::new_with_grammar(model, sample_rate, phrases)
            }
            _ => vosk::Recognizer::new(model, sample_rate),
        };
        inner
            .map(|inner| VoskRecognizer { inner })
            .ok_or_else(|| {
                RecognizerError::CreationFailed(format!(
                    "libvosk could not create a recognizer at {sample_rate} Hz"
                ))
            })
    }
}

/// A libvosk recognizer producing JSON results.
pub struct VoskRecognizer {
    inner: vosk::Recognizer,
}

impl Recognizer for VoskRecognizer {
    type SpeakerModel = SpeakerModel;

    fn accept_waveform(&mut self, audio: &[u8]) -> RecognizerResult<bool> {
        // A trailing odd byte cannot form a sample and is dropped.
        let samples: Vec<i16> = audio
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        match self.inner.accept_waveform(&samples) {
            Ok(DecodingState::Finalized) => Ok(true),
            Ok(DecodingState::Running) => Ok(false),
            Ok(DecodingState::Failed) => Err(RecognizerError::DecodingFailed(
                "libvosk reported a decoding failure".to_string(),
            )),
            Err(e) => Err(RecognizerError::DecodingFailed(format!("{e:?}"))),
        }
    }

    fn result(&mut self) -> String {
        complete_to_json(self.inner.result())
    }

    fn partial_result(&mut self) -> String {
        partial_to_json(self.inner.partial_result())
    }

    fn final_result(&mut self) -> String {
        complete_to_json(self.inner.final_result())
    }

    fn set_words(&mut self, enabled: bool) {
        self.inner.set_words(enabled);
    }

    fn set_max_alternatives(&mut self, max_alternatives: u16) {
        self.inner.set_max_alternatives(max_alternatives);
    }

    fn set_speaker_model(&mut self, model: &SpeakerModel) {
        self.inner.set_speaker_model(model);
    }
}

fn word_to_json(word: &Word<'_>) -> Value {
    json!({
        "conf": word.conf,
        "end": word.end,
        "start": word.start,
        "word": word.word,
    })
}

fn partial_to_json(partial: PartialResult<'_>) -> String {
    let mut object = Map::new();
    if !partial.partial_result.is_empty() {
        object.insert(
            "partial_result".to_string(),
            Value::Array(partial.partial_result.iter().map(word_to_json).collect()),
        );
    }
    object.insert("partial".to_string(), Value::from(partial.partial));
    Value::Object(object).to_string()
}

fn complete_to_json(result: CompleteResult<'_>) -> String {
    match result {
        CompleteResult::Single(single) => {
            let mut object = Map::new();
            if !single.result.is_empty() {
                object.insert(
                    "result".to_string(),
                    Value::Array(single.result.iter().map(word_to_json).collect()),
                );
            }
            if let Some(info) = single.speaker_info {
                object.insert("spk".to_string(), json!(info.vector));
                object.insert("spk_frames".to_string(), json!(info.frames));
            }
            object.insert("text".to_string(), Value::from(single.text));
            Value::Object(object).to_string()
        }
        CompleteResult::Multiple(multiple) => {
            let alternatives: Vec<Value> = multiple
                .alternatives
                .iter()
                .map(|alternative| {
                    let words: Vec<Value> = alternative
                        .result
                        .iter()
                        .map(|word| {
                            json!({
                                "end": word.end,
                                "start": word.start,
                                "word": word.word,
                            })
                        })
                        .collect();
                    json!({
                        "confidence": alternative.confidence,
                        "result": words,
                        "text": alternative.text,
                    })
                })
                .collect();
            json!({ "alternatives": alternatives }).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vosk::{
        Alternative, CompleteResultMultiple, CompleteResultSingle, SpeakerInfo, WordInAlternative,
    };

    fn parse(rendered: String) -> Value {
        serde_json::from_str(&rendered).unwrap()
    }

    fn words() -> Vec<Word<'static>> {
        vec![
            Word {
                conf: 1.0,
                start: 0.25,
                end: 0.5,
                word: "twenty",
            },
            Word {
                conf: 0.75,
                start: 0.5,
                end: 1.0,
                word: "three",
            },
        ]
    }

    #[test]
    fn test_single_with_words_keeps_result() {
        let rendered = parse(complete_to_json(CompleteResult::Single(CompleteResultSingle {
            speaker_info: None,
            result: words(),
            text: "twenty three",
        })));

        assert_eq!(rendered["text"], "twenty three");
        assert_eq!(rendered["result"][0]["word"], "twenty");
        assert_eq!(rendered["result"][1]["conf"], 0.75);
        assert_eq!(rendered["result"][1]["end"], 1.0);
        assert!(rendered.get("spk").is_none());
    }

    #[test]
    fn test_single_without_words_omits_result() {
        let rendered = parse(complete_to_json(CompleteResult::Single(CompleteResultSingle {
            speaker_info: None,
            result: Vec::new(),
            text: "hello",
        })));

        assert_eq!(rendered, json!({"text": "hello"}));
    }

    #[test]
    fn test_single_with_speaker_info() {
        let rendered = parse(complete_to_json(CompleteResult::Single(CompleteResultSingle {
            speaker_info: Some(SpeakerInfo {
                vector: vec![0.5, -0.25],
                frames: 120,
            }),
            result: words(),
            text: "twenty three",
        })));

        assert_eq!(rendered["spk"], json!([0.5, -0.25]));
        assert_eq!(rendered["spk_frames"], 120);
        assert_eq!(rendered["text"], "twenty three");
    }

    #[test]
    fn test_multiple_renders_alternatives() {
        let rendered = parse(complete_to_json(CompleteResult::Multiple(
            CompleteResultMultiple {
                alternatives: vec![
                    Alternative {
                        confidence: 200.5,
                        result: vec![WordInAlternative {
                            start: 0.0,
                            end: 0.5,
                            word: "yes",
                        }],
                        text: "yes",
                    },
                    Alternative {
                        confidence: 150.0,
                        result: Vec::new(),
                        text: "yeah",
                    },
                ],
            },
        )));

        assert!(rendered.get("text").is_none());
        assert!(rendered.get("result").is_none());
        let alternatives = rendered["alternatives"].as_array().unwrap();
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0]["text"], "yes");
        assert_eq!(alternatives[0]["confidence"], 200.5);
        assert_eq!(alternatives[0]["result"][0]["word"], "yes");
        assert_eq!(alternatives[1]["result"], json!([]));
    }

    #[cfg(feature = "gpu")]
    #[test]
    fn test_gpu_entry_points_are_linked_in() {
        let device_init: fn() = vosk::gpu_init;
        let thread_init: fn() = vosk::gpu_thread_init;
        assert_ne!(device_init as usize, thread_init as usize);
    }

    #[test]
    fn test_partial_rendering() {
        let plain = parse(partial_to_json(PartialResult {
            partial: "twenty",
            partial_result: Vec::new(),
        }));
        assert_eq!(plain, json!({"partial": "twenty"}));

        let with_words = parse(partial_to_json(PartialResult {
            partial: "twenty three",
            partial_result: words(),
        }));
        assert_eq!(with_words["partial"], "twenty three");
        assert_eq!(with_words["partial_result"][1]["word"], "three");
    }
}
