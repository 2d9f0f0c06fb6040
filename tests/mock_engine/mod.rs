//! Scripted speech engine and server helpers for integration tests.
//!
//! Audio frames are UTF-8 text. A frame ending in `\n` completes the current
//! utterance. Frames containing `boom` fail decoding and frames containing
//! `panic` panic inside the recognizer. Model paths starting with `missing`
//! fail to load.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use asr_gateway::{
    AppState, NumberExtractor, Recognizer, RecognizerError, RecognizerResult, ServerConfig,
    SpeechEngine, init, routes,
};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct MockModel {
    pub name: String,
}

/// How a recognizer was constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedRecognizer {
    pub model: String,
    pub sample_rate: f32,
    pub phrase_list: Option<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct EngineStats {
    pub models_loaded: Arc<AtomicUsize>,
    pub speaker_models_loaded: Arc<AtomicUsize>,
    pub created: Arc<Mutex<Vec<CreatedRecognizer>>>,
}

impl EngineStats {
    pub fn models_loaded(&self) -> usize {
        self.models_loaded.load(Ordering::SeqCst)
    }

    pub fn recognizers_created(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last_created(&self) -> Option<CreatedRecognizer> {
        self.created.lock().last().cloned()
    }
}

#[derive(Default)]
pub struct MockEngine {
    pub stats: EngineStats,
}

impl MockEngine {
    pub fn new() -> (Self, EngineStats) {
        let engine = Self::default();
        let stats = engine.stats.clone();
        (engine, stats)
    }
}

impl SpeechEngine for MockEngine {
    type Model = MockModel;
    type SpeakerModel = ();
    type Recognizer = MockRecognizer;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn load_model(&self, path: &str) -> RecognizerResult<MockModel> {
        if path.starts_with("missing") {
            return Err(RecognizerError::ModelLoad {
                path: path.to_string(),
                reason: "no such model".to_string(),
            });
        }
        self.stats.models_loaded.fetch_add(1, Ordering::SeqCst);
        Ok(MockModel {
            name: path.to_string(),
        })
    }

    fn load_speaker_model(&self, _path: &str) -> RecognizerResult<()> {
        self.stats.speaker_models_loaded.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create_recognizer(
        &self,
        model: &MockModel,
        sample_rate: f32,
        phrase_list: Option<&[String]>,
    ) -> RecognizerResult<MockRecognizer> {
        self.stats.created.lock().push(CreatedRecognizer {
            model: model.name.clone(),
            sample_rate,
            phrase_list: phrase_list.map(<[String]>::to_vec),
        });
        Ok(MockRecognizer {
            model: model.name.clone(),
            buffer: String::new(),
            words: false,
            max_alternatives: 0,
            speaker: false,
        })
    }
}

pub struct MockRecognizer {
    model: String,
    buffer: String,
    words: bool,
    max_alternatives: u16,
    speaker: bool,
}

impl MockRecognizer {
    fn take_utterance(&mut self) -> String {
        let text = self.buffer.split_whitespace().collect::<Vec<_>>().join(" ");
        self.buffer.clear();
        text
    }

    fn render(&self, text: String) -> String {
        if self.max_alternatives > 0 {
            return json!({
                "alternatives": [{"confidence": 1.0, "text": text}]
            })
            .to_string();
        }

        let mut out = json!({ "text": text, "model": self.model });
        if self.words {
            let words: Vec<Value> = text
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| {
                    json!({
                        "conf": 1.0,
                        "start": i as f64 * 0.5,
                        "end": i as f64 * 0.5 + 0.4,
                        "word": word,
                    })
                })
                .collect();
            out["result"] = Value::Array(words);
        }
        if self.speaker {
            out["spk"] = json!([0.5, -0.5]);
        }
        out.to_string()
    }
}

impl Recognizer for MockRecognizer {
    type SpeakerModel = ();

    fn accept_waveform(&mut self, audio: &[u8]) -> RecognizerResult<bool> {
        let chunk = String::from_utf8_lossy(audio);
        if chunk.contains("boom") {
            return Err(RecognizerError::DecodingFailed("boom".to_string()));
        }
        if chunk.contains("panic") {
            panic!("decoder crashed");
        }
        self.buffer.push_str(&chunk);
        Ok(self.buffer.ends_with('\n'))
    }

    fn result(&mut self) -> String {
        let text = self.take_utterance();
        self.render(text)
    }

    fn partial_result(&mut self) -> String {
        let partial = self.buffer.split_whitespace().collect::<Vec<_>>().join(" ");
        json!({ "partial": partial }).to_string()
    }

    fn final_result(&mut self) -> String {
        let text = self.take_utterance();
        self.render(text)
    }

    fn set_words(&mut self, enabled: bool) {
        self.words = enabled;
    }

    fn set_max_alternatives(&mut self, max_alternatives: u16) {
        self.max_alternatives = max_alternatives;
    }

    fn set_speaker_model(&mut self, _model: &()) {
        self.speaker = true;
    }
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        model_path: "default-model".to_string(),
        spk_model_path: None,
        sample_rate: 8000.0,
        max_alternatives: 0,
        show_words: true,
        worker_threads: 4,
    }
}

pub async fn build_state(config: ServerConfig, engine: MockEngine) -> Arc<AppState<MockEngine>> {
    init::bootstrap(config, engine, Arc::new(NumberExtractor::new()))
        .await
        .expect("bootstrap should succeed")
}

/// Start a server on an ephemeral port.
pub async fn start_test_server(config: ServerConfig) -> (SocketAddr, EngineStats) {
    let (engine, stats) = MockEngine::new();
    let state = build_state(config, engine).await;
    let app = routes::create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to get address");

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    (addr, stats)
}

pub async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = timeout(RECV_TIMEOUT, connect_async(format!("ws://{addr}/")))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    ws
}

pub async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("send text");
}

pub async fn send_audio(ws: &mut Client, audio: &str) {
    ws.send(Message::Binary(audio.as_bytes().to_vec().into()))
        .await
        .expect("send audio");
}

/// Next JSON text frame, skipping pings.
pub async fn recv_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for response")
            .expect("connection ended")
            .expect("websocket error");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("response is JSON");
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Wait for the server to close the connection; returns the close code if one was sent.
pub async fn expect_close(ws: &mut Client) -> Option<u16> {
    loop {
        let next = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for close");
        match next {
            Some(Ok(Message::Close(frame))) => return frame.map(|f| u16::from(f.code)),
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(other)) => panic!("expected close, got {other:?}"),
            Some(Err(_)) | None => return None,
        }
    }
}
