//! Recognition WebSocket handler
//!
//! One task per connection runs the protocol loop. Frames are handled strictly
//! in arrival order: the loop does not read the next frame until the response
//! to the current one has been sent. Recognition itself runs on the shared
//! worker pool so a slow decoder never stalls the runtime.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{
    CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code,
};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::{SessionConfigUpdate, SessionState, SpeechEngine, should_rebuild_recognizer};
use crate::errors::{SessionError, SessionResult};
use crate::state::AppState;

use super::messages::{Chunk, IncomingMessage};
use super::processor::recognize_chunk;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

type WsSender = SplitSink<WebSocket, Message>;
type WsReceiver = SplitStream<WebSocket>;

/// Recognition WebSocket handler
///
/// Upgrades the HTTP connection and hands the socket to the per-connection
/// protocol loop.
pub async fn ws_voice_handler<E: SpeechEngine>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<E>>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
) -> Response {
    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_voice_socket(socket, state, peer))
}

async fn handle_voice_socket<E: SpeechEngine>(
    socket: WebSocket,
    state: Arc<AppState<E>>,
    peer: SocketAddr,
) {
    let conn_id = Uuid::new_v4();
    info!(%conn_id, %peer, "Connection opened");

    let (mut sender, mut receiver) = socket.split();

    match run_session(&mut sender, &mut receiver, &state, conn_id).await {
        Ok(()) => {
            info!(%conn_id, "Connection closed");
        }
        Err(e) if e.is_transport() => {
            debug!(%conn_id, error = %e, "Connection dropped");
        }
        Err(e) => {
            let code = if e.is_protocol() {
                warn!(%conn_id, error = %e, "Closing connection on protocol error");
                close_code::PROTOCOL
            } else {
                error!(%conn_id, error = %e, "Closing connection on recognition error");
                close_code::ERROR
            };
            let frame = CloseFrame {
                code,
                reason: Utf8Bytes::from_static(close_reason(&e)),
            };
            if let Err(send_err) = sender.send(Message::Close(Some(frame))).await {
                debug!(%conn_id, error = %send_err, "Failed to send close frame");
            }
        }
    }
}

/// Drive one connection until `eof`, a client close or a fatal error.
async fn run_session<E: SpeechEngine>(
    sender: &mut WsSender,
    receiver: &mut WsReceiver,
    state: &Arc<AppState<E>>,
    conn_id: Uuid,
) -> SessionResult<()> {
    let mut session = SessionState::new(&state.session_defaults);

    while let Some(msg) = receiver.next().await {
        let msg = msg.map_err(|e| SessionError::Transport(e.to_string()))?;

        let incoming = match msg {
            Message::Text(text) => IncomingMessage::from_text(text.as_str())?,
            Message::Binary(data) => {
                debug!(%conn_id, bytes = data.len(), "Audio frame");
                IncomingMessage::from_binary(data)
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(frame) => {
                debug!(%conn_id, ?frame, "Client closed connection");
                return Ok(());
            }
        };

        let chunk = match incoming {
            IncomingMessage::Config(update) => {
                apply_config_message(&mut session, update, state, conn_id).await?;
                continue;
            }
            IncomingMessage::Chunk(chunk) => chunk,
        };

        let (response, stop) = recognize(&mut session, chunk, state).await?;

        sender
            .send(Message::Text(response.into()))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        if stop {
            if let Err(e) = sender.send(Message::Close(None)).await {
                debug!(%conn_id, error = %e, "Failed to send close frame after eof");
            }
            return Ok(());
        }
    }

    debug!(%conn_id, "Client went away without eof");
    Ok(())
}

async fn apply_config_message<E: SpeechEngine>(
    session: &mut SessionState<E>,
    update: SessionConfigUpdate,
    state: &Arc<AppState<E>>,
    conn_id: Uuid,
) -> SessionResult<()> {
    info!(%conn_id, config = ?update, "Config");

    let model = match &update.model {
        Some(id) => Some(state.models.resolve(&state.engine, id).await?),
        None => None,
    };
    session.apply_config(update, model);
    Ok(())
}

/// Run one chunk through the session's recognizer on the worker pool.
///
/// The recognizer leaves the session for the duration of the job and is put
/// back afterwards, so it is only ever touched by one thread at a time.
async fn recognize<E: SpeechEngine>(
    session: &mut SessionState<E>,
    chunk: Chunk,
    state: &Arc<AppState<E>>,
) -> SessionResult<(String, bool)> {
    let rebuild = if should_rebuild_recognizer(session) {
        session.model_changed = false;
        Some(session.recognizer_params(state.speaker_model.clone()))
    } else {
        None
    };
    let recognizer = session.recognizer.take();

    let job_state = Arc::clone(state);
    let (recognizer, outcome) = state
        .pool
        .run(move || {
            recognize_chunk(
                job_state.engine.as_ref(),
                job_state.normalizer.as_ref(),
                recognizer,
                rebuild,
                chunk,
            )
        })
        .await?;

    session.recognizer = recognizer;
    outcome
}

/// Short close reason; the full error goes to the log.
fn close_reason(err: &SessionError) -> &'static str {
    match err {
        SessionError::Protocol(_) => "unsupported message",
        SessionError::InvalidConfig(_) => "invalid config",
        SessionError::Recognition(_) => "recognition failed",
        SessionError::PostProcess(_) => "malformed result",
        SessionError::Offload(_) => "worker failure",
        SessionError::Transport(_) => "transport failure",
    }
}
