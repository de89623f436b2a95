//! Voice channel — WebSocket boundary for the transcribed interview.
//!
//! The client owns audio capture and transcription; this side only sees
//! text. Utterances are processed one at a time, in arrival order, so the
//! socket loop awaits each extraction before reading the next frame.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ChannelError;
use crate::interview::{InterviewSession, ProgressReport, UtteranceOutcome};

// ── JSON Protocol ───────────────────────────────────────────────────────

/// Message from voice client → server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    /// The agent has greeted the user and the interview should begin.
    #[serde(rename = "start")]
    Start,
    /// A transcribed conversation turn.
    #[serde(rename = "transcript")]
    Transcript { source: String, message: String },
    /// Playback volume changed on the client; acknowledged, not acted on.
    #[serde(rename = "set_volume")]
    SetVolume { volume: f32 },
    /// The user hung up.
    #[serde(rename = "end")]
    End,
}

/// Message from server → voice client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ServerMessage {
    #[serde(rename = "connected")]
    Connected { session_id: Uuid },
    #[serde(rename = "interview_started")]
    InterviewStarted {
        step: String,
        question: Option<&'static str>,
    },
    /// An answer was committed; `step`/`question` describe what to ask next.
    #[serde(rename = "profile_updated")]
    ProfileUpdated {
        field: String,
        value: String,
        step: String,
        question: Option<&'static str>,
        progress: ProgressReport,
    },
    /// The utterance did not answer the current question; re-ask it.
    #[serde(rename = "no_update")]
    NoUpdate {
        step: String,
        question: Option<&'static str>,
    },
    #[serde(rename = "status")]
    Status { message: String },
    #[serde(rename = "error")]
    Error { message: String },
}

// ── Router ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct VoiceState {
    session: Arc<InterviewSession>,
}

/// Build the `/ws/voice` router. Merge with the main app router.
pub fn router(session: Arc<InterviewSession>) -> Router {
    Router::new()
        .route("/ws/voice", get(ws_voice_handler))
        .with_state(VoiceState { session })
}

async fn ws_voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<VoiceState>,
) -> impl IntoResponse {
    info!("voice client connecting");
    ws.on_upgrade(|socket| handle_voice_socket(socket, state.session))
}

// ── Socket Loop ─────────────────────────────────────────────────────────

async fn handle_voice_socket(mut socket: WebSocket, session: Arc<InterviewSession>) {
    // A new connection is a fresh interview: welcome stage, empty profile.
    let session_id = session.connect().await;
    if send(&mut socket, &ServerMessage::Connected { session_id })
        .await
        .is_err()
    {
        return;
    }

    loop {
        match socket.recv().await {
            Some(Ok(Message::Text(text))) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        let err = ChannelError::InvalidMessage(e.to_string());
                        debug!(error = %err, text = %text, "rejected voice client frame");
                        let reply = ServerMessage::Error {
                            message: err.to_string(),
                        };
                        if send(&mut socket, &reply).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };
                if let Err(e) = handle_client_message(&mut socket, &session, client_msg).await {
                    debug!(error = %e, "voice client dropped mid-reply");
                    break;
                }
            }
            Some(Ok(Message::Ping(data))) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Some(Ok(Message::Close(_))) | None => {
                info!("voice client disconnected");
                break;
            }
            Some(Err(e)) => {
                let err = ChannelError::Disconnected {
                    name: "voice".to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %err, "voice WebSocket error");
                break;
            }
            _ => {}
        }
    }

    session.end().await;
    info!("voice session closed");
}

async fn handle_client_message(
    socket: &mut WebSocket,
    session: &InterviewSession,
    msg: ClientMessage,
) -> Result<(), ChannelError> {
    match msg {
        ClientMessage::Start => {
            let stage = session.begin_interview().await;
            let question = session.current_question().await;
            send(
                socket,
                &ServerMessage::InterviewStarted {
                    step: stage.token().to_string(),
                    question: question.map(|q| q.question),
                },
            )
            .await
        }
        ClientMessage::Transcript { source, message } => {
            if message.trim().is_empty() {
                return Ok(());
            }
            if source != "user" {
                session.record_agent_message(&message).await;
                return Ok(());
            }
            let outcome = session.handle_utterance(&message).await;
            match outcome {
                UtteranceOutcome::Advanced { field, value, stage } => {
                    let question = session.current_question().await;
                    let progress = session.status().await.progress;
                    send(
                        socket,
                        &ServerMessage::ProfileUpdated {
                            field: field.token().to_string(),
                            value,
                            step: stage.token().to_string(),
                            question: question.map(|q| q.question),
                            progress,
                        },
                    )
                    .await
                }
                UtteranceOutcome::Unchanged { stage } => {
                    let question = session.current_question().await;
                    send(
                        socket,
                        &ServerMessage::NoUpdate {
                            step: stage.token().to_string(),
                            question: question.map(|q| q.question),
                        },
                    )
                    .await
                }
                UtteranceOutcome::NotInterviewing { stage } => {
                    debug!(stage = %stage, "transcript outside a question step");
                    Ok(())
                }
                UtteranceOutcome::Discarded | UtteranceOutcome::Inactive => Ok(()),
            }
        }
        ClientMessage::SetVolume { volume } => {
            debug!(volume, "client volume changed");
            send(
                socket,
                &ServerMessage::Status {
                    message: format!("volume set to {volume:.2}"),
                },
            )
            .await
        }
        ClientMessage::End => {
            session.end().await;
            send(
                socket,
                &ServerMessage::Status {
                    message: "session ended".to_string(),
                },
            )
            .await
        }
    }
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ChannelError> {
    let json = serde_json::to_string(msg).unwrap_or_else(|_| "{}".to_string());
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| ChannelError::Disconnected {
            name: "voice".to_string(),
            reason: e.to_string(),
        })
}
