//! Integration tests for the voice WebSocket channel + REST API.
//!
//! Each test spins up an Axum server on a random port, connects via
//! tokio-tungstenite, and exercises the real WS / REST contract.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use async_trait::async_trait;

use voice_intake::catalog::CATALOG;
use voice_intake::config::IntakeConfig;
use voice_intake::error::LlmError;
use voice_intake::extractor::FieldExtractor;
use voice_intake::interview::InterviewSession;
use voice_intake::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use voice_intake::server;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub oracle for integration tests (no real API calls).
///
/// It reads the field token and the utterance out of the prompt it is given
/// and answers the extraction contract: "mumble" anywhere in the utterance
/// means no update, the age field extracts "34", anything else extracts a
/// fixed value.
struct StubLlm;

fn between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let field = between(&prompt, "\"profileField\": \"", "\"").unwrap_or("");
        let utterance = between(&prompt, "User Message: \"", "\"").unwrap_or("");

        let content = if utterance.contains("mumble") {
            r#"{"updateNeeded": false}"#.to_string()
        } else {
            let value = if field == "age" { "34" } else { "stub answer" };
            format!(
                r#"{{"updateNeeded": true, "profileField": "{field}", "extractedValue": "{value}"}}"#
            )
        };

        Ok(CompletionResponse {
            content,
            input_tokens: 0,
            output_tokens: 0,
        })
    }
}

/// Start the server on a random port, return (port, session).
async fn start_server() -> (u16, Arc<InterviewSession>) {
    let config = IntakeConfig::default();
    let llm: Arc<dyn LlmProvider> = Arc::new(StubLlm);
    let extractor = Arc::new(FieldExtractor::new(Some(llm.clone()), &config));
    let session = Arc::new(InterviewSession::new(
        CATALOG,
        FieldExtractor::new(Some(llm), &config),
    ));

    let app = server::app(Arc::clone(&session), extractor);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, session)
}

/// Parse a WS text frame into a serde_json::Value.
fn parse_ws_json(msg: &Message) -> Value {
    match msg {
        Message::Text(txt) => serde_json::from_str(txt).expect("invalid JSON from server"),
        other => panic!("expected Text frame, got {:?}", other),
    }
}

fn text_frame(value: Value) -> Message {
    Message::Text(value.to_string().into())
}

// ── WebSocket Tests ──────────────────────────────────────────────────

#[tokio::test]
async fn ws_connect_receives_session_id() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let (mut ws, _resp) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .expect("WS connect failed");

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "connected");
        assert!(json["session_id"].is_string());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_start_moves_to_first_question() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // connected

        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "interview_started");
        assert_eq!(json["step"], "age");
        assert_eq!(json["question"], "First, how old are you?");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_clear_answer_commits_and_announces_next_question() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // connected

        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // interview_started

        ws.send(text_frame(json!({
            "type": "transcript",
            "source": "user",
            "message": "I am 34 years old"
        })))
        .await
        .unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "profile_updated");
        assert_eq!(json["field"], "age");
        assert_eq!(json["value"], "34");
        assert_eq!(json["step"], "lifeStage");
        assert_eq!(json["progress"]["answered"], 1);
        assert_eq!(json["progress"]["percentage"], 13);

        let status = session.status().await;
        assert_eq!(status.profile["age"], "34");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_unusable_answer_reasks_the_same_question() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(text_frame(json!({
            "type": "transcript",
            "source": "user",
            "message": "mumble mumble"
        })))
        .await
        .unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);

        assert_eq!(json["type"], "no_update");
        assert_eq!(json["step"], "age");
        assert_eq!(json["question"], "First, how old are you?");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_agent_transcript_is_recorded_without_a_reply() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        // Agent turn first, then a user answer. The first frame back must be
        // the answer's profile_updated, so the agent turn produced no reply.
        ws.send(text_frame(json!({
            "type": "transcript",
            "source": "agent",
            "message": "First, how old are you?"
        })))
        .await
        .unwrap();
        ws.send(text_frame(json!({
            "type": "transcript",
            "source": "user",
            "message": "34"
        })))
        .await
        .unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);
        assert_eq!(json["type"], "profile_updated");

        let transcript = session.transcript().await;
        assert_eq!(transcript.len(), 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_full_interview_reaches_summary() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        let mut last = Value::Null;
        for _ in 0..CATALOG.len() {
            ws.send(text_frame(json!({
                "type": "transcript",
                "source": "user",
                "message": "a clear answer"
            })))
            .await
            .unwrap();
            let msg = ws.next().await.unwrap().unwrap();
            last = parse_ws_json(&msg);
            assert_eq!(last["type"], "profile_updated");
        }

        assert_eq!(last["step"], "summary");
        assert_eq!(last["question"], Value::Null);
        assert_eq!(last["progress"]["percentage"], 100);

        let status = session.status().await;
        assert_eq!(status.progress.answered, CATALOG.len());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_set_volume_is_acknowledged() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(text_frame(json!({"type": "set_volume", "volume": 0.5})))
            .await
            .unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);
        assert_eq!(json["type"], "status");
        assert_eq!(json["message"], "volume set to 0.50");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_end_deactivates_the_session() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(text_frame(json!({"type": "end"}))).await.unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);
        assert_eq!(json["type"], "status");
        assert_eq!(json["message"], "session ended");

        assert!(!session.status().await.active);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_reconnect_resets_profile_and_stage() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(json!({"type": "start"}))).await.unwrap();
        let _ = ws.next().await.unwrap().unwrap();
        ws.send(text_frame(json!({
            "type": "transcript",
            "source": "user",
            "message": "I am 34"
        })))
        .await
        .unwrap();
        let _ = ws.next().await.unwrap().unwrap(); // profile_updated
        drop(ws);

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let msg = ws.next().await.unwrap().unwrap();
        assert_eq!(parse_ws_json(&msg)["type"], "connected");

        let status = session.status().await;
        assert_eq!(status.stage.token(), "welcome");
        assert!(status.profile.as_object().unwrap().is_empty());
        assert_eq!(status.progress.answered, 0);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn ws_invalid_json_yields_error_frame() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws/voice"))
            .await
            .unwrap();
        let _ = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text("not json at all".into())).await.unwrap();

        let msg = ws.next().await.unwrap().unwrap();
        let json = parse_ws_json(&msg);
        assert_eq!(json["type"], "error");
    })
    .await
    .expect("test timed out");
}

// ── REST Endpoint Tests ──────────────────────────────────────────────

#[tokio::test]
async fn rest_health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "voice-intake");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_extract_requires_message_and_step() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({"message": "I am 34"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({"step": "age"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_extract_unknown_step_is_no_update() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({"message": "I am 34", "step": "shoeSize"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["update"], false);
        assert!(body.get("field").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_extract_happy_path() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({"message": "I am 34 years old", "step": "age"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["update"], true);
        assert_eq!(body["field"], "age");
        assert_eq!(body["value"], "34");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_extract_accepts_caller_question_phrasing() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let client = reqwest::Client::new();
        let resp = client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({
                "message": "I am 34 years old",
                "step": "age",
                "question": "And how young are you, roughly?"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["update"], true);
        assert_eq!(body["field"], "age");
        assert_eq!(body["value"], "34");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_extract_does_not_touch_the_session() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        let client = reqwest::Client::new();
        client
            .post(format!("http://127.0.0.1:{port}/api/extract"))
            .json(&json!({"message": "I am 34 years old", "step": "age"}))
            .send()
            .await
            .unwrap();

        let status = session.status().await;
        assert_eq!(status.progress.answered, 0);
        assert!(status.profile.as_object().unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_status_reflects_a_fresh_session() {
    timeout(TEST_TIMEOUT, async {
        let (port, _session) = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/interview/status"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["active"], false);
        assert_eq!(body["stage"], "welcome");
        assert_eq!(body["progress"]["answered"], 0);
        assert_eq!(body["progress"]["percentage"], 0);
        assert_eq!(body["progress"]["total"], CATALOG.len());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rest_profile_tracks_committed_answers() {
    timeout(TEST_TIMEOUT, async {
        let (port, session) = start_server().await;

        session.connect().await;
        session.begin_interview().await;
        session.handle_utterance("I am 34 years old").await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/api/interview/profile"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["profile"]["age"], "34");
        assert_eq!(body["progress"]["answered"], 1);
    })
    .await
    .expect("test timed out");
}
