//! HTTP API: stateless extraction plus read-only session views.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::catalog::StepKey;
use crate::extractor::FieldExtractor;
use crate::interview::InterviewSession;

#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<InterviewSession>,
    pub extractor: Arc<FieldExtractor>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/extract", post(extract))
        .route("/api/interview/status", get(interview_status))
        .route("/api/interview/profile", get(interview_profile))
        .route("/health", get(health))
        .with_state(state)
}

// ── POST /api/extract ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    message: Option<String>,
    step: Option<String>,
    /// The question as the client phrased it; catalog text when absent.
    question: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExtractResponse {
    update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Run the extraction oracle for one utterance against one step, without
/// touching session state. Degrades to `update: false` on any oracle
/// trouble; only a malformed request is an error.
async fn extract(
    State(state): State<ApiState>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    let (Some(message), Some(step)) = (req.message, req.step) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "message and step are required" })),
        );
    };

    let Some(key) = StepKey::from_token(&step) else {
        debug!(step = %step, "extraction requested for unknown step");
        return (
            StatusCode::OK,
            Json(json!(ExtractResponse {
                update: false,
                field: None,
                value: None,
            })),
        );
    };
    let Some(question) = state.session.catalog().question_for(key) else {
        return (
            StatusCode::OK,
            Json(json!(ExtractResponse {
                update: false,
                field: None,
                value: None,
            })),
        );
    };

    let asked = req.question.as_deref().unwrap_or(question.question);
    let result = state
        .extractor
        .extract_with_context(&message, question, asked)
        .await;
    (
        StatusCode::OK,
        Json(json!(ExtractResponse {
            update: result.update_needed,
            field: result.field.map(|f| f.token().to_string()),
            value: result.value,
        })),
    )
}

// ── Session Views ───────────────────────────────────────────────────────

async fn interview_status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.session.status().await)
}

async fn interview_profile(State(state): State<ApiState>) -> impl IntoResponse {
    let status = state.session.status().await;
    Json(json!({
        "profile": status.profile,
        "progress": status.progress,
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "voice-intake" }))
}
