//! HTTP and WebSocket surface.

pub mod routes;
pub mod voice;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::extractor::FieldExtractor;
use crate::interview::InterviewSession;

pub use routes::ApiState;

/// Assemble the full application router: REST API plus the voice channel.
pub fn app(session: Arc<InterviewSession>, extractor: Arc<FieldExtractor>) -> Router {
    let api = routes::router(ApiState {
        session: Arc::clone(&session),
        extractor,
    });
    api.merge(voice::router(session)).layer(CorsLayer::permissive())
}
