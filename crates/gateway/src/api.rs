//! `/api` routes.
//!
//! - `POST /api/generate`         - generate a hot take, JSON response
//! - `POST /api/generate/stream`  - generate a hot take, SSE stream of events
//! - `GET  /api/agents`           - known agents and whether they are configured
//! - `GET  /api/styles`           - recognised styles

use axum::{
    Router,
    extract::State,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use hottake_agent::{HotTakeRequest, HotTakeResult};
use hottake_core::error::GenerationError;
use hottake_core::style::Style;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::SharedState;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/generate/stream", post(generate_stream_handler))
        .route("/agents", get(agents_handler))
        .route("/styles", get(styles_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Everything a handler can answer with besides success.
#[derive(Debug)]
pub enum ApiError {
    Generation(GenerationError),
    Body(JsonRejection),
}

#[derive(Serialize)]
struct Detail<T> {
    detail: T,
}

#[derive(Serialize)]
struct FieldError {
    field: String,
    message: String,
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        Self::Generation(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(Detail {
                    detail: "Request body too large".to_string(),
                }),
            )
                .into_response(),
            Self::Body(rejection) => invalid("body", rejection.body_text()),
            Self::Generation(GenerationError::InvalidInput { field, message }) => {
                invalid(&field, message)
            }
            Self::Generation(e) => {
                let status = match &e {
                    GenerationError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                    GenerationError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let detail = e.public_message();
                (status, Json(Detail { detail })).into_response()
            }
        }
    }
}

fn invalid(field: &str, message: String) -> Response {
    let detail = vec![FieldError {
        field: field.to_string(),
        message,
    }];
    (StatusCode::UNPROCESSABLE_ENTITY, Json(Detail { detail })).into_response()
}

// ── Generation ────────────────────────────────────────────────────────────

async fn generate_handler(
    State(state): State<SharedState>,
    payload: Result<Json<HotTakeRequest>, JsonRejection>,
) -> Result<Json<HotTakeResult>, ApiError> {
    let Json(request) = payload.map_err(ApiError::Body)?;
    info!(
        web = request.use_web_search,
        news = request.use_news_search,
        "generate request"
    );

    let result = state.orchestrator.handle(&request).await?;
    Ok(Json(result))
}

/// Each `StreamEvent` becomes one SSE event named after its `type`. A
/// client disconnect drops the stream, which cancels the run.
async fn generate_stream_handler(
    State(state): State<SharedState>,
    payload: Result<Json<HotTakeRequest>, JsonRejection>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let Json(request) = payload.map_err(ApiError::Body)?;

    let session = state.orchestrator.handle_stream(&request).inspect_err(|e| {
        warn!(error = %e, "Rejected stream request");
    })?;
    info!(session = %session.id(), "SSE stream opened");

    let stream = session.into_stream().map(|event| {
        Ok(SseEvent::default()
            .event(event.event_type())
            .data(event.to_json()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ── Metadata ──────────────────────────────────────────────────────────────

async fn agents_handler(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({ "agents": state.orchestrator.agents().list() }))
}

async fn styles_handler() -> impl IntoResponse {
    Json(json!({ "styles": Style::names() }))
}
