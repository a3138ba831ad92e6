//! API routes

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::core::Outcome;
use crate::dialog::normalize::CanonicalResponse;
use crate::session::{SessionKey, SESSION_HEADER};
use crate::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub input_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: CanonicalResponse,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<MessageRequest>,
) -> Response {
    let session = SessionKey::from_headers(&headers);
    let cancel = CancellationToken::new();

    let response = match state
        .engine
        .send(&session, &request.input_text, &cancel)
        .await
    {
        Ok(Outcome::Replied(message)) => Json(MessageResponse { message }).into_response(),
        // Blank input is a local no-op, not an error.
        Ok(Outcome::Ignored) => Json(MessageResponse {
            message: CanonicalResponse::default(),
        })
        .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    };

    with_session(response, &session)
}

async fn reset(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = SessionKey::from_headers(&headers);
    let cancel = CancellationToken::new();

    let response = match state.engine.reset(&session, &cancel).await {
        Ok(()) => Json(ResetResponse {
            success: true,
            message: "Conversation reset".to_string(),
        })
        .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ResetResponse {
                success: false,
                message: err.to_string(),
            }),
        )
            .into_response(),
    };

    with_session(response, &session)
}

/// Hand the session token back so the client can replay it. The key either
/// came from a header or is a fresh uuid, so it is always a valid value.
fn with_session(mut response: Response, session: &SessionKey) -> Response {
    if let Ok(value) = HeaderValue::from_str(session.as_str()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/message", post(message))
        .route("/reset-conversation", post(reset))
}
