// Chat relay handler
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::proxy::error::RelayError;
use crate::proxy::mappers::chat::ChatRequest;
use crate::proxy::server::AppState;

/// Single entry point for every path: preflight, method gate, validation,
/// then one upstream call.
pub async fn handle_chat(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    match relay_chat(&state, &method, body).await {
        Ok(data) => ([(header::CONTENT_TYPE, "application/json")], data).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn relay_chat(
    state: &AppState,
    method: &Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Bytes, RelayError> {
    // Method is checked before the body, so a rejected body never masks a 405
    if method != Method::POST {
        return Err(RelayError::MethodNotAllowed);
    }

    let body = body.map_err(|rejection| RelayError::Body {
        status: rejection.status(),
        message: rejection.body_text(),
    })?;

    let chat_req = ChatRequest::from_slice(&body)?;
    debug!(
        "Received chat request: {} messages, model {:?}",
        chat_req.messages.len(),
        chat_req.model
    );

    let upstream_req = chat_req.into_upstream(state.upstream.config());
    state.upstream.chat_completions(&upstream_req).await
}
