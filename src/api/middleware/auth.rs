use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::api::state::AppState;

/// Rejects requests that carry neither a matching `X-API-Key` header nor an
/// `api_key` cookie. With no key configured the check is disabled.
pub async fn api_key_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.config.config.api_key.as_str();
    if expected.is_empty() {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    let authorized = match header_key {
        Some(key) => key == expected,
        None => cookie_key(&request)
            .map(|key| key == expected)
            .unwrap_or(false),
    };

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid API key" })),
        )
            .into_response();
    }

    next.run(request).await
}

fn cookie_key(request: &Request) -> Option<&str> {
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "api_key").then_some(value)
    })
}
