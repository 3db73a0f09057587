//! Bearer-token guard for the management API.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use ring::digest::{digest, SHA256};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::AppState;

pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.auth_required() {
        return Ok(next.run(request).await);
    }

    let supplied = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    match supplied {
        Some(token) if token_allowed(token, &state.config.api_tokens) => {
            Ok(next.run(request).await)
        }
        Some(_) => Err(ApiError::unauthorized("Invalid bearer token")),
        None => Err(ApiError::unauthorized("Missing bearer token")),
    }
}

/// Extract the credential from an `Authorization: Bearer <token>` value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Compare digests so the comparison does not short-circuit on the secret itself.
fn token_allowed(supplied: &str, configured: &[String]) -> bool {
    let supplied = digest(&SHA256, supplied.as_bytes());
    configured
        .iter()
        .any(|t| digest(&SHA256, t.as_bytes()).as_ref() == supplied.as_ref())
}
