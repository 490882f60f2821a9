//! Bearer API-key gate for protected v1 routes.
//!
//! With `PAGEWISE_API_KEYS` unset the server still starts, but every
//! protected route answers 401.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;

use super::response::{ApiResponse, ErrorCode};

fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("Missing authorization header")?
        .to_str()
        .map_err(|_| "Authorization header is not valid ASCII")?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or("Invalid authorization header format. Expected: Bearer <token>")
}

fn reject(message: &str) -> Response {
    ApiResponse::<()>::error(ErrorCode::Unauthorized, message).into_response()
}

pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let keys = &state.config.server.api_keys;
    if keys.is_empty() {
        return reject("API keys not configured. Set PAGEWISE_API_KEYS to enable access.");
    }

    let known = bearer_token(request.headers()).map(|token| keys.iter().any(|key| key == token));

    match known {
        Ok(true) => next.run(request).await,
        Ok(false) => {
            tracing::debug!(path = %request.uri().path(), "Rejected unknown API key");
            reject("Invalid API key")
        }
        Err(message) => reject(message),
    }
}
