//! Authentication middleware for the admin routes
//!
//! Admin requests carry `Authorization: Bearer <token>` matching the
//! configured `admin_token`. With no token configured, authentication is
//! disabled and every request passes through.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Authentication middleware
///
/// Applied to `/admin/*` only. Public routes and `/health` do not use it.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?
        .strip_prefix("Bearer ")
        .ok_or(AuthError::Malformed)?;

    if !constant_time_eq(provided.trim().as_bytes(), expected.as_bytes()) {
        warn!(path = %request.uri().path(), "Rejected admin request with invalid token");
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authentication error types for HTTP responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    Malformed,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing bearer token",
            AuthError::Malformed => "Malformed Authorization header",
            AuthError::InvalidToken => "Invalid token",
        };

        let body = Json(json!({
            "error": message,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}
