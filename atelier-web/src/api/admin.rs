//! Admin endpoints
//!
//! Thin relays onto [`AdminProxy`]. Each entity route is registered with an
//! `Extension<EntityKind>` naming the CMS post type it serves.

use axum::{
    body::{Body, Bytes},
    extract::{Multipart, State},
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::cms::proxy::{record_id, ProxyError, UpstreamResponse};
use crate::cms::EntityKind;
use crate::AppState;

/// Upper bound for one media upload
pub const MEDIA_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Admin API errors
///
/// Only raised when there is no CMS response to relay.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error("Multipart field 'file' is missing")]
    MissingFile,

    #[error("Invalid multipart body: {0}")]
    Multipart(String),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::Proxy(ProxyError::Unreachable(_)) => StatusCode::BAD_GATEWAY,
            AdminError::Proxy(ProxyError::InvalidBody(_) | ProxyError::MissingId) => {
                StatusCode::BAD_REQUEST
            }
            AdminError::MissingFile | AdminError::Multipart(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        if let Some(value) = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}

/// GET /admin/api/{entity}
pub async fn list(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
) -> Result<UpstreamResponse, AdminError> {
    Ok(state.proxy.list(kind).await?)
}

/// POST /admin/api/{entity}
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    body: Bytes,
) -> Result<UpstreamResponse, AdminError> {
    let response = state.proxy.create(kind, body).await?;
    after_write(&state, kind, "create", &response);
    Ok(response)
}

/// PUT /admin/api/{entity}; the body's `id` names the record
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    body: Bytes,
) -> Result<UpstreamResponse, AdminError> {
    let response = state.proxy.update(kind, body).await?;
    after_write(&state, kind, "update", &response);
    Ok(response)
}

/// DELETE /admin/api/{entity}; the body's `id` names the record
pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<EntityKind>,
    body: Bytes,
) -> Result<UpstreamResponse, AdminError> {
    let id = record_id(&body);
    let response = state.proxy.delete(kind, body).await?;
    after_write(&state, kind, "delete", &response);
    if let Some(id) = id.filter(|_| response.is_success()) {
        state.views.remove(kind, id);
    }
    Ok(response)
}

/// POST /admin/api/media (multipart, field `file`)
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<UpstreamResponse, AdminError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AdminError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AdminError::Multipart(e.to_string()))?;

        let response = state.proxy.upload_media(&filename, &content_type, data).await?;
        info!(filename = %filename, status = response.status, "Media upload relayed");
        return Ok(response);
    }

    warn!("Media upload without a 'file' field");
    Err(AdminError::MissingFile)
}

/// Log the outcome and drop stale cached collections
fn after_write(state: &AppState, kind: EntityKind, action: &str, response: &UpstreamResponse) {
    if response.is_success() {
        info!(kind = kind.cms_path(), action, status = response.status, "Admin write succeeded");
        state.content.invalidate(kind);
    } else {
        warn!(
            kind = kind.cms_path(),
            action,
            status = response.status,
            "Admin write rejected by CMS"
        );
    }
}
