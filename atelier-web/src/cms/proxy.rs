//! Admin proxy
//!
//! Relays create/update/delete calls from the admin surface to the CMS,
//! adding the site's CMS credentials. Upstream status, content type and
//! body are passed back unchanged; request bodies are not validated beyond
//! being JSON.
//!
//! After a successful create or update of a work or exhibition the record
//! is re-read with embedded media, so the caller sees the same shape the
//! public read path produces. The re-read only replaces the body when every
//! step succeeded; otherwise the write's own response is relayed.

use atelier_common::config::CmsCredentials;
use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{basic_auth_header, CmsEndpoint, EntityKind};

/// Errors raised before or instead of an upstream response
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No response from the CMS at all (DNS, refused connection, reset)
    #[error("CMS unreachable: {0}")]
    Unreachable(String),

    #[error("Request body is not valid JSON: {0}")]
    InvalidBody(String),

    #[error("Request body has no usable id")]
    MissingId,
}

/// A CMS response captured for relaying
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    async fn capture(response: reqwest::Response) -> Result<Self, ProxyError> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Unreachable(e.to_string()))?;
        Ok(Self { status, content_type, body })
    }
}

pub struct AdminProxy {
    http: reqwest::Client,
    endpoint: CmsEndpoint,
    auth_header: Option<String>,
}

impl AdminProxy {
    pub fn new(
        http: reqwest::Client,
        endpoint: CmsEndpoint,
        credentials: Option<&CmsCredentials>,
    ) -> Self {
        if credentials.is_none() {
            warn!("No CMS credentials configured; admin writes will be sent unauthenticated");
        }
        Self {
            http,
            endpoint,
            auth_header: credentials.map(basic_auth_header),
        }
    }

    pub async fn list(&self, kind: EntityKind) -> Result<UpstreamResponse, ProxyError> {
        let url = self.endpoint.list_url(kind);
        self.send(kind, self.http.get(url)).await
    }

    pub async fn create(
        &self,
        kind: EntityKind,
        body: Bytes,
    ) -> Result<UpstreamResponse, ProxyError> {
        parse_json(&body)?;
        let request = self
            .http
            .post(self.endpoint.create_url(kind))
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        let response = self.send(kind, request).await?;
        Ok(self.reread(kind, response).await)
    }

    /// Update the record named by the body's `id`
    pub async fn update(
        &self,
        kind: EntityKind,
        body: Bytes,
    ) -> Result<UpstreamResponse, ProxyError> {
        let id = body_id(&parse_json(&body)?)?;
        let request = self
            .http
            .post(self.endpoint.item_url(kind, id))
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        let response = self.send(kind, request).await?;
        Ok(self.reread(kind, response).await)
    }

    /// Permanently delete the record named by the body's `id`
    pub async fn delete(
        &self,
        kind: EntityKind,
        body: Bytes,
    ) -> Result<UpstreamResponse, ProxyError> {
        let id = body_id(&parse_json(&body)?)?;
        let request = self.http.delete(self.endpoint.delete_url(kind, id));
        self.send(kind, request).await
    }

    /// Forward one uploaded file to the CMS media library
    pub async fn upload_media(
        &self,
        filename: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<UpstreamResponse, ProxyError> {
        let disposition = format!("attachment; filename=\"{}\"", sanitize_filename(filename));
        debug!(filename = %filename, bytes = data.len(), "Uploading media");

        let request = self
            .http
            .post(self.endpoint.media_url())
            .header(CONTENT_DISPOSITION, disposition)
            .header(CONTENT_TYPE, content_type)
            .body(data);

        let response = self.authorized(request).send().await.map_err(|e| {
            warn!(error = %e, "Media upload failed");
            ProxyError::Unreachable(e.to_string())
        })?;
        UpstreamResponse::capture(response).await
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_header {
            Some(value) => request.header(AUTHORIZATION, value.as_str()),
            None => request,
        }
    }

    async fn send(
        &self,
        kind: EntityKind,
        request: RequestBuilder,
    ) -> Result<UpstreamResponse, ProxyError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            warn!(kind = kind.cms_path(), error = %e, "CMS request failed");
            ProxyError::Unreachable(e.to_string())
        })?;

        let captured = UpstreamResponse::capture(response).await?;
        info!(kind = kind.cms_path(), status = captured.status, "CMS responded");
        Ok(captured)
    }

    /// Replace a write's body with the embedded re-read, when possible
    async fn reread(&self, kind: EntityKind, write: UpstreamResponse) -> UpstreamResponse {
        if !kind.embeds_media() || !write.is_success() {
            return write;
        }

        let Some(id) = serde_json::from_slice::<Value>(&write.body)
            .ok()
            .and_then(|value| body_id(&value).ok())
        else {
            debug!(kind = kind.cms_path(), "Write response has no id; skipping re-read");
            return write;
        };

        let request = self.http.get(self.endpoint.embedded_item_url(kind, id));
        match self.send(kind, request).await {
            Ok(read) if read.is_success() => UpstreamResponse {
                status: write.status,
                content_type: read.content_type,
                body: read.body,
            },
            Ok(read) => {
                warn!(
                    kind = kind.cms_path(),
                    id,
                    status = read.status,
                    "Re-read after write failed"
                );
                write
            }
            Err(_) => write,
        }
    }
}

/// The record id named by an admin request body, if it has a usable one
pub fn record_id(body: &[u8]) -> Option<u64> {
    parse_json(body).ok().and_then(|value| body_id(&value).ok())
}

fn parse_json(body: &[u8]) -> Result<Value, ProxyError> {
    serde_json::from_slice(body).map_err(|e| ProxyError::InvalidBody(e.to_string()))
}

/// The CMS record id carried in a JSON body: a number or numeric string
fn body_id(value: &Value) -> Result<u64, ProxyError> {
    match value.get("id") {
        Some(Value::Number(n)) => n.as_u64().ok_or(ProxyError::MissingId),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| ProxyError::MissingId),
        _ => Err(ProxyError::MissingId),
    }
}

/// Strip characters that would break the quoted header parameter
fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = name
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    if cleaned.trim().is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_id_shapes() {
        assert_eq!(body_id(&json!({ "id": 12 })).unwrap(), 12);
        assert_eq!(body_id(&json!({ "id": " 40 " })).unwrap(), 40);
        assert!(matches!(body_id(&json!({ "id": -1 })), Err(ProxyError::MissingId)));
        assert!(matches!(body_id(&json!({ "title": "x" })), Err(ProxyError::MissingId)));
        assert!(matches!(body_id(&json!([1, 2])), Err(ProxyError::MissingId)));
    }

    #[test]
    fn test_record_id_from_request_body() {
        assert_eq!(record_id(b"{\"id\": \"7\", \"title\": \"x\"}"), Some(7));
        assert_eq!(record_id(b"{\"title\": \"x\"}"), None);
        assert_eq!(record_id(b"id=7"), None);
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(parse_json(b"not json"), Err(ProxyError::InvalidBody(_))));
        assert!(parse_json(b"{\"title\":\"ok\"}").is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("bild.jpg"), "bild.jpg");
        assert_eq!(sanitize_filename("C:\\tmp\\\"x\".png"), "x.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("\"\""), "upload");
    }

    #[test]
    fn test_upstream_success_range() {
        let response = |status| UpstreamResponse { status, content_type: None, body: Bytes::new() };
        assert!(response(200).is_success());
        assert!(response(201).is_success());
        assert!(!response(404).is_success());
        assert!(!response(500).is_success());
    }
}
