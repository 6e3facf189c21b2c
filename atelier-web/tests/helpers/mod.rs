//! Shared test helpers: an in-process fake CMS
//!
//! The fake serves canned responses keyed by `"METHOD /path"` (or
//! `"METHOD /path?slug=<slug>"` for slug lookups) and records every request
//! it receives. Unknown routes answer 404 like the real CMS.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use atelier_common::config::{CmsCredentials, SiteConfig};
use atelier_common::TitleCollation;
use atelier_web::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::Response,
    Router,
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub delay: Duration,
}

impl Canned {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json; charset=UTF-8",
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn raw(status: u16, content_type: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Default)]
struct FakeState {
    routes: Mutex<HashMap<String, Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Running fake CMS bound to an ephemeral port
#[derive(Clone)]
pub struct FakeCms {
    pub base_url: String,
    state: Arc<FakeState>,
}

impl FakeCms {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/wp-json/wp/v2", addr),
            state,
        }
    }

    /// Register a response for `"METHOD /path"`, path relative to the REST root
    pub fn on(&self, key: &str, canned: Canned) {
        self.state.routes.lock().unwrap().insert(key.to_string(), canned);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests to `path` (relative to the REST root), any method
    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests().last().cloned()
    }
}

async fn respond(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/wp-json/wp/v2")
        .unwrap_or(uri.path())
        .to_string();
    let query = uri.query().map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query: query.clone(),
        headers,
        body,
    });

    let slug = query
        .as_deref()
        .and_then(|q| q.split('&').find_map(|pair| pair.strip_prefix("slug=")));
    let canned = {
        let routes = state.routes.lock().unwrap();
        let by_slug = slug.and_then(|s| routes.get(&format!("{} {}?slug={}", method, path, s)));
        by_slug
            .or_else(|| routes.get(&format!("{} {}", method, path)))
            .cloned()
    };

    let canned = canned.unwrap_or_else(|| {
        Canned::json(404, serde_json::json!({ "code": "rest_no_route" }))
    });
    if !canned.delay.is_zero() {
        tokio::time::sleep(canned.delay).await;
    }

    Response::builder()
        .status(StatusCode::from_u16(canned.status).unwrap())
        .header(header::CONTENT_TYPE, canned.content_type)
        .body(Body::from(canned.body))
        .unwrap()
}

/// Site configuration pointing at `base_url`, auth disabled
pub fn test_config(base_url: &str) -> SiteConfig {
    SiteConfig {
        cms_base_url: base_url.to_string(),
        credentials: Some(CmsCredentials {
            username: "admin".to_string(),
            app_password: "abcd efgh".to_string(),
        }),
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        ready_timeout: Duration::from_millis(3000),
        cache_ttl: None,
        admin_token: None,
        per_page: 100,
        title_collation: TitleCollation::Folded,
    }
}

pub fn test_state(config: SiteConfig) -> AppState {
    AppState::from_config(reqwest::Client::new(), config)
}

/// Extract JSON body from an axum response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
