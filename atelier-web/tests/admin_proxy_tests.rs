//! Integration tests for the admin proxy against a fake CMS
//!
//! Tests cover:
//! - Basic auth header on every upstream call
//! - Verbatim status/content-type/body relay
//! - Follow-up embedded read after works/exhibitions writes
//! - Update/delete addressing by body id
//! - Media upload headers
//! - Unreachable CMS

mod helpers;

use atelier_common::config::CmsCredentials;
use atelier_web::cms::proxy::{AdminProxy, ProxyError};
use atelier_web::cms::{CmsEndpoint, EntityKind};
use axum::body::Bytes;
use axum::http::{header, Method};
use helpers::{Canned, FakeCms};
use serde_json::{json, Value};

fn proxy(fake: &FakeCms) -> AdminProxy {
    let credentials = CmsCredentials {
        username: "admin".to_string(),
        app_password: "secret".to_string(),
    };
    AdminProxy::new(
        reqwest::Client::new(),
        CmsEndpoint::new(&fake.base_url, 100),
        Some(&credentials),
    )
}

fn json_bytes(value: Value) -> Bytes {
    Bytes::from(value.to_string())
}

// =============================================================================
// Auth and relay
// =============================================================================

#[tokio::test]
async fn test_every_call_carries_basic_auth() {
    let fake = FakeCms::start().await;
    fake.on("GET /grant", Canned::json(200, json!([])));
    fake.on("POST /grant", Canned::json(201, json!({ "id": 5 })));
    fake.on("DELETE /grant/5", Canned::json(200, json!({ "deleted": true })));

    let proxy = proxy(&fake);
    proxy.list(EntityKind::Grant).await.unwrap();
    proxy.create(EntityKind::Grant, json_bytes(json!({ "title": "Stipendium" }))).await.unwrap();
    proxy.delete(EntityKind::Grant, json_bytes(json!({ "id": 5 }))).await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 3);
    for request in requests {
        // base64("admin:secret")
        assert_eq!(request.header(header::AUTHORIZATION), Some("Basic YWRtaW46c2VjcmV0"));
    }
}

#[tokio::test]
async fn test_error_status_and_body_relayed_verbatim() {
    let fake = FakeCms::start().await;
    fake.on(
        "POST /education",
        Canned::raw(403, "application/json; charset=UTF-8", "{\"code\":\"rest_cannot_create\"}"),
    );

    let response = proxy(&fake)
        .create(EntityKind::Education, json_bytes(json!({ "title": "Kurs" })))
        .await
        .unwrap();
    assert_eq!(response.status, 403);
    assert_eq!(response.content_type.as_deref(), Some("application/json; charset=UTF-8"));
    assert_eq!(&response.body[..], b"{\"code\":\"rest_cannot_create\"}");
}

#[tokio::test]
async fn test_create_forwards_body_unchanged() {
    let fake = FakeCms::start().await;
    fake.on("POST /biography", Canned::json(201, json!({ "id": 2 })));

    let body = json!({ "title": "Biografi", "acf": { "born": "1980" } });
    proxy(&fake)
        .create(EntityKind::Biography, json_bytes(body.clone()))
        .await
        .unwrap();

    let request = fake.last_request().unwrap();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.header(header::CONTENT_TYPE), Some("application/json"));
    let sent: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(sent, body);
}

// =============================================================================
// Follow-up read
// =============================================================================

#[tokio::test]
async fn test_work_create_rereads_with_embed() {
    let fake = FakeCms::start().await;
    fake.on("POST /work", Canned::json(201, json!({ "id": 12, "title": "Ny" })));
    fake.on(
        "GET /work/12",
        Canned::json(200, json!({ "id": 12, "title": "Ny", "_embedded": { "wp:featuredmedia": [] } })),
    );

    let response = proxy(&fake)
        .create(EntityKind::Work, json_bytes(json!({ "title": "Ny" })))
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    let body: Value = serde_json::from_slice(&response.body).unwrap();
    assert!(body.get("_embedded").is_some());

    let reread = fake.last_request().unwrap();
    assert_eq!(reread.method, Method::GET);
    assert_eq!(reread.path, "/work/12");
    assert_eq!(reread.query.as_deref(), Some("_embed&acf_format=standard"));
}

#[tokio::test]
async fn test_failed_reread_keeps_write_response() {
    let fake = FakeCms::start().await;
    fake.on("POST /exhibition", Canned::json(201, json!({ "id": 7, "title": "Vår" })));
    fake.on("GET /exhibition/7", Canned::json(500, json!({ "code": "oops" })));

    let response = proxy(&fake)
        .create(EntityKind::Exhibition, json_bytes(json!({ "title": "Vår" })))
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    let body: Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body, json!({ "id": 7, "title": "Vår" }));
}

#[tokio::test]
async fn test_no_reread_for_plain_types_or_failed_writes() {
    let fake = FakeCms::start().await;
    fake.on("POST /grant", Canned::json(201, json!({ "id": 3 })));
    fake.on("POST /work", Canned::json(400, json!({ "code": "rest_invalid_param" })));

    let proxy = proxy(&fake);
    proxy.create(EntityKind::Grant, json_bytes(json!({}))).await.unwrap();
    let response = proxy.create(EntityKind::Work, json_bytes(json!({}))).await.unwrap();
    assert_eq!(response.status, 400);

    assert!(fake.requests().iter().all(|r| r.method == Method::POST));
}

#[tokio::test]
async fn test_malformed_write_response_relayed_without_reread() {
    let fake = FakeCms::start().await;
    fake.on("POST /work", Canned::raw(200, "text/html", "<b>Fatal error</b>"));

    let response = proxy(&fake)
        .create(EntityKind::Work, json_bytes(json!({ "title": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type.as_deref(), Some("text/html"));
    assert_eq!(&response.body[..], b"<b>Fatal error</b>");
    assert_eq!(fake.requests().len(), 1);
}

// =============================================================================
// Update / delete addressing
// =============================================================================

#[tokio::test]
async fn test_update_posts_to_item_and_rereads() {
    let fake = FakeCms::start().await;
    fake.on("POST /work/12", Canned::json(200, json!({ "id": 12 })));
    fake.on("GET /work/12", Canned::json(200, json!({ "id": 12, "_embedded": {} })));

    proxy(&fake)
        .update(EntityKind::Work, json_bytes(json!({ "id": "12", "title": "Ändrad" })))
        .await
        .unwrap();

    let requests = fake.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/work/12");
    assert_eq!(requests[1].method, Method::GET);
}

#[tokio::test]
async fn test_delete_forces_permanent_removal() {
    let fake = FakeCms::start().await;
    fake.on("DELETE /exhibition_list/9", Canned::json(200, json!({ "deleted": true })));

    let response = proxy(&fake)
        .delete(EntityKind::ExhibitionList, json_bytes(json!({ "id": 9 })))
        .await
        .unwrap();
    assert_eq!(response.status, 200);

    let request = fake.last_request().unwrap();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.query.as_deref(), Some("force=true"));
}

#[tokio::test]
async fn test_update_without_id_rejected_before_upstream() {
    let fake = FakeCms::start().await;
    let proxy = proxy(&fake);

    let result = proxy.update(EntityKind::Grant, json_bytes(json!({ "title": "x" }))).await;
    assert!(matches!(result, Err(ProxyError::MissingId)));

    let result = proxy.delete(EntityKind::Grant, Bytes::from_static(b"id=4")).await;
    assert!(matches!(result, Err(ProxyError::InvalidBody(_))));

    assert!(fake.requests().is_empty());
}

// =============================================================================
// Media and connectivity
// =============================================================================

#[tokio::test]
async fn test_media_upload_headers() {
    let fake = FakeCms::start().await;
    fake.on("POST /media", Canned::json(201, json!({ "id": 99, "source_url": "https://cms.example/a.png" })));

    let response = proxy(&fake)
        .upload_media("a.png", "image/png", Bytes::from_static(b"\x89PNG"))
        .await
        .unwrap();
    assert_eq!(response.status, 201);

    let request = fake.last_request().unwrap();
    assert_eq!(request.path, "/media");
    assert_eq!(
        request.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"a.png\"")
    );
    assert_eq!(request.header(header::CONTENT_TYPE), Some("image/png"));
    assert!(request.header(header::AUTHORIZATION).is_some());
    assert_eq!(&request.body[..], b"\x89PNG");
}

#[tokio::test]
async fn test_unreachable_cms() {
    let proxy = AdminProxy::new(
        reqwest::Client::new(),
        CmsEndpoint::new("http://127.0.0.1:9/wp-json/wp/v2", 100),
        None,
    );
    let result = proxy.list(EntityKind::Work).await;
    assert!(matches!(result, Err(ProxyError::Unreachable(_))));
}
