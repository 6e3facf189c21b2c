//! atelier-web library - portfolio site server
//!
//! Serves the public gallery API over a headless CMS and relays admin
//! writes to it.

use std::sync::Arc;

use atelier_common::config::SiteConfig;
use axum::Router;

pub mod api;
pub mod cms;
pub mod error;
pub mod gallery;
pub mod views;

pub use error::{Error, Result};

use cms::content::ContentClient;
use cms::proxy::AdminProxy;
use cms::CmsEndpoint;
use views::CollectionViews;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentClient>,
    pub proxy: Arc<AdminProxy>,
    /// Derived views over the cached collections
    pub views: Arc<CollectionViews>,
    pub config: Arc<SiteConfig>,
}

impl AppState {
    pub fn new(content: ContentClient, proxy: AdminProxy, config: SiteConfig) -> Self {
        Self {
            content: Arc::new(content),
            proxy: Arc::new(proxy),
            views: Arc::new(CollectionViews::default()),
            config: Arc::new(config),
        }
    }

    /// State wired from configuration, sharing one HTTP client
    pub fn from_config(http: reqwest::Client, config: SiteConfig) -> Self {
        let content = ContentClient::from_config(http.clone(), &config);
        let proxy = AdminProxy::new(
            http,
            CmsEndpoint::new(&config.cms_base_url, config.per_page),
            config.credentials.as_ref(),
        );
        Self::new(content, proxy, config)
    }
}

/// Build application router
///
/// Public and health routes need no auth. Admin routes require the bearer
/// token when one is configured.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post};
    use axum::{middleware, Extension};
    use cms::EntityKind;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    // Admin routes (require authentication)
    let mut admin = Router::new().route(
        "/admin/api/media",
        post(api::admin::upload_media)
            .layer(DefaultBodyLimit::max(api::admin::MEDIA_BODY_LIMIT)),
    );
    for kind in EntityKind::ALL {
        admin = admin.route(
            &format!("/admin/api/{}", kind.admin_route()),
            get(api::admin::list)
                .post(api::admin::create)
                .put(api::admin::update)
                .delete(api::admin::delete)
                .layer(Extension(kind)),
        );
    }
    let admin = admin.layer(middleware::from_fn_with_state(
        state.clone(),
        api::admin_auth_middleware,
    ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .route("/api/works", get(api::gallery::list_works))
        .route("/api/works/:slug", get(api::gallery::get_work))
        .route("/api/exhibitions", get(api::gallery::list_exhibitions))
        .route("/api/exhibitions/:slug", get(api::gallery::get_exhibition))
        .route("/api/exhibitions/:slug/works", get(api::gallery::get_exhibition_works))
        .route("/api/exhibition-list", get(api::gallery::list_exhibition_index))
        .route("/api/info", get(api::gallery::get_info))
        .route("/api/gallery", get(api::gallery::get_gallery))
        .merge(api::health_routes());

    // Combine routers
    Router::new()
        .merge(admin)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
