//! HTTP API handlers for atelier-web

pub mod admin;
pub mod auth;
pub mod buildinfo;
pub mod gallery;
pub mod health;

pub use auth::admin_auth_middleware;
pub use buildinfo::get_build_info;
pub use health::health_routes;
