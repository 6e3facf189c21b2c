//! atelier-web - portfolio site server
//!
//! Public gallery API backed by a headless CMS, plus an admin proxy for
//! content edits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use atelier_common::config::{CliOverrides, SiteConfig};
use clap::Parser;
use tokio::signal;
use tracing::info;

use atelier_web::{build_router, AppState};

const USER_AGENT: &str = concat!("atelier-web/", env!("CARGO_PKG_VERSION"));

/// Command-line arguments for atelier-web
#[derive(Parser, Debug)]
#[command(name = "atelier-web")]
#[command(about = "Portfolio site server over a headless CMS")]
#[command(version)]
struct Args {
    /// Config file (default: <config_dir>/atelier/config.toml)
    #[arg(short, long, env = "ATELIER_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    bind_addr: Option<String>,

    /// CMS REST root, e.g. https://cms.example/wp-json/wp/v2
    #[arg(long)]
    cms_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification before anything can block
    info!(
        "Starting Atelier web server (atelier-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let cli = CliOverrides {
        cms_base_url: args.cms_base_url,
        bind_addr: args.bind_addr,
        port: args.port,
    };
    let config = SiteConfig::resolve(&cli, args.config.as_deref())
        .context("Failed to resolve configuration")?;

    info!("CMS: {}", config.cms_base_url);
    match config.cache_ttl {
        Some(ttl) => info!("Collection cache TTL: {:?}", ttl),
        None => info!("Collection cache: process lifetime"),
    }
    if config.admin_token.is_none() {
        info!("Admin authentication disabled (no admin_token configured)");
    }

    // No request timeout: the gallery readiness timeout is the only deadline
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let state = AppState::from_config(http, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("atelier-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
