//! Error types for atelier-web

use thiserror::Error;

/// CMS access errors
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, TLS or body read failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// CMS answered with a non-success status
    #[error("CMS error {0}: {1}")]
    Upstream(u16, String),

    /// CMS answered 2xx with a body of the wrong shape
    #[error("Unexpected CMS response: {0}")]
    UnexpectedShape(String),

    #[error("Invalid CMS URL: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, Error>;
