//! Error types shared by the content index, the page assembler and the render store

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Result type alias using `SiteError`.
pub type Result<T> = std::result::Result<T, SiteError>;

#[derive(Error, Debug)]
pub enum SiteError {
    /// Blog metadata is missing or malformed. Fatal at startup.
    #[error("Data error in {path}: {message}")]
    Data { path: PathBuf, message: String },

    /// Unknown post link or missing content file.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller passed an argument outside the operation's contract.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SiteError {
    pub fn data(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Data {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status the request boundary reports for this error
    pub fn status(&self) -> StatusCode {
        match self {
            // Page numbers come from the URL, so a bad one is a missing page
            Self::NotFound(_) | Self::InvalidArgument(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = match status {
            StatusCode::NOT_FOUND => "<h1>404</h1><p>The page you requested does not exist.</p>",
            _ => "<h1>500</h1><p>Something went wrong while rendering this page.</p>",
        };
        (status, Html(body)).into_response()
    }
}
