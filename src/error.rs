//! Per-request failure types.

use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that end a request without a custom page.
#[derive(Debug, Error)]
pub enum PageError {
    /// No file at the exact code or the status class level.
    #[error("no error page for code {code}")]
    NotFound { code: u16 },

    /// The located file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The located file is not a valid template.
    #[error("failed to parse template {}: {source}", .path.display())]
    TemplateParse {
        path: PathBuf,
        /// The template was parsed with HTML auto-escaping.
        structural: bool,
        #[source]
        source: minijinja::Error,
    },

    /// The template parsed but could not be evaluated.
    #[error("failed to render template {}: {source}", .path.display())]
    TemplateRender {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },
}

impl PageError {
    /// HTTP status sent to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Generic body sent to the client for this failure.
    pub fn public_message(&self) -> &'static str {
        match self {
            PageError::NotFound { .. } => "404 page not found",
            PageError::TemplateParse { structural: true, .. } => "Cannot render HTML response",
            _ => "Cannot render response",
        }
    }
}

/// Result type for page resolution.
pub type PageResult<T> = Result<T, PageError>;
