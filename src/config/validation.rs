//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate that addresses and MIME types parse
//! - Validate value ranges (timeouts > 0, non-empty lists)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a config for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let pages = &config.pages;
    if pages.error_files_path.is_empty() {
        errors.push(ValidationError::new("pages.error_files_path", "must not be empty"));
    }
    if !is_media_type(&pages.default_format) {
        errors.push(ValidationError::new(
            "pages.default_format",
            format!("'{}' is not a media type", pages.default_format),
        ));
    }
    if pages.default_extensions.iter().all(|ext| ext.trim_start_matches('.').is_empty()) {
        errors.push(ValidationError::new(
            "pages.default_extensions",
            "at least one extension is required",
        ));
    }
    for format in pages.extensions.keys() {
        if !is_media_type(format) {
            errors.push(ValidationError::new(
                format!("pages.extensions.\"{format}\""),
                "key is not a media type",
            ));
        }
    }

    for format in config.templating.formats.keys() {
        if !is_media_type(format) {
            errors.push(ValidationError::new(
                format!("templating.formats.\"{format}\""),
                "key is not a media type",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled && !config.observability.metrics_path.starts_with('/') {
        errors.push(ValidationError::new(
            "observability.metrics_path",
            "must start with '/'",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_media_type(value: &str) -> bool {
    value.parse::<mime::Mime>().is_ok()
}
