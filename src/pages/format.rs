//! Format and status code negotiation.
//!
//! # Responsibilities
//! - Turn `X-Format` into a MIME type plus candidate file extensions
//! - Turn `X-Code` into a valid HTTP status code
//!
//! # Design Decisions
//! - Resolution never fails; bad input degrades to the defaults and is logged
//! - Operator overrides are consulted before the built-in registry
//! - Registry extensions are sorted so lookup order is deterministic

use std::collections::HashMap;

use crate::config::PagesConfig;

/// Status code used when `X-Code` is missing or invalid.
pub const DEFAULT_CODE: u16 = 404;

/// Desired response format and the file extensions that can satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// Value sent back as `Content-Type`.
    pub mime_type: String,
    /// Candidate extensions in lookup order.
    pub extensions: Vec<String>,
}

impl FormatSpec {
    /// The bare `type/subtype`, lowercased and without parameters.
    pub fn essence(&self) -> String {
        match self.mime_type.parse::<mime::Mime>() {
            Ok(parsed) => parsed.essence_str().to_string(),
            Err(_) => self.mime_type.trim().to_ascii_lowercase(),
        }
    }
}

/// Immutable MIME type to extension table.
#[derive(Debug, Clone)]
pub struct FormatTable {
    default_format: String,
    default_extensions: Vec<String>,
    overrides: HashMap<String, Vec<String>>,
}

impl FormatTable {
    pub fn new(default_format: impl Into<String>, default_extensions: Vec<String>) -> Self {
        Self {
            default_format: default_format.into(),
            default_extensions,
            overrides: HashMap::new(),
        }
    }

    /// Build the table from the `[pages]` config section.
    pub fn from_config(config: &PagesConfig) -> Self {
        let mut table = Self::new(
            config.default_format.clone(),
            config.default_extensions.clone(),
        );
        for (format, extensions) in &config.extensions {
            table = table.with_override(format, extensions.clone());
        }
        table
    }

    /// Register extensions for a MIME type ahead of the built-in registry.
    pub fn with_override(mut self, format: &str, extensions: Vec<String>) -> Self {
        let key = match format.parse::<mime::Mime>() {
            Ok(parsed) => parsed.essence_str().to_string(),
            Err(_) => format.to_ascii_lowercase(),
        };
        self.overrides.insert(key, extensions);
        self
    }

    pub fn default_spec(&self) -> FormatSpec {
        FormatSpec {
            mime_type: self.default_format.clone(),
            extensions: self.default_extensions.clone(),
        }
    }

    /// Resolve the `X-Format` header value.
    pub fn resolve_format(&self, header: &str) -> FormatSpec {
        if header.is_empty() {
            tracing::debug!(format = %self.default_format, "Format not specified, using default");
            return self.default_spec();
        }

        let parsed = match header.parse::<mime::Mime>() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    requested = %header,
                    error = %e,
                    fallback = %self.default_format,
                    "Unparseable media type, using default format"
                );
                return self.default_spec();
            }
        };

        if parsed.type_() == mime::STAR || parsed.subtype() == mime::STAR {
            tracing::warn!(
                requested = %header,
                fallback = %self.default_format,
                "Wildcard media type, using default format"
            );
            return self.default_spec();
        }

        let extensions = self.extensions_for(parsed.essence_str());
        if extensions.is_empty() {
            tracing::warn!(
                requested = %header,
                fallback = ?self.default_extensions,
                "No extensions registered for media type, using default format"
            );
            return self.default_spec();
        }

        FormatSpec {
            mime_type: header.to_string(),
            extensions,
        }
    }

    fn extensions_for(&self, essence: &str) -> Vec<String> {
        if let Some(extensions) = self.overrides.get(essence) {
            return extensions.clone();
        }

        let mut extensions: Vec<String> = mime_guess::get_mime_extensions_str(essence)
            .unwrap_or_default()
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

/// Resolve the `X-Code` header value.
///
/// Anything outside `100..600` falls back to [`DEFAULT_CODE`].
pub fn resolve_code(header: &str) -> u16 {
    if header.is_empty() {
        tracing::debug!(code = DEFAULT_CODE, "No HTTP code provided, using default");
        return DEFAULT_CODE;
    }

    let code = match header.parse::<i64>() {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(
                requested = %header,
                error = %e,
                fallback = DEFAULT_CODE,
                "Unparseable HTTP code"
            );
            return DEFAULT_CODE;
        }
    };

    match u16::try_from(code) {
        Ok(code) if (100..600).contains(&code) => code,
        _ => {
            tracing::warn!(requested = code, fallback = DEFAULT_CODE, "Invalid HTTP code");
            DEFAULT_CODE
        }
    }
}
