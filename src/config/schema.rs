//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the error
//! page backend. All types derive Serde traits for deserialization from
//! config files, and every field has a default so an empty file is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::pages::EscapePolicy;

/// Root configuration for the error page backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where error pages live and how formats map to files.
    pub pages: PagesConfig,

    /// Per-format templating switches.
    pub templating: TemplatingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Echo the context headers back as response headers.
    pub debug: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Error page lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Directory holding `<code>.<ext>` and `<class>xx.<ext>` files.
    pub error_files_path: String,

    /// Format used when `X-Format` is missing or unknown.
    pub default_format: String,

    /// Candidate extensions for the default format, in lookup order.
    pub default_extensions: Vec<String>,

    /// Extra MIME type to extension mappings, consulted before the
    /// built-in media type registry.
    pub extensions: BTreeMap<String, Vec<String>>,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            error_files_path: "/www".to_string(),
            default_format: "text/html".to_string(),
            default_extensions: vec![".html".to_string(), ".htm".to_string()],
            extensions: BTreeMap::new(),
        }
    }
}

/// Templating configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplatingConfig {
    /// Use the template renderer. When false every page is served verbatim
    /// regardless of the per-format switches.
    pub enabled: bool,

    /// Templating settings keyed by MIME type.
    pub formats: BTreeMap<String, FormatTemplating>,
}

impl Default for TemplatingConfig {
    fn default() -> Self {
        let mut formats = BTreeMap::new();
        formats.insert(
            "text/plain".to_string(),
            FormatTemplating::new(EscapePolicy::None, "TEMPLATE_TEXT"),
        );
        formats.insert(
            "text/html".to_string(),
            FormatTemplating::new(EscapePolicy::Structural, "TEMPLATE_HTML"),
        );
        formats.insert(
            "application/json".to_string(),
            FormatTemplating::new(EscapePolicy::Scripted, "TEMPLATE_JSON"),
        );

        Self {
            enabled: true,
            formats,
        }
    }
}

/// Templating settings for one MIME type.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatTemplating {
    /// How header values are escaped when substituted.
    pub escape: EscapePolicy,

    /// Whether templating is switched on for this format.
    #[serde(default)]
    pub enabled: bool,

    /// Environment variable that switches templating on when non-empty.
    #[serde(default)]
    pub enable_env: Option<String>,
}

impl FormatTemplating {
    fn new(escape: EscapePolicy, enable_env: &str) -> Self {
        Self {
            escape,
            enabled: false,
            enable_env: Some(enable_env.to_string()),
        }
    }

    /// The policy actually applied to pages of this format.
    pub fn effective_policy(&self) -> EscapePolicy {
        if self.enabled {
            self.escape
        } else {
            EscapePolicy::Disabled
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format.
    pub json_logs: bool,

    /// Enable the metrics endpoint.
    pub metrics_enabled: bool,

    /// Path the Prometheus exposition is served on.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
        }
    }
}
