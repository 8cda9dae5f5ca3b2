//! Page body rendering.
//!
//! # Strategies
//! - [`VerbatimRenderer`]: copies the page bytes unchanged
//! - [`TemplateRenderer`]: looks up the [`EscapePolicy`] of the response
//!   format and either copies the bytes (`Disabled`) or evaluates the page
//!   as a minijinja template against the request's context headers
//!
//! The strategy is picked once at startup; the locate logic is shared.
//!
//! # Escaping
//! ```text
//! None        raw header values, no auto-escape      (text/plain)
//! Structural  raw header values, HTML auto-escape    (text/html)
//! Scripted    JS-string-escaped values, no auto-escape (application/json)
//! ```
//!
//! Bodies are fully rendered into memory before the status line is sent, so
//! a template error never produces a half-written page.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::{self, Read};

use axum::http::HeaderMap;
use minijinja::{AutoEscape, Environment};
use serde::{Deserialize, Serialize};

use crate::config::TemplatingConfig;
use crate::error::{PageError, PageResult};
use crate::http::request::{header_text, HEADER_TABLE};
use crate::pages::format::FormatSpec;
use crate::pages::locator::ResolvedFile;

/// How header values are substituted into a page of a given format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapePolicy {
    /// Templating off; the page is served verbatim.
    Disabled,
    /// Substitute without escaping.
    None,
    /// HTML-aware auto-escaping.
    Structural,
    /// JavaScript string escaping of every value.
    Scripted,
}

/// Immutable MIME essence to policy map. Unlisted formats are `Disabled`.
#[derive(Debug, Clone, Default)]
pub struct TemplatingTable {
    policies: HashMap<String, EscapePolicy>,
}

impl TemplatingTable {
    pub fn from_config(config: &TemplatingConfig) -> Self {
        let policies = config
            .formats
            .iter()
            .map(|(format, settings)| (essence_of(format), settings.effective_policy()))
            .collect();
        Self { policies }
    }

    pub fn with_policy(mut self, format: &str, policy: EscapePolicy) -> Self {
        self.policies.insert(essence_of(format), policy);
        self
    }

    pub fn policy_for(&self, essence: &str) -> EscapePolicy {
        self.policies
            .get(essence)
            .copied()
            .unwrap_or(EscapePolicy::Disabled)
    }
}

fn essence_of(format: &str) -> String {
    match format.parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_string(),
        Err(_) => format.to_ascii_lowercase(),
    }
}

/// Turns a located page into a response body.
pub trait Render: Send + Sync + fmt::Debug {
    fn render(&self, page: &ResolvedFile, format: &FormatSpec, headers: &HeaderMap) -> PageResult<Vec<u8>>;
}

/// Serves every page byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimRenderer;

impl Render for VerbatimRenderer {
    fn render(&self, page: &ResolvedFile, _format: &FormatSpec, _headers: &HeaderMap) -> PageResult<Vec<u8>> {
        read_page(page)
    }
}

/// Evaluates pages as templates for formats that have templating switched on.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    table: TemplatingTable,
}

impl TemplateRenderer {
    pub fn new(table: TemplatingTable) -> Self {
        Self { table }
    }
}

impl Render for TemplateRenderer {
    fn render(&self, page: &ResolvedFile, format: &FormatSpec, headers: &HeaderMap) -> PageResult<Vec<u8>> {
        let policy = self.table.policy_for(&format.essence());
        if policy == EscapePolicy::Disabled {
            return read_page(page);
        }

        let source = String::from_utf8(read_page(page)?).map_err(|e| PageError::Read {
            path: page.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        let context = TemplateContext::from_headers(headers, policy);

        render_template(&source, policy, &context)
            .map(String::into_bytes)
            .map_err(|failure| match failure {
                TemplateFailure::Parse(source) => PageError::TemplateParse {
                    path: page.path.clone(),
                    structural: policy == EscapePolicy::Structural,
                    source,
                },
                TemplateFailure::Render(source) => PageError::TemplateRender {
                    path: page.path.clone(),
                    source,
                },
            })
    }
}

fn read_page(page: &ResolvedFile) -> PageResult<Vec<u8>> {
    let mut body = Vec::new();
    (&page.file)
        .read_to_end(&mut body)
        .map_err(|source| PageError::Read {
            path: page.path.clone(),
            source,
        })?;
    Ok(body)
}

enum TemplateFailure {
    Parse(minijinja::Error),
    Render(minijinja::Error),
}

fn render_template(
    source: &str,
    policy: EscapePolicy,
    context: &TemplateContext,
) -> Result<String, TemplateFailure> {
    let auto_escape = match policy {
        EscapePolicy::Structural => AutoEscape::Html,
        EscapePolicy::Disabled | EscapePolicy::None | EscapePolicy::Scripted => AutoEscape::None,
    };

    let mut env = Environment::new();
    env.set_auto_escape_callback(move |_| auto_escape.clone());
    let template = env.template_from_str(source).map_err(TemplateFailure::Parse)?;
    template.render(&context.values).map_err(TemplateFailure::Render)
}

/// Header values visible to a template, keyed by logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<&'static str, String>,
}

impl TemplateContext {
    pub fn from_headers(headers: &HeaderMap, policy: EscapePolicy) -> Self {
        let values = HEADER_TABLE
            .iter()
            .map(|(name, wire)| {
                let value = header_text(headers, wire);
                let value = match policy {
                    EscapePolicy::Scripted => js_escape(&value),
                    _ => value,
                };
                (*name, value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Escape `value` for embedding in a quoted JavaScript or JSON string.
pub fn js_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '&' => out.push_str("\\u0026"),
            '=' => out.push_str("\\u003D"),
            c if c.is_control() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}
