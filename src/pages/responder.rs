//! Per-request pipeline.
//!
//! ```text
//! X-Format → FormatSpec ─┐
//! X-Code   → status ─────┼→ locate → render → [countable: record metrics] → Response
//!                        └→ NotFound / render error → generic 404 / 500
//! ```
//!
//! Every request is resolved independently. The responder itself only holds
//! immutable tables and is shared across requests behind an `Arc`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Version};
use axum::response::{IntoResponse, Response};

use crate::config::ServiceConfig;
use crate::error::{PageError, PageResult};
use crate::http::request::{header_value, protocol_label, HEADER_TABLE, X_CODE, X_FORMAT};
use crate::observability::metrics;
use crate::pages::format::{resolve_code, FormatTable};
use crate::pages::locator::locate;
use crate::pages::render::{Render, TemplateRenderer, TemplatingTable, VerbatimRenderer};

/// A fully rendered error page.
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub content_type: String,
    pub body: Vec<u8>,
    pub path: PathBuf,
    /// Matched on the exact status code.
    pub countable: bool,
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        match HeaderValue::from_str(&self.content_type) {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(_) => {
                tracing::warn!(content_type = %self.content_type, "Content type is not a valid header value");
            }
        }
        response
    }
}

/// Resolves requests to error pages.
#[derive(Debug, Clone)]
pub struct ErrorPageResponder {
    base: PathBuf,
    formats: Arc<FormatTable>,
    renderer: Arc<dyn Render>,
    debug: bool,
}

impl ErrorPageResponder {
    pub fn new(base: impl Into<PathBuf>, formats: FormatTable, renderer: Arc<dyn Render>) -> Self {
        Self {
            base: base.into(),
            formats: Arc::new(formats),
            renderer,
            debug: false,
        }
    }

    /// Build the responder and pick the render strategy from config.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let renderer: Arc<dyn Render> = if config.templating.enabled {
            Arc::new(TemplateRenderer::new(TemplatingTable::from_config(&config.templating)))
        } else {
            Arc::new(VerbatimRenderer)
        };

        Self::new(
            config.pages.error_files_path.clone(),
            FormatTable::from_config(&config.pages),
            renderer,
        )
        .with_debug(config.debug)
    }

    /// Echo the context headers back on every response.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Resolve, locate and render the page for a request.
    pub fn resolve(&self, headers: &HeaderMap) -> PageResult<ErrorPage> {
        let format = self.formats.resolve_format(header_value(headers, &X_FORMAT));
        let code = resolve_code(header_value(headers, &X_CODE));

        let page = locate(&self.base, code, &format.extensions)?;
        tracing::info!(
            code,
            format = %format.mime_type,
            file = %page.path.display(),
            "Serving custom error response"
        );

        let body = self.renderer.render(&page, &format, headers)?;

        Ok(ErrorPage {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::NOT_FOUND),
            content_type: format.mime_type,
            body,
            path: page.path,
            countable: page.countable,
        })
    }

    /// Run the whole pipeline and build the HTTP response.
    pub fn respond(&self, headers: &HeaderMap, version: Version) -> Response {
        let start = Instant::now();

        let mut response = match self.resolve(headers) {
            Ok(page) => {
                if page.status.is_informational() {
                    tracing::warn!(
                        status = page.status.as_u16(),
                        file = %page.path.display(),
                        "Informational status cannot be sent as a final response"
                    );
                } else if page.countable {
                    metrics::record_request(protocol_label(version), start);
                }
                page.into_response()
            }
            Err(e) => {
                match &e {
                    PageError::NotFound { .. } => tracing::warn!(error = %e, "No error page found"),
                    _ => tracing::error!(error = %e, "Failed to produce error page"),
                }
                (e.status(), e.public_message()).into_response()
            }
        };

        if self.debug {
            echo_context_headers(headers, response.headers_mut());
        }
        response
    }
}

fn echo_context_headers(request: &HeaderMap, response: &mut HeaderMap) {
    for (_, name) in HEADER_TABLE.iter() {
        if *name == header::CONTENT_TYPE {
            continue;
        }
        let value = request
            .get(name)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""));
        response.insert(name.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::{X_NAMESPACE, X_REQUEST_ID, X_SERVICE_PORT};
    use crate::observability::metrics::{build_recorder, REQUEST_COUNT};
    use crate::pages::render::EscapePolicy;
    use std::fs;
    use tempfile::TempDir;

    fn pages(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn responder(dir: &TempDir) -> ErrorPageResponder {
        let mut config = ServiceConfig::default();
        config.pages.error_files_path = dir.path().to_string_lossy().into_owned();
        ErrorPageResponder::from_config(&config)
    }

    fn request(format: Option<&'static str>, code: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(format) = format {
            headers.insert(X_FORMAT, HeaderValue::from_static(format));
        }
        if let Some(code) = code {
            headers.insert(X_CODE, HeaderValue::from_static(code));
        }
        headers
    }

    #[test]
    fn test_exact_and_class_pages() {
        let dir = pages(&[("404.html", "exact"), ("4xx.html", "class")]);
        let responder = responder(&dir);

        let page = responder.resolve(&request(None, Some("404"))).unwrap();
        assert_eq!(page.status, StatusCode::NOT_FOUND);
        assert_eq!(page.body, b"exact");
        assert!(page.countable);

        let page = responder.resolve(&request(Some("text/html"), Some("499"))).unwrap();
        assert_eq!(page.status.as_u16(), 499);
        assert_eq!(page.body, b"class");
        assert_eq!(page.path, dir.path().join("4xx.html"));
        assert!(!page.countable);
    }

    #[test]
    fn test_json_class_page() {
        let dir = pages(&[("5xx.json", r#"{"error":true}"#)]);
        let response = responder(&dir).respond(
            &request(Some("application/json"), Some("503")),
            Version::HTTP_11,
        );

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_missing_headers_default_to_html_404() {
        let dir = pages(&[("404.htm", "fallback extension")]);
        let page = responder(&dir).resolve(&HeaderMap::new()).unwrap();
        assert_eq!(page.status, StatusCode::NOT_FOUND);
        assert_eq!(page.content_type, "text/html");
        assert_eq!(page.body, b"fallback extension");
    }

    #[test]
    fn test_invalid_code_and_format_degrade() {
        let dir = pages(&[("404.html", "default")]);
        let page = responder(&dir)
            .resolve(&request(Some("application/x-unknown-thing"), Some("700")))
            .unwrap();
        assert_eq!(page.status, StatusCode::NOT_FOUND);
        assert_eq!(page.content_type, "text/html");
    }

    #[test]
    fn test_no_page_is_generic_not_found() {
        let dir = pages(&[("5xx.html", "server")]);
        let response = responder(&dir).respond(&request(None, Some("403")), Version::HTTP_11);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_template_error_is_server_error() {
        let dir = pages(&[("500.html", "{% if %}")]);
        let responder = ErrorPageResponder::new(
            dir.path(),
            FormatTable::new("text/html", vec![".html".to_string()]),
            Arc::new(TemplateRenderer::new(
                TemplatingTable::default().with_policy("text/html", EscapePolicy::Structural),
            )),
        );

        let response = responder.respond(&request(None, Some("500")), Version::HTTP_11);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_templating_switched_on_from_config() {
        let dir = pages(&[("404.html", "<b>{{ Namespace }}</b>")]);
        let mut config = ServiceConfig::default();
        config.pages.error_files_path = dir.path().to_string_lossy().into_owned();
        config
            .templating
            .formats
            .get_mut("text/html")
            .unwrap()
            .enabled = true;

        let mut headers = request(None, None);
        headers.insert(X_NAMESPACE, HeaderValue::from_static("<i>prod</i>"));

        let page = ErrorPageResponder::from_config(&config).resolve(&headers).unwrap();
        let body = String::from_utf8(page.body).unwrap();
        assert!(body.starts_with("<b>&lt;i&gt;prod"), "{body}");
        assert!(!body.contains("<i>"), "{body}");
    }

    #[test]
    fn test_templating_disabled_globally() {
        let dir = pages(&[("404.html", "<b>{{ Namespace }}</b>")]);
        let mut config = ServiceConfig::default();
        config.pages.error_files_path = dir.path().to_string_lossy().into_owned();
        config.templating.enabled = false;
        for settings in config.templating.formats.values_mut() {
            settings.enabled = true;
        }

        let page = ErrorPageResponder::from_config(&config)
            .resolve(&HeaderMap::new())
            .unwrap();
        assert_eq!(page.body, b"<b>{{ Namespace }}</b>");
    }

    #[test]
    fn test_debug_echoes_context_headers() {
        let dir = pages(&[("404.html", "page")]);
        let mut headers = request(Some("text/html"), Some("404"));
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));

        let response = responder(&dir)
            .with_debug(true)
            .respond(&headers, Version::HTTP_11);

        assert_eq!(response.headers()[X_REQUEST_ID], "req-1");
        assert_eq!(response.headers()[X_CODE], "404");
        assert_eq!(response.headers()[X_SERVICE_PORT], "");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");

        let response = responder(&dir).respond(&headers, Version::HTTP_11);
        assert!(response.headers().get(X_REQUEST_ID).is_none());
    }

    #[test]
    fn test_only_exact_matches_are_counted() {
        let dir = pages(&[("404.html", "exact"), ("4xx.html", "class")]);
        let responder = responder(&dir);
        let recorder = build_recorder().unwrap();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            for _ in 0..5 {
                responder.respond(&request(None, Some("404")), Version::HTTP_11);
            }
            for _ in 0..3 {
                responder.respond(&request(None, Some("451")), Version::HTTP_11);
            }
            responder.respond(&request(None, Some("404")), Version::HTTP_10);
            responder.respond(&request(None, Some("503")), Version::HTTP_11);
        });

        let output = handle.render();
        assert!(output.contains(&format!("{REQUEST_COUNT}{{proto=\"1.1\"}} 5")), "{output}");
        assert!(output.contains(&format!("{REQUEST_COUNT}{{proto=\"1.0\"}} 1")), "{output}");
    }

    #[test]
    fn test_informational_pages_are_not_counted() {
        let dir = pages(&[("101.html", "switching"), ("404.html", "exact")]);
        let responder = responder(&dir);
        let recorder = build_recorder().unwrap();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            responder.respond(&request(None, Some("101")), Version::HTTP_11);
            responder.respond(&request(None, Some("404")), Version::HTTP_10);
        });

        let output = handle.render();
        assert!(!output.contains(&format!("{REQUEST_COUNT}{{proto=\"1.1\"}}")), "{output}");
        assert!(output.contains(&format!("{REQUEST_COUNT}{{proto=\"1.0\"}} 1")), "{output}");
    }

    #[test]
    fn test_wildcard_format_uses_default() {
        let dir = pages(&[("404.css", "css"), ("404.html", "html")]);
        let page = responder(&dir)
            .resolve(&request(Some("*/*"), Some("404")))
            .unwrap();
        assert_eq!(page.content_type, "text/html");
        assert_eq!(page.body, b"html");
    }
}
