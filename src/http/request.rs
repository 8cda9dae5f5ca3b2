//! Inbound request metadata.
//!
//! The ingress controller describes the failed request through a fixed set
//! of headers. This module names them and reads them without ever failing:
//! absent or non-text values read as the empty string.

use axum::http::{header, HeaderMap, HeaderName, Version};

/// Desired response MIME type.
pub const X_FORMAT: HeaderName = HeaderName::from_static("x-format");
/// Desired status code as decimal text.
pub const X_CODE: HeaderName = HeaderName::from_static("x-code");
pub const X_ORIGINAL_URI: HeaderName = HeaderName::from_static("x-original-uri");
pub const X_NAMESPACE: HeaderName = HeaderName::from_static("x-namespace");
pub const X_INGRESS_NAME: HeaderName = HeaderName::from_static("x-ingress-name");
pub const X_SERVICE_NAME: HeaderName = HeaderName::from_static("x-service-name");
pub const X_SERVICE_PORT: HeaderName = HeaderName::from_static("x-service-port");
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Logical names exposed to templates, paired with their wire headers.
pub const HEADER_TABLE: [(&str, HeaderName); 9] = [
    ("FormatHeader", X_FORMAT),
    ("CodeHeader", X_CODE),
    ("ContentType", header::CONTENT_TYPE),
    ("OriginalURI", X_ORIGINAL_URI),
    ("Namespace", X_NAMESPACE),
    ("IngressName", X_INGRESS_NAME),
    ("ServiceName", X_SERVICE_NAME),
    ("ServicePort", X_SERVICE_PORT),
    ("RequestID", X_REQUEST_ID),
];

/// Value of `name`, or "" when missing or not visible ASCII.
pub fn header_value<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Value of `name` decoded as UTF-8, or "" when missing.
///
/// Invalid byte sequences become U+FFFD instead of dropping the whole value.
pub fn header_text(headers: &HeaderMap, name: &HeaderName) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Protocol version as `major.minor`, the metrics label format.
pub fn protocol_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_11 => "1.1",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "unknown",
    }
}
