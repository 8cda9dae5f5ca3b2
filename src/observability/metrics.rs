//! Metrics collection and exposition.
//!
//! # Metrics
//! - `default_http_backend_http_request_count_total` (counter): served pages by protocol
//! - `default_http_backend_http_request_duration_seconds` (histogram): time from
//!   lookup start to rendered body, by protocol
//!
//! Only pages matched on their exact status code are recorded; status class
//! fallbacks are left out so generic pages do not skew per-code numbers.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

pub const REQUEST_COUNT: &str = "default_http_backend_http_request_count_total";
pub const REQUEST_DURATION: &str = "default_http_backend_http_request_duration_seconds";

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.003, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), DURATION_BUCKETS)
}

/// Build a Prometheus recorder with the histogram buckets used here.
pub fn build_recorder() -> Result<PrometheusRecorder, BuildError> {
    Ok(builder()?.build_recorder())
}

/// Install the global recorder and return the handle used to render the
/// exposition text.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = builder()?.install_recorder()?;

    describe_metrics();
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

/// Register help text for every metric.
pub fn describe_metrics() {
    describe_counter!(REQUEST_COUNT, "Counter of HTTP requests made.");
    describe_histogram!(
        REQUEST_DURATION,
        Unit::Seconds,
        "Histogram of the time each request took."
    );
}

/// Record one served page.
pub fn record_request(proto: &'static str, start: Instant) {
    let duration = start.elapsed().as_secs_f64();

    counter!(REQUEST_COUNT, "proto" => proto).increment(1);
    histogram!(REQUEST_DURATION, "proto" => proto).record(duration);
}
