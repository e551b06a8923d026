/// Metrics and telemetry for Atomic Uploader
///
/// Provides Prometheus-compatible metrics for:
/// - Uploaded items by outcome
/// - Confirmation poll attempts
/// - Collection assembly
/// - Query service latencies

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Upload items by outcome (success, failure)
    pub static ref UPLOAD_ITEMS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "upload_items_total",
        "Total number of content items processed",
        &["outcome"]
    )
    .unwrap();

    /// Confirmation poll attempts by result (found, missing, error)
    pub static ref POLL_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "poll_attempts_total",
        "Total number of process confirmation poll attempts",
        &["result"]
    )
    .unwrap();

    /// Collections by outcome (created, failed)
    pub static ref COLLECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "collections_total",
        "Total number of collection assemblies",
        &["outcome"]
    )
    .unwrap();

    /// Query service latencies in seconds
    pub static ref QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "query_duration_seconds",
        "GraphQL query latencies in seconds",
        &["gateway"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Requests to external services by service and status
    pub static ref NETWORK_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "network_requests_total",
        "Total number of requests to external services",
        &["service", "status"]
    )
    .unwrap();
}

pub fn record_item(outcome: &str) {
    UPLOAD_ITEMS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_poll_attempt(result: &str) {
    POLL_ATTEMPTS_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_collection(outcome: &str) {
    COLLECTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn observe_query(gateway: &str, seconds: f64) {
    QUERY_DURATION_SECONDS
        .with_label_values(&[gateway])
        .observe(seconds);
}

pub fn record_request(service: &str, status: u16) {
    NETWORK_REQUESTS_TOTAL
        .with_label_values(&[service, &status.to_string()])
        .inc();
}

/// Render all registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_exposition() {
        record_item("success");
        record_poll_attempt("missing");
        record_collection("created");

        let output = gather_metrics();
        assert!(output.contains("upload_items_total"));
        assert!(output.contains("poll_attempts_total"));
        assert!(output.contains("collections_total"));
    }
}
