//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram,
    gauge, histogram, Unit,
};
use std::time::Instant;

/// Metrics prefix for all FlightGraph metrics
pub const METRICS_PREFIX: &str = "flightgraph";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 250ms, P99 < 2.5s (two network-bound collaborators per request)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms - P50 target
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s - P99 target
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Resolution metrics
    describe_counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        Unit::Count,
        "Total resolutions by intent, query source and outcome"
    );

    describe_histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end resolution latency in seconds"
    );

    describe_gauge!(
        format!("{}_resolution_rows", METRICS_PREFIX),
        Unit::Count,
        "Number of rows returned by the last resolution"
    );

    // Inference metrics
    describe_counter!(
        format!("{}_inference_pass_total", METRICS_PREFIX),
        Unit::Count,
        "Parameter inference passes that produced at least one parameter"
    );

    // Graph store metrics
    describe_histogram!(
        format!("{}_store_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Graph store query latency in seconds"
    );

    describe_counter!(
        format!("{}_store_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total graph store failures"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record resolution metrics
pub fn record_resolution(duration_secs: f64, intent: &str, source: &str, rows: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_resolutions_total", METRICS_PREFIX),
        "intent" => intent.to_string(),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_resolution_duration_seconds", METRICS_PREFIX),
        "intent" => intent.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_resolution_rows", METRICS_PREFIX),
        "intent" => intent.to_string()
    )
    .set(rows as f64);
}

/// Helper to record which inference pass produced parameters
pub fn record_inference_pass(pass: &str) {
    counter!(
        format!("{}_inference_pass_total", METRICS_PREFIX),
        "pass" => pass.to_string()
    )
    .increment(1);
}

/// Helper to record graph store metrics
pub fn record_store_query(duration_secs: f64, store: &str, success: bool) {
    histogram!(
        format!("{}_store_query_duration_seconds", METRICS_PREFIX),
        "store" => store.to_string()
    )
    .record(duration_secs);

    if !success {
        counter!(
            format!("{}_store_errors_total", METRICS_PREFIX),
            "store" => store.to_string()
        )
        .increment(1);
    }
}
