use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all service metrics
const PREFIX: &str = "chart_harvest";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Rate Limiting Metrics
    pub static ref RATE_LIMIT_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_rate_limit_hits_total"), "Requests denied by the rate limiter"),
        &["path"]
    ).expect("Failed to create rate_limit_hits_total metric");

    // Harvest Metrics
    pub static ref COLLECTOR_FETCHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_collector_fetches_total"),
            "Collector fetches by platform and outcome (live or fallback)"
        ),
        &["platform", "outcome"]
    ).expect("Failed to create collector_fetches_total metric");

    pub static ref HARVESTED_TRACKS: GaugeVec = GaugeVec::new(
        Opts::new(
            format!("{PREFIX}_harvested_tracks"),
            "Tracks in the most recent harvest of each platform"
        ),
        &["platform"]
    ).expect("Failed to create harvested_tracks metric");

    pub static ref SNAPSHOTS_STORED_TOTAL: IntCounter = IntCounter::new(
        format!("{PREFIX}_snapshots_stored_total"),
        "Platform snapshots written to the snapshot store"
    ).expect("Failed to create snapshots_stored_total metric");
}

/// Register every metric with the registry. Safe to call more than once.
pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(RATE_LIMIT_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(COLLECTOR_FETCHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HARVESTED_TRACKS.clone()));
    let _ = REGISTRY.register(Box::new(SNAPSHOTS_STORED_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_rate_limit_hit(path: &str) {
    RATE_LIMIT_HITS_TOTAL.with_label_values(&[path]).inc();
}

pub fn record_collector_outcome(platform: &str, outcome: &str) {
    COLLECTOR_FETCHES_TOTAL
        .with_label_values(&[platform, outcome])
        .inc();
}

pub fn record_harvested_tracks(platform: &str, count: usize) {
    HARVESTED_TRACKS
        .with_label_values(&[platform])
        .set(count as f64);
}

pub fn record_snapshots_stored(count: usize) {
    SNAPSHOTS_STORED_TOTAL.inc_by(count as u64);
}

/// Collapses concrete request paths into route-shaped labels, keeping the
/// label set bounded whatever slugs clients send.
pub fn endpoint_label(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/api/v1/platforms" => "/api/v1/platforms",
        "/api/v1/platforms/all" => "/api/v1/platforms/all",
        "/api/v1/harvest/run" => "/api/v1/harvest/run",
        "/api/v1/harvest/recent" => "/api/v1/harvest/recent",
        "/api/v1/harvest/impact" => "/api/v1/harvest/impact",
        "/api/v1/charts/turntable" => "/api/v1/charts/turntable",
        p if p.starts_with("/api/v1/platforms/") => "/api/v1/platforms/{slug}",
        p if p.starts_with("/api/v1/harvest/history/") => "/api/v1/harvest/history/{slug}",
        _ => "other",
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
