//! Prometheus Metrics Definitions
//!
//! Defines the Planforge metrics and the /metrics endpoint for Prometheus
//! scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Encoder,
    Histogram, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Image provider latency buckets (seconds). Generation takes seconds, not milliseconds.
const GENERATION_LATENCY_BUCKETS: &[f64] =
    &[0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0, 90.0];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<PlanforgeMetrics>> = Lazy::new(PlanforgeMetrics::new);

/// Container for all Planforge metrics.
#[derive(Clone)]
pub struct PlanforgeMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Terminal outcomes of floor plan generation - labels: outcome
    pub floor_plan_generations_total: CounterVec,

    /// Time spent waiting on the image provider
    pub image_generation_duration_seconds: Histogram,
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

impl PlanforgeMetrics {
    /// Create and register all metrics with the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "planforge_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "planforge_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            floor_plan_generations_total: register_counter_vec!(
                "planforge_floor_plan_generations_total",
                "Floor plan generation requests by terminal outcome",
                &["outcome"]
            )
            .map_err(|e| registration_error("floor_plan_generations_total", e))?,

            image_generation_duration_seconds: register_histogram!(
                "planforge_image_generation_duration_seconds",
                "Image provider call duration in seconds",
                GENERATION_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("image_generation_duration_seconds", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record the terminal outcome of one generation request.
    pub fn record_generation_outcome(&self, outcome: &str) {
        self.floor_plan_generations_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record how long the image provider took.
    pub fn record_image_generation(&self, duration_secs: f64) {
        self.image_generation_duration_seconds.observe(duration_secs);
    }
}

/// Run `f` against the global metrics if they registered.
pub fn with_metrics(f: impl FnOnce(&PlanforgeMetrics)) {
    match METRICS.as_ref() {
        Ok(metrics) => f(metrics),
        Err(e) => tracing::debug!(error = %e.message, "Metrics unavailable"),
    }
}

/// Handler for GET /metrics. Returns Prometheus text format.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
))]
pub async fn metrics_handler() -> impl IntoResponse {
    // Registers the collectors on first scrape.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> Result<&'static PlanforgeMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_http_request("POST", "/generate-floor-plan", 200, 0.015);
        let count = metrics
            .http_requests_total
            .with_label_values(&["POST", "/generate-floor-plan", "200"])
            .get();
        assert!(count >= 1.0);
        Ok(())
    }

    #[test]
    fn test_record_generation_outcome() -> Result<(), String> {
        let metrics = metrics()?;
        let before = metrics
            .floor_plan_generations_total
            .with_label_values(&["persistence"])
            .get();
        metrics.record_generation_outcome("persistence");
        let after = metrics
            .floor_plan_generations_total
            .with_label_values(&["persistence"])
            .get();
        assert!(after >= before + 1.0);
        Ok(())
    }

    #[test]
    fn test_record_image_generation() -> Result<(), String> {
        let metrics = metrics()?;
        metrics.record_image_generation(3.2);
        assert!(metrics.image_generation_duration_seconds.get_sample_count() >= 1);
        Ok(())
    }
}
