//! Planforge Telemetry - Observability Infrastructure
//!
//! Structured logging through `tracing`, optional OTLP span export and
//! Prometheus metrics for the API layer.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, PlanforgeMetrics, METRICS};
pub use middleware::{observability_middleware, route_label};
pub use tracer::{init_tracer, sampler_for, LogFormat, TelemetryConfig, TelemetryGuard};
