//! Tracing subscriber initialization.
//!
//! Installs an `EnvFilter` driven by `RUST_LOG`, a JSON or pretty fmt layer
//! selected by `PLANFORGE_LOG_FORMAT`, and an OpenTelemetry layer exporting
//! spans over OTLP/HTTP when `PLANFORGE_OTLP_ENDPOINT` is set.

use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "planforge_api=debug,tower_http=info,info";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// OTLP/HTTP endpoint for traces (e.g., "http://localhost:4318/v1/traces")
    pub otlp_endpoint: Option<String>,
    /// Service name for traces and the startup log line
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Deployment environment attached to exported spans
    pub environment: String,
    /// Fraction of traces sampled (0.0 to 1.0)
    pub trace_sample_rate: f64,
    pub log_format: LogFormat,
    /// Expose /metrics
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: std::env::var("PLANFORGE_OTLP_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            service_name: std::env::var("PLANFORGE_SERVICE_NAME")
                .unwrap_or_else(|_| "planforge-api".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: std::env::var("PLANFORGE_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            trace_sample_rate: std::env::var("PLANFORGE_TRACE_SAMPLE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            log_format: std::env::var("PLANFORGE_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            metrics_enabled: std::env::var("PLANFORGE_METRICS_ENABLED")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(true),
        }
    }
}

/// Sampler for a configured sample rate.
pub fn sampler_for(rate: f64) -> Sampler {
    if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 || rate.is_nan() {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(rate)
    }
}

/// Holds the tracer provider so pending spans can be flushed on exit.
#[must_use = "dropping the guard skips the span flush on shutdown"]
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are exported over OTLP.
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush pending spans and shut the exporter down.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            match provider.shutdown() {
                Ok(()) => tracing::info!("Tracer shutdown complete"),
                Err(e) => tracing::warn!(error = %e, "Tracer shutdown failed"),
            }
        }
    }
}

fn build_tracer_provider(config: &TelemetryConfig, endpoint: &str) -> ApiResult<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| ApiError::internal_error(format!("Failed to create OTLP exporter: {}", e)))?;

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(sampler_for(config.trace_sample_rate))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build())
}

/// Install the global tracing subscriber. Call once at startup.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<TelemetryGuard> {
    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            global::set_text_map_propagator(TraceContextPropagator::new());
            let provider = build_tracer_provider(config, endpoint)?;
            global::set_tracer_provider(provider.clone());
            Some(provider)
        }
        None => None,
    };

    let otel_layer = provider.as_ref().map(|provider| {
        tracing_opentelemetry::layer().with_tracer(provider.tracer("planforge-api"))
    });
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter).with(otel_layer);
    let result = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        log_format = ?config.log_format,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_enabled = config.metrics_enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}
