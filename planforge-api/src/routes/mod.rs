//! Route assembly.
//!
//! Floor plan routes resolve the caller themselves through the injected
//! [`IdentityProvider`](crate::auth::IdentityProvider), so the router carries
//! no authentication layer. Health, metrics and the OpenAPI document are
//! public.

pub mod floor_plan;
pub mod health;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Build the complete router.
///
/// # Middleware Order (outer to inner)
/// 1. CORS - handles preflight requests
/// 2. Trace - tower-http request spans
/// 3. Observability - request metrics and completion log
pub fn create_api_router(state: AppState, api_config: &ApiConfig, metrics_enabled: bool) -> Router {
    let mut router = Router::new()
        .merge(floor_plan::create_router())
        .nest("/health", health::create_router());

    if metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", get(crate::openapi::openapi_json));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(build_cors_layer(api_config))
            // Box the trace body so CORS sees a body type implementing `Default`.
            .map_response(|res: axum::response::Response<_>| res.map(axum::body::Body::new))
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(observability_middleware)),
    )
}

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed; otherwise only the
/// configured ones, including `*.domain` wildcards.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        return cors.allow_origin(Any);
    }

    tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
    let allowed = config.clone();
    let cors = cors.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _request| {
            origin
                .to_str()
                .map(|origin| allowed.is_origin_allowed(origin))
                .unwrap_or(false)
        },
    ));

    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}
