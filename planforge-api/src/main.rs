//! Planforge API Server Entry Point
//!
//! Loads configuration, connects the store and image provider, and starts
//! the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use planforge_api::telemetry::{init_tracer, TelemetryConfig};
use planforge_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, JwtIdentityProvider,
    StoreBackend,
};
use planforge_llm::{ImageProviderConfig, OpenAIImageProvider};
use planforge_storage::{DbConfig, DocumentStore, InMemoryStore, PgStore};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    let telemetry = init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let production = api_config.environment.is_production();
    api_config.validate_for_production()?;

    let auth_config = AuthConfig::from_env();
    auth_config.validate_for_production(production)?;

    let store = connect_store(StoreBackend::from_env()?).await?;

    let provider_config = ImageProviderConfig::from_env();
    let image_timeout = provider_config.timeout;
    let provider = OpenAIImageProvider::from_config(&provider_config).map_err(|e| {
        ApiError::internal_error(format!("Image provider configuration error: {}", e))
    })?;
    tracing::info!(config = ?provider_config, "Image provider configured");

    let state = AppState::new(
        store,
        Arc::new(provider),
        Arc::new(JwtIdentityProvider::new(auth_config)),
        image_timeout,
    );
    let app: Router = create_api_router(state, &api_config, telemetry_config.metrics_enabled);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Planforge API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    telemetry.shutdown();
    Ok(())
}

async fn connect_store(backend: StoreBackend) -> ApiResult<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Postgres => {
            let db_config = DbConfig::from_env();
            tracing::info!(config = ?db_config, "Connecting to PostgreSQL");
            let store = PgStore::from_config(&db_config)?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
