//! API Configuration Module
//!
//! CORS, bind address and deployment environment for the HTTP server.
//! Configuration is loaded from environment variables with defaults suited
//! to local development.

use crate::error::{ApiError, ApiResult};
use std::net::SocketAddr;

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Deployment environment, read from `PLANFORGE_ENVIRONMENT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse an environment name. Anything but `production`/`prod` is development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("PLANFORGE_ENVIRONMENT")
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

// ============================================================================
// STORE BACKEND
// ============================================================================

/// Which store the server runs against, read from `PLANFORGE_STORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store; contents are lost on restart.
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> ApiResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(ApiError::internal_error(format!(
                "Unknown store backend '{}' (expected postgres or memory)",
                other
            ))),
        }
    }

    pub fn from_env() -> ApiResult<Self> {
        match std::env::var("PLANFORGE_STORE") {
            Ok(value) => Self::parse(&value),
            Err(_) => Ok(Self::default()),
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and the listening socket.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Host the server binds to.
    pub bind_host: String,

    /// Port the server listens on.
    pub port: u16,

    pub environment: Environment,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Development,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PLANFORGE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PLANFORGE_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `PLANFORGE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PLANFORGE_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `PLANFORGE_API_PORT`: Listening port (default: 3000)
    /// - `PLANFORGE_ENVIRONMENT`: "production" enables strict checks
    ///
    /// Fails only when a port is set but unparseable.
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let cors_origins = std::env::var("PLANFORGE_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("PLANFORGE_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(false);

        let cors_max_age_secs = std::env::var("PLANFORGE_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let bind_host = std::env::var("PLANFORGE_API_BIND").unwrap_or(defaults.bind_host);

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("PLANFORGE_API_PORT").ok())
        {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::internal_error(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        Ok(Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            bind_host,
            port,
            environment: Environment::from_env(),
        })
    }

    /// Socket address assembled from `bind_host` and `port`.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Refuse to run in production with permissive CORS.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        if self.environment.is_production() && self.cors_origins.is_empty() {
            return Err(ApiError::internal_error(
                "CORS origins not configured for production. Set PLANFORGE_CORS_ORIGINS.",
            ));
        }
        Ok(())
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain.ends_with(&format!(".{}", pattern));
                }
            }
            false
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_bind_addr() {
        let config = ApiConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        let addr = config.bind_addr().expect("valid address");
        assert_eq!(addr.to_string(), "127.0.0.1:8080");

        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse(" PROD "), Environment::Production);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn test_store_backend_parse() -> ApiResult<()> {
        assert_eq!(StoreBackend::parse("memory")?, StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("Postgres")?, StoreBackend::Postgres);
        assert!(StoreBackend::parse("mongo").is_err());
        Ok(())
    }

    #[test]
    fn test_production_requires_origins() {
        let mut config = ApiConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(config.validate_for_production().is_err());

        config.cors_origins = vec!["https://planforge.app".to_string()];
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_origin_allowed() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:3000"));

        let config = ApiConfig {
            cors_origins: parse_origins("https://planforge.app, *.planforge.app,"),
            ..Default::default()
        };
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.is_origin_allowed("https://planforge.app"));
        assert!(config.is_origin_allowed("https://studio.planforge.app"));
        assert!(!config.is_origin_allowed("https://notplanforge.app"));
        assert!(!config.is_origin_allowed("https://evil.com"));
    }
}
