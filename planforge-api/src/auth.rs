//! Authentication Module
//!
//! Resolves the caller identity for a request. Authentication itself is an
//! outside capability: the server only needs to know *who* is calling, and
//! consumes that through the [`IdentityProvider`] trait. The default provider
//! validates `Authorization: Bearer <JWT>` headers signed with HS256, where
//! the `sub` claim is the user id.

use crate::error::{ApiError, ApiResult};
use ::async_trait::async_trait;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use planforge_core::{ConfigError, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock used for token time checks.
///
/// Token expiry is checked here rather than inside `jsonwebtoken` so tests
/// can pin the time.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds. Negative for pre-1970 clocks.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// JWT SECRET
// ============================================================================

/// JWT signing secret that never shows up in logs.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Create a new JWT secret. Empty secrets are rejected.
    pub fn new(secret: String) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "jwt_secret".to_string(),
            });
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// The development fallback secret.
    pub fn insecure_default() -> Self {
        Self(SecretString::new(INSECURE_DEFAULT_SECRET.to_string().into()))
    }

    /// Expose the secret value for signing and verification only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWT secret key for signing and verification
    pub jwt_secret: JwtSecret,

    /// JWT algorithm (HS256)
    pub jwt_algorithm: Algorithm,

    /// Lifetime of issued tokens in seconds (default: 1 hour)
    pub jwt_expiration_secs: i64,

    /// Tolerated clock drift in seconds when checking `exp` (default: 60)
    pub jwt_clock_skew_secs: i64,

    /// Clock for token time checks
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: JwtSecret::insecure_default(),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiration_secs: 3600,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create a configuration signing with `secret`.
    pub fn with_secret(secret: JwtSecret) -> Self {
        Self {
            jwt_secret: secret,
            ..Default::default()
        }
    }

    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `PLANFORGE_JWT_SECRET`: JWT signing secret
    /// - `PLANFORGE_JWT_EXPIRATION_SECS`: token lifetime (default: 3600)
    /// - `PLANFORGE_JWT_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = std::env::var("PLANFORGE_JWT_SECRET")
            .ok()
            .and_then(|s| JwtSecret::new(s).ok())
            .unwrap_or(defaults.jwt_secret);

        Self {
            jwt_secret,
            jwt_expiration_secs: std::env::var("PLANFORGE_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_expiration_secs),
            jwt_clock_skew_secs: std::env::var("PLANFORGE_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_clock_skew_secs),
            ..defaults
        }
    }

    /// Check the secret at startup.
    ///
    /// Production refuses the insecure default and short secrets; development
    /// only warns.
    pub fn validate_for_production(&self, production: bool) -> ApiResult<()> {
        if self.jwt_secret.is_insecure_default() {
            if production {
                return Err(ApiError::internal_error(
                    "Cannot start in production with the insecure default JWT secret. \
                     Set PLANFORGE_JWT_SECRET.",
                ));
            }
            tracing::warn!(
                "Using the insecure default JWT secret. Set PLANFORGE_JWT_SECRET before deploying."
            );
            return Ok(());
        }

        if self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            if production {
                return Err(ApiError::internal_error(format!(
                    "JWT secret is too short for production use ({} chars, need {}).",
                    self.jwt_secret.len(),
                    MIN_PRODUCTION_SECRET_LEN
                )));
            }
            tracing::warn!(
                length = self.jwt_secret.len(),
                "JWT secret is short; use at least 32 characters in production"
            );
        }

        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims. `sub` carries the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, expiration_secs: i64, clock: &dyn JwtClock) -> Self {
        let now = clock.now_epoch_secs();
        Self {
            sub: user_id.into(),
            iat: now,
            exp: now + expiration_secs,
        }
    }
}

/// Validate a token signature and return its claims.
///
/// Signature checking is left to `jsonwebtoken`; expiry is checked against
/// `config.clock` with `jwt_clock_skew_secs` of leeway.
pub fn validate_jwt_token(config: &AuthConfig, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.expose().as_bytes());

    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?
        .claims;

    let now = config.clock.now_epoch_secs();
    if now < 0 {
        tracing::error!(timestamp = now, "System clock returned pre-epoch time");
        return Err(ApiError::internal_error("Server time configuration error"));
    }

    if claims.exp < now - config.jwt_clock_skew_secs {
        return Err(ApiError::token_expired());
    }

    Ok(claims)
}

/// Issue a token for `user_id`.
pub fn generate_jwt_token(config: &AuthConfig, user_id: &str) -> ApiResult<String> {
    let claims = Claims::new(user_id, config.jwt_expiration_secs, &*config.clock);
    let encoding_key = EncodingKey::from_secret(config.jwt_secret.expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ============================================================================
// IDENTITY PROVIDER
// ============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
}

/// Source of caller identities.
///
/// Returns `None` whenever no caller can be established; the handler turns
/// that into a 401.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn identify(&self, headers: &HeaderMap) -> Option<CallerIdentity>;
}

/// [`IdentityProvider`] backed by HS256 bearer tokens.
#[derive(Debug, Clone)]
pub struct JwtIdentityProvider {
    config: AuthConfig,
}

impl JwtIdentityProvider {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn identify(&self, headers: &HeaderMap) -> Option<CallerIdentity> {
        let token = bearer_token(headers)?;
        match validate_jwt_token(&self.config, token) {
            Ok(claims) if !claims.sub.trim().is_empty() => Some(CallerIdentity {
                user_id: UserId::new(claims.sub),
            }),
            Ok(_) => {
                tracing::debug!("Rejected token without subject");
                None
            }
            Err(e) => {
                tracing::debug!(code = %e.code, "Rejected bearer token");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    // 2024-01-01 00:00:00 UTC
    const NOW: i64 = 1704067200;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: JwtSecret::new("test_secret".to_string()).expect("valid secret"),
            clock: Arc::new(FixedClock(NOW)),
            ..Default::default()
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(value).expect("header value"),
        );
        headers
    }

    #[test]
    fn test_jwt_round_trip() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, "user-123")?;
        let claims = validate_jwt_token(&config, &token)?;
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.iat, NOW);
        assert_eq!(claims.exp, NOW + 3600);
        Ok(())
    }

    #[test]
    fn test_expired_token() -> ApiResult<()> {
        let mut config = test_config();
        config.jwt_expiration_secs = 100;
        let token = generate_jwt_token(&config, "user-123")?;

        // Within skew.
        config.clock = Arc::new(FixedClock(NOW + 130));
        assert!(validate_jwt_token(&config, &token).is_ok());

        config.clock = Arc::new(FixedClock(NOW + 200));
        let err = validate_jwt_token(&config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
        Ok(())
    }

    #[test]
    fn test_wrong_secret_rejected() -> ApiResult<()> {
        let token = generate_jwt_token(&test_config(), "user-123")?;
        let other = AuthConfig {
            jwt_secret: JwtSecret::new("another_secret".to_string()).expect("valid secret"),
            ..test_config()
        };
        let err = validate_jwt_token(&other, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
        Ok(())
    }

    #[test]
    fn test_pre_epoch_clock_fails_loud() -> ApiResult<()> {
        let mut config = test_config();
        let token = generate_jwt_token(&config, "user-123")?;
        config.clock = Arc::new(FixedClock(-1000));
        let err = validate_jwt_token(&config, &token).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
        Ok(())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers_with("bearer  abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_identity_from_valid_token() -> ApiResult<()> {
        let config = test_config();
        let token = generate_jwt_token(&config, "user-123")?;
        let provider = JwtIdentityProvider::new(config);

        let identity = provider
            .identify(&headers_with(&format!("Bearer {}", token)))
            .await;
        assert_eq!(
            identity,
            Some(CallerIdentity {
                user_id: UserId::new("user-123")
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_no_identity_without_valid_token() -> ApiResult<()> {
        let config = test_config();
        let provider = JwtIdentityProvider::new(config.clone());
        assert!(provider.identify(&HeaderMap::new()).await.is_none());
        assert!(provider.identify(&headers_with("Bearer garbage")).await.is_none());

        let blank_subject = generate_jwt_token(&config, "  ")?;
        assert!(provider
            .identify(&headers_with(&format!("Bearer {}", blank_subject)))
            .await
            .is_none());
        Ok(())
    }

    #[test]
    fn test_production_secret_checks() {
        assert!(AuthConfig::default().validate_for_production(true).is_err());
        assert!(AuthConfig::default().validate_for_production(false).is_ok());

        let short = AuthConfig::with_secret(JwtSecret::new("short".to_string()).expect("valid"));
        assert!(short.validate_for_production(true).is_err());
        assert!(short.validate_for_production(false).is_ok());

        let strong = AuthConfig::with_secret(
            JwtSecret::new("a-production-secret-of-at-least-32-chars".to_string()).expect("valid"),
        );
        assert!(strong.validate_for_production(true).is_ok());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let secret = JwtSecret::new("super-secret-value".to_string()).expect("valid");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("super-secret-value"));
        assert!(JwtSecret::new("   ".to_string()).is_err());
    }
}
