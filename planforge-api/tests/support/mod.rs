//! Shared harness for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use planforge_api::{
    create_api_router, generate_jwt_token, ApiConfig, AppState, AuthConfig, JwtIdentityProvider,
    JwtSecret,
};
use planforge_storage::InMemoryStore;
use planforge_test_utils::fixtures;
use planforge_test_utils::FakeImageProvider;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "planforge-test-secret-with-at-least-32-chars";
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

pub fn test_auth_config() -> AuthConfig {
    let secret = JwtSecret::new(TEST_SECRET.to_string())
        .unwrap_or_else(|_| unreachable!("test secret is not blank"));
    AuthConfig::with_secret(secret)
}

/// A router over an in-memory store and a fake image provider.
pub struct TestApp {
    pub router: Router,
    pub store: InMemoryStore,
    pub provider: FakeImageProvider,
    pub auth: AuthConfig,
}

impl TestApp {
    pub fn new(store: InMemoryStore, provider: FakeImageProvider) -> Self {
        Self::with_timeout(store, provider, IMAGE_TIMEOUT)
    }

    pub fn with_timeout(
        store: InMemoryStore,
        provider: FakeImageProvider,
        image_timeout: Duration,
    ) -> Self {
        let auth = test_auth_config();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(provider.clone()),
            Arc::new(JwtIdentityProvider::new(auth.clone())),
            image_timeout,
        );
        let router = create_api_router(state, &ApiConfig::default(), true);

        Self {
            router,
            store,
            provider,
            auth,
        }
    }

    /// Token for the fixture user.
    pub fn token(&self) -> String {
        generate_jwt_token(&self.auth, fixtures::test_user().as_str())
            .unwrap_or_else(|e| panic!("token generation failed: {}", e.message))
    }

    pub async fn post_raw(
        &self,
        path: &str,
        body: &str,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("request builds");
        self.send(request).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        self.post_raw(path, &body.to_string(), token).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).expect("request builds");
        self.send(request).await
    }

    /// Raw text body, for endpoints that do not answer in JSON.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request builds");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, body)
    }
}
