// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! The full router over demo data, driven in-process with
//! `tower::ServiceExt::oneshot`. The revocation cache runs on a
//! [`ManualClock`] so grace windows can be crossed without sleeping; token
//! signatures and expiry still use wall time.

use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_api::auth::{ExpiringStore, ManualClock};
use campus_api::catalog::CourseCatalog;
use campus_api::{ApiConfig, ApiServer, AppState};
use campus_core::IdentityStore;

use super::builders::TestRequest;
use super::fixtures::{api_config, demo_identities, DemoUser};
use super::init_test_logging;

// =============================================================================
// TestApp
// =============================================================================

/// An application under test.
pub struct TestApp {
    /// Application state, for reaching services directly.
    pub state: AppState,
    /// Clock driving the revocation cache.
    pub clock: Arc<ManualClock>,
    router: Router,
}

impl TestApp {
    /// Demo accounts, demo courses, default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts a customised application.
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder::default()
    }

    /// Sends a request through the full middleware stack.
    pub async fn send(&self, request: TestRequest) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request.build())
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, headers, body }
    }

    /// Logs in over HTTP and returns the issued pair.
    pub async fn login(&self, user: DemoUser) -> Tokens {
        let response = self
            .send(TestRequest::post("/login").json(json!({ "email": user.email, "password": user.password })))
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        Tokens::from_body(&response.body)
    }

    /// Moves the revocation clock forward.
    pub fn advance(&self, secs: i64) {
        self.clock.advance(secs);
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TestAppBuilder
// =============================================================================

/// Builder for [`TestApp`].
#[derive(Default)]
pub struct TestAppBuilder {
    config: Option<ApiConfig>,
    identities: Option<Arc<dyn IdentityStore>>,
    revocation_store: Option<Arc<dyn ExpiringStore>>,
    clock: Option<Arc<ManualClock>>,
}

impl TestAppBuilder {
    /// Replaces the API settings.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the identity store.
    pub fn identities(mut self, identities: Arc<dyn IdentityStore>) -> Self {
        self.identities = Some(identities);
        self
    }

    /// Replaces the revocation backend.
    pub fn revocation_store(mut self, store: Arc<dyn ExpiringStore>) -> Self {
        self.revocation_store = Some(store);
        self
    }

    /// Shares an existing clock, e.g. with a custom revocation backend.
    pub fn clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the application.
    pub fn build(self) -> TestApp {
        init_test_logging();

        let clock = self.clock.unwrap_or_else(|| Arc::new(ManualClock::starting_now()));
        let identities = self
            .identities
            .unwrap_or_else(|| demo_identities() as Arc<dyn IdentityStore>);

        let mut builder = AppState::builder()
            .config(self.config.unwrap_or_else(api_config))
            .identities(identities)
            .clock(clock.clone())
            .courses(Arc::new(CourseCatalog::seed_demo()));
        if let Some(store) = self.revocation_store {
            builder = builder.revocation_store(store);
        }

        let state = builder.build().expect("application state");
        let router = ApiServer::new(state.clone()).router();

        TestApp { state, clock, router }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// A token pair as returned by `/login` and `/refresh-token`.
#[derive(Debug, Clone)]
pub struct Tokens {
    /// Access token.
    pub access: String,
    /// Refresh token.
    pub refresh: String,
}

impl Tokens {
    /// Reads the pair from a response body.
    pub fn from_body(body: &Value) -> Self {
        Self {
            access: body["accessToken"].as_str().expect("accessToken").to_string(),
            refresh: body["refreshToken"].as_str().expect("refreshToken").to_string(),
        }
    }
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// JSON body, `Null` when empty.
    pub body: Value,
}

impl TestResponse {
    /// Raw `Set-Cookie` values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// The full `Set-Cookie` line for a cookie name.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies().into_iter().find(|c| c.starts_with(&prefix))
    }

    /// The value a `Set-Cookie` line assigns.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookie(name).map(|line| {
            let pair = line.split(';').next().unwrap_or_default();
            pair[name.len() + 1..].to_string()
        })
    }

    /// The error code of an error body.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}
