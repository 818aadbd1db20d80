// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus Integration Tests
//!
//! Shared fixtures and an in-process HTTP harness for the integration
//! suites under `tests/`.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Key pairs, demo accounts and configuration text
//!   - `builders`: Request builder for the router
//!   - `assertions`: Response assertions
//!   - `mocks`: Failing store implementations
//!   - `harness`: [`TestApp`](common::harness::TestApp), a router plus a
//!     manual revocation clock
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p campus-tests
//! cargo test -p campus-tests --test integration_api
//! cargo test -p campus-tests -- --nocapture
//! ```
//!
//! ## Test Suites
//!
//! - `integration_ability.rs`: role rules, instance checks, field sets and
//!   row filter compilation
//! - `integration_auth.rs`: token issuance, rotation, grace windows and
//!   revocation through the auth service
//! - `integration_api.rs`: the HTTP surface end to end, including forged
//!   tokens at the gatekeeper
//! - `integration_config.rs`: configuration files through to a running
//!   application state
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use campus_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new();
//!     let tokens = app.login(TEACHER1).await;
//!     let response = app.send(TestRequest::get("/courses").bearer(&tokens.access)).await;
//!     assert_status(&response, StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::{init_test_logging, temp_test_dir};
    pub use axum::http::StatusCode;
}
