// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-api
//!
//! Token lifecycle and HTTP boundary for campus.
//!
//! - [`auth`]: signed access/refresh tokens, the revocation cache and the
//!   login/refresh/logout service
//! - [`middleware`]: the request gatekeeper and the ability guard
//! - [`server`]: the axum router and server loop
//!
//! # Example
//!
//! ```rust,ignore
//! use campus_api::{ApiConfig, ApiServer, AppState};
//! use campus_api::auth::JwtConfig;
//!
//! let state = AppState::builder()
//!     .config(ApiConfig::new(JwtConfig::new(private_pem, public_pem)))
//!     .build()?;
//! ApiServer::new(state).run_with_shutdown(shutdown).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod cookies;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;

pub use config::{ApiConfig, CookieConfig, CorsConfig, SameSite};
pub use error::{ApiError, ApiResult};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
