// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-config
//!
//! Configuration management for the campus authentication server.
//!
//! ## Features
//!
//! - **Schema Definition**: every section has defaults and validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `${VAR:default}` placeholders and `CAMPUS_*` variables
//! - **Key Material**: PEM keys from files or inline, symmetric algorithms refused
//!
//! ## Quick Start
//!
//! ```no_run
//! use campus_config::loader::load_config;
//!
//! let config = load_config("campus.yaml").unwrap();
//! println!("Listening on {}", config.server.socket_addr());
//! ```
//!
//! ## Configuration Schema
//!
//! - `server` - bind address, timeouts and CORS
//! - `jwt` - algorithm, key material, issuer and token lifetimes
//! - `revocation` - grace window and sweep interval
//! - `cookies` - token cookie names, paths and attributes
//! - `identity` - demo accounts and an optional users file
//! - `logging` - level and output format

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    CampusConfig, CookieConfig, CorsConfig, IdentityConfig, JwtAlgorithm, JwtConfig, KeySource,
    LogFormat, LogLevel, LoggingConfig, RevocationConfig, SameSite, SecretValue, SeedUser,
    SeedUsers, ServerConfig,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Tests
// =============================================================================
