// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # campus-bin
//!
//! Command line entry point for the campus auth service.
//!
//! - CLI argument parsing with clap
//! - Server runtime orchestration
//! - Graceful shutdown handling
//! - Logging initialization
//! - Offline token tooling (`token`, `attack`)
//!
//! ## Architecture
//!
//! ```text
//!                      main.rs
//!                         │
//!                      cli.rs
//!                         │
//!             ┌───────────┼───────────┐
//!             ▼           ▼           ▼
//!         commands     runtime     logging
//!                         │
//!                      shutdown
//!                         │
//!          campus-api / campus-config / campus-core
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! campus -c campus.yaml
//!
//! # Validate configuration and keys
//! campus validate --show-config
//!
//! # Log in as a demo account and print the tokens
//! campus token issue -e teacher1@user.com -p teacher1
//!
//! # Check that an unsigned forgery is refused
//! campus attack none --token <access-token>
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{RuntimeBuilder, ServerRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownReason, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
