// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the campus binary.

use thiserror::Error;

/// Result type alias for campus-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the campus binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// A forged token was accepted.
    #[error("Forged token accepted: {0}")]
    Vulnerable(String),

    /// API error.
    #[error("API error: {0}")]
    Api(#[from] campus_api::ApiError),

    /// Authentication error.
    #[error("Authentication failed: {0}")]
    Auth(#[from] campus_api::auth::AuthError),

    /// Token error.
    #[error("Token error: {0}")]
    Token(#[from] campus_api::auth::TokenError),

    /// Config parsing error.
    #[error("Config error: {0}")]
    Config(#[from] campus_config::ConfigError),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] campus_core::CoreError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Initialization(_) | Self::Core(_) => 2,
            Self::Runtime(_) | Self::Api(_) => 3,
            Self::Io(_) => 4,
            Self::Auth(_) | Self::Token(_) => 5,
            Self::Vulnerable(_) => 6,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{:#}", err))
    }
}

impl From<serde_json::Error> for BinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Runtime(format!("JSON error: {}", err))
    }
}

impl From<campus_core::StoreError> for BinError {
    fn from(err: campus_core::StoreError) -> Self {
        Self::Core(err.into())
    }
}

impl From<campus_core::AbilityError> for BinError {
    fn from(err: campus_core::AbilityError) -> Self {
        Self::Core(err.into())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================
