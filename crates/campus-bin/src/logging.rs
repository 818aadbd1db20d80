// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{LogFormat, LogSettings};
use crate::error::{BinError, BinResult};

/// Directives appended to the chosen level to quiet the HTTP stack.
const DEPENDENCY_DIRECTIVES: &str = "hyper=warn,tower=warn,tower_http=info,axum=info";

// =============================================================================
// Logging Initialization
// =============================================================================

/// Initializes the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LogSettings) -> BinResult<()> {
    let filter = build_filter(&settings.level)?;

    let result = match settings.format {
        LogFormat::Text => {
            let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_ansi(is_terminal))
                .try_init()
        }
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
        LogFormat::Compact => {
            let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(false).with_ansi(is_terminal))
                .try_init()
        }
    };

    result.map_err(|e| BinError::init(format!("Failed to install logger: {}", e)))
}

/// Builds the level filter, preferring `RUST_LOG`.
fn build_filter(level: &str) -> BinResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(format!("{},{}", level.trim().to_lowercase(), DEPENDENCY_DIRECTIVES))
        .map_err(|e| BinError::config(format!("Invalid log level '{}': {}", level, e)))
}

// =============================================================================
// Tests
// =============================================================================
