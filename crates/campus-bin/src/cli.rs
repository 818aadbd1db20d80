// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the server (default)
//! - `validate`: Validate the configuration file
//! - `version`: Show version information
//! - `token issue|inspect`: Issue or inspect tokens offline
//! - `attack none|alg-confusion`: Forge tokens and check they are refused

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// campus - token authentication and rule-based authorization server
#[derive(Parser, Debug)]
#[command(
    name = "campus",
    author = "Sylvex <contact@sylvex.io>",
    version = campus_core::VERSION,
    about = "Token authentication and rule-based authorization server",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "campus.yaml",
        env = "CAMPUS_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Defaults to the config file.
    #[arg(short, long, env = "CAMPUS_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format. Defaults to the config file.
    #[arg(long, env = "CAMPUS_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the server
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Validate the configuration file
    ///
    /// Loads the configuration and the signing keys without starting the server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,

    /// Issue or inspect tokens without a running server
    Token(TokenArgs),

    /// Forge a token with a classic JWT attack and check it is refused
    Attack(AttackArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not seed the demo accounts
    #[arg(long)]
    pub no_demo: bool,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `token` command.
#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// Token operation
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token operations.
#[derive(Subcommand, Debug, Clone)]
pub enum TokenCommand {
    /// Log in against the configured accounts and print the token pair
    Issue {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Verify a token and print its claims
    Inspect {
        /// The token
        token: String,
    },
}

/// Arguments for the `attack` command.
#[derive(Args, Debug, Clone)]
pub struct AttackArgs {
    /// Attack to attempt
    pub kind: AttackKind,

    /// A genuine access token to tamper with
    #[arg(short, long)]
    pub token: String,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<campus_config::LogFormat> for LogFormat {
    fn from(format: campus_config::LogFormat) -> Self {
        match format {
            campus_config::LogFormat::Text => LogFormat::Text,
            campus_config::LogFormat::Json => LogFormat::Json,
            campus_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// Forgery attempted by `attack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AttackKind {
    /// Unsigned token with `alg: none`
    None,
    /// HS256 token keyed with the public key
    AlgConfusion,
}

// =============================================================================
// Helper Methods
// =============================================================================

/// Effective logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Resolves logging settings: flags, then the config file, then `info`/text.
    pub fn log_settings(&self, file: Option<&campus_config::LoggingConfig>) -> LogSettings {
        let level = if self.quiet {
            "warn".to_string()
        } else if self.verbose {
            "debug".to_string()
        } else if let Some(level) = &self.log_level {
            level.clone()
        } else {
            file.map(|l| l.level.as_str()).unwrap_or("info").to_string()
        };

        let format = self
            .log_format
            .or_else(|| file.map(|l| l.format.into()))
            .unwrap_or_default();

        LogSettings { level, format }
    }
}

// =============================================================================
// Tests
// =============================================================================
