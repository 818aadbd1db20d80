// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use campus_api::auth::TokenService;
use campus_config::{CampusConfig, SecretValue};

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::api_config;

/// Validates the loaded configuration and its key pair.
///
/// Parsing and field validation already happened in the loader; this also
/// loads both keys and builds a token service from them.
pub fn validate(cli: &Cli, config: &CampusConfig, args: ValidateArgs) -> BinResult<()> {
    let api = api_config(config)?;
    TokenService::new(api.jwt).map_err(|e| BinError::from(e).with_context("checking signing keys"))?;

    let warnings = warnings(config);
    let shown = redacted(config);

    match args.format {
        OutputFormat::Text => {
            println!("Configuration is valid: {}", cli.config.display());
            println!();
            println!("Summary:");
            println!("  Listen:       {}", config.server.socket_addr());
            println!("  Algorithm:    {}", config.jwt.algorithm);
            println!("  Issuer:       {}", config.jwt.issuer);
            println!(
                "  Token TTLs:   access {}s, refresh {}s",
                config.jwt.access_ttl_secs, config.jwt.refresh_ttl_secs
            );
            println!("  Grace:        {}s", config.revocation.grace_secs);
            println!(
                "  Cookies:      {} on {}, {} on {}",
                config.cookies.access_name,
                config.cookies.access_path,
                config.cookies.refresh_name,
                config.cookies.refresh_path
            );
            println!(
                "  Demo users:   {}",
                if config.identity.seed_demo { "enabled" } else { "disabled" }
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ! {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", to_pretty(&serde_json::to_value(&shown)?)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": cli.config.display().to_string(),
                "summary": {
                    "listen": config.server.socket_addr().to_string(),
                    "algorithm": config.jwt.algorithm.as_str(),
                    "issuer": config.jwt.issuer,
                    "access_ttl_secs": config.jwt.access_ttl_secs,
                    "refresh_ttl_secs": config.jwt.refresh_ttl_secs,
                    "grace_secs": config.revocation.grace_secs,
                    "seed_demo": config.identity.seed_demo,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(serde_json::to_value(&shown)?) } else { None },
            });
            println!("{}", to_pretty(&output)?);
        }
    }

    Ok(())
}

/// Settings that load fine but are unwise outside development.
pub(crate) fn warnings(config: &CampusConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.identity.seed_demo {
        warnings.push("Demo accounts with well-known passwords are enabled".to_string());
    }
    if !config.cookies.secure {
        warnings.push("Token cookies are sent without the Secure flag".to_string());
    }
    if config.jwt.private_key.pem.is_some() {
        warnings.push("The private key is inline in the configuration file".to_string());
    }
    if config.server.cors.allowed_origins.iter().any(|o| o == "*") && config.server.cors.allow_credentials {
        warnings.push("Any origin may send credentialed requests".to_string());
    }

    warnings
}

/// Copy of the configuration with inline secrets masked.
pub(crate) fn redacted(config: &CampusConfig) -> CampusConfig {
    let mut shown = config.clone();
    if shown.jwt.private_key.pem.is_some() {
        shown.jwt.private_key.pem = Some(SecretValue::new("***"));
    }
    shown
}

fn to_pretty(value: &serde_json::Value) -> BinResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

// =============================================================================
// Tests
// =============================================================================
