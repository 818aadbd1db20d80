// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: Start the server
//! - `validate`: Validate the configuration file
//! - `version`: Show version information
//! - `token`: Issue or inspect tokens
//! - `attack`: Forge tokens and check they are refused

mod attack;
mod run;
mod token;
mod validate;
mod version;

pub use attack::{attack, forge};
pub use run::run;
pub use token::{inspect, issue};
pub use validate::validate;
pub use version::version;

use campus_config::ConfigLoader;

use crate::cli::{Cli, Commands, TokenCommand};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;

/// Executes the appropriate command based on CLI arguments.
///
/// Logging is installed once, using the config file's settings when the file
/// loads and the flags alone otherwise.
pub async fn execute(cli: Cli) -> BinResult<()> {
    let command = cli.effective_command();

    if let Commands::Version = command {
        init_logging(&cli.log_settings(None))?;
        return version::version(&cli);
    }

    let loaded = ConfigLoader::new().load(&cli.config);
    init_logging(&cli.log_settings(loaded.as_ref().ok().map(|c| &c.logging)))?;
    let config = loaded.map_err(|e| BinError::from(e).with_context(format!("loading {}", cli.config.display())))?;

    match command {
        Commands::Run(args) => run::run(config, args).await,
        Commands::Validate(args) => validate::validate(&cli, &config, args),
        Commands::Token(args) => match args.command {
            TokenCommand::Issue { email, password } => token::issue(&config, &email, &password).await,
            TokenCommand::Inspect { token } => token::inspect(&config, &token).await,
        },
        Commands::Attack(args) => attack::attack(&config, args).await,
        Commands::Version => version::version(&cli),
    }
}
