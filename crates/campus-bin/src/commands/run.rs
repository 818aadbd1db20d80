// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use campus_config::CampusConfig;
use tracing::debug;

use crate::cli::RunArgs;
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Starts the server and blocks until shutdown.
pub async fn run(config: CampusConfig, args: RunArgs) -> BinResult<()> {
    let seed_demo = config.identity.seed_demo && !args.no_demo;
    debug!(port = ?args.port, seed_demo, "Preparing runtime");

    let runtime = RuntimeBuilder::new()
        .config(config)
        .port(args.port)
        .seed_demo(seed_demo)
        .build()?;

    runtime.run().await
}
