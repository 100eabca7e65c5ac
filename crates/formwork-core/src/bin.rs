/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Thin process entry point for `formwork-core`.
//!
//! Parses a couple of subcommands and hands off to `cli::commands`. The
//! HTTP surface, admin UI, and authentication are external collaborators
//! not built here.

use formwork_core::cli::{commands, parse_cli, Commands};
use formwork_utils::config::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_cli();

    let config = Settings::new(None).expect("Failed to load configuration");

    let telemetry_config = config.telemetry.resolve("formwork-core");
    formwork_utils::telemetry::init(&telemetry_config, &config.log.level, &config.log.format)
        .expect("Failed to initialize telemetry");

    match cli.command {
        Commands::Serve => commands::serve(&config).await?,
        Commands::Migrate => commands::migrate(&config)?,
    }

    formwork_utils::telemetry::shutdown();

    Ok(())
}
