/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Process wiring for the `formwork-core` library.
//!
//! Schema provisioning, the HTTP surface, and authentication are external
//! collaborators; this module only opens the database, bootstraps the
//! admin account on first run, registers built-in field kinds, and starts
//! the background workers described in the core's process-wiring section.

use crate::dal::DAL;
use crate::db::create_shared_connection_pool;
use crate::fields::FieldRegistry;
use crate::hooks::HookOrchestrator;
use crate::migration_runner::MigrationRunner;
use crate::plugins::PluginManager;
use crate::utils;
use crate::utils::background_tasks::{
    start_delivery_cleanup_task, start_webhook_delivery_worker, DeliveryCleanupConfig, WebhookDeliveryConfig,
};
use crate::webhook_delivery::{RetryPolicy, WebhookDeliveryEngine};
use formwork_utils::config::Settings;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Opens the database, bootstraps the admin account on first run, wires up
/// the core components, and starts the background workers. Blocks until
/// interrupted — there is no HTTP surface to serve here, that's the
/// external collaborator's job.
pub async fn serve(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting formwork-core");

    info!("Creating database connection pool");
    let connection_pool = create_shared_connection_pool(
        &config.database.url,
        "formwork",
        config.database.max_pool_size,
        config.database.schema.as_deref(),
    );

    if let Some(ref schema) = config.database.schema {
        info!("Setting up schema: {}", schema);
        connection_pool.setup_schema(schema)?;
    }

    let dal = DAL::new(connection_pool);

    info!("Checking for first-time startup");
    utils::first_startup(&dal, config)?;

    info!("Registering built-in field kinds");
    let registry = Arc::new(FieldRegistry::with_builtins());

    info!("Starting Hook Orchestrator");
    let hooks = Arc::new(HookOrchestrator::new());

    info!("Starting Plugin Manager");
    let _plugin_manager = PluginManager::new(dal.clone(), hooks.clone(), registry.clone());
    for plugin_id in &config.plugin.enabled {
        info!(
            "Plugin '{}' is enabled in configuration; loading it is the host process's responsibility \
             (it owns the compiled plugin's manifest and lifecycle callbacks)",
            plugin_id
        );
    }

    info!("Starting Webhook Delivery Engine");
    let retry_policy = RetryPolicy {
        max_retries: config.webhook.max_retries as u32,
        initial_delay_ms: config.webhook.initial_backoff_ms,
        multiplier: config.webhook.backoff_multiplier,
        max_delay_ms: config.webhook.max_backoff_ms,
    };
    let delivery_engine = Arc::new(WebhookDeliveryEngine::new(dal.clone(), hooks.clone(), retry_policy)?);

    info!("Starting background workers");
    let _dispatch_sender = start_webhook_delivery_worker(delivery_engine, WebhookDeliveryConfig::default());
    start_delivery_cleanup_task(
        dal.clone(),
        DeliveryCleanupConfig {
            interval_seconds: 3600,
            retention_days: config.webhook.retention_days,
        },
    );

    info!("formwork-core is ready");
    signal::ctrl_c().await?;
    info!("Shutdown signal received");

    Ok(())
}

/// Applies every pending content-level data migration and exits.
pub fn migrate(config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let connection_pool = create_shared_connection_pool(
        &config.database.url,
        "formwork",
        1,
        config.database.schema.as_deref(),
    );
    let dal = DAL::new(connection_pool);
    let runner = MigrationRunner::new(dal);

    let report = runner.migrate(true, true)?;
    info!("Applied {} migration(s), {} error(s)", report.applied.len(), report.errors.len());
    for (id, error) in &report.errors {
        tracing::error!("migration {} failed: {}", id, error);
    }

    Ok(())
}
