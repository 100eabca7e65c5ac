/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Background tasks for the Formwork core.
//!
//! This module contains background tasks that run periodically to maintain
//! system health and cleanup expired data.

use crate::dal::DAL;
use crate::webhook_delivery::WebhookDeliveryEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Configuration for the webhook delivery worker.
pub struct WebhookDeliveryConfig {
    /// Channel buffer size for queued dispatch requests.
    pub channel_size: usize,
}

impl Default for WebhookDeliveryConfig {
    fn default() -> Self {
        Self { channel_size: 1000 }
    }
}

/// A pending dispatch request: an event name plus its payload.
pub struct DispatchRequest {
    pub event: String,
    pub data: serde_json::Value,
}

/// Starts the webhook delivery worker: a channel the Content Storage
/// Service and Blueprint Engine can push fired events into, drained by a
/// task that runs `WebhookDeliveryEngine::dispatch` for each one.
///
/// Returns a sender; dropping every clone of it stops the worker.
pub fn start_webhook_delivery_worker(
    engine: Arc<WebhookDeliveryEngine>,
    config: WebhookDeliveryConfig,
) -> mpsc::Sender<DispatchRequest> {
    let (sender, mut receiver) = mpsc::channel::<DispatchRequest>(config.channel_size);

    tokio::spawn(async move {
        info!("Webhook delivery worker started (buffer: {})", config.channel_size);

        while let Some(request) = receiver.recv().await {
            debug!("Dispatching event {} to matching webhooks", request.event);
            engine.dispatch(&request.event, request.data).await;
        }

        info!("Webhook delivery worker stopped - channel closed");
    });

    sender
}

/// Configuration for the delivery-retention cleanup task.
pub struct DeliveryCleanupConfig {
    /// How often to run the cleanup (in seconds).
    pub interval_seconds: u64,
    /// Maximum age for completed delivery rows before deletion (in days).
    pub retention_days: i64,
}

impl Default for DeliveryCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // 1 hour
            retention_days: 30,
        }
    }
}

/// Starts the delivery-retention cleanup background task.
///
/// Periodically deletes completed webhook delivery rows older than the
/// retention window, so the append-only `webhook_deliveries` table doesn't
/// grow unbounded.
///
/// # Arguments
/// * `dal` - The Data Access Layer instance
/// * `config` - Configuration for the cleanup task
pub fn start_delivery_cleanup_task(dal: DAL, config: DeliveryCleanupConfig) {
    info!(
        "Starting delivery cleanup task (interval: {}s, retention: {}d)",
        config.interval_seconds, config.retention_days
    );

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(config.interval_seconds));

        loop {
            ticker.tick().await;

            match dal.webhook_deliveries().cleanup_old(config.retention_days) {
                Ok(deleted) => {
                    if deleted > 0 {
                        info!(
                            "Cleaned up {} old webhook delivery rows (age > {}d)",
                            deleted, config.retention_days
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to cleanup old webhook deliveries: {:?}", e);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delivery_cleanup_config() {
        let config = DeliveryCleanupConfig::default();
        assert_eq!(config.interval_seconds, 3600);
        assert_eq!(config.retention_days, 30);
    }

    #[test]
    fn test_default_webhook_delivery_config() {
        let config = WebhookDeliveryConfig::default();
        assert_eq!(config.channel_size, 1000);
    }
}
