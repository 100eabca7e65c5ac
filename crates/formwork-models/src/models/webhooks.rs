/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Webhook models for event notifications.
//!
//! This module provides models for webhook registrations and deliveries,
//! enabling external systems to receive notifications when content and
//! blueprint events occur. Deliveries are append-only: a retried attempt
//! produces a fresh row rather than mutating the prior one (see
//! `formwork-core::webhooks`).

use crate::schema::{webhook_deliveries, webhooks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Event Type Constants
// =============================================================================

pub const EVENT_CONTENT_AFTER_CREATE: &str = "content:afterCreate";
pub const EVENT_CONTENT_AFTER_UPDATE: &str = "content:afterUpdate";
pub const EVENT_CONTENT_AFTER_PUBLISH: &str = "content:afterPublish";
pub const EVENT_CONTENT_AFTER_UNPUBLISH: &str = "content:afterUnpublish";
pub const EVENT_CONTENT_AFTER_DELETE: &str = "content:afterDelete";

pub const EVENT_BLUEPRINT_AFTER_CREATE: &str = "blueprint:afterCreate";
pub const EVENT_BLUEPRINT_AFTER_UPDATE: &str = "blueprint:afterUpdate";
pub const EVENT_BLUEPRINT_AFTER_DELETE: &str = "blueprint:afterDelete";

pub const EVENT_WEBHOOK_AFTER_SEND: &str = "webhook:afterSend";

pub const VALID_EVENT_TYPES: &[&str] = &[
    EVENT_CONTENT_AFTER_CREATE,
    EVENT_CONTENT_AFTER_UPDATE,
    EVENT_CONTENT_AFTER_PUBLISH,
    EVENT_CONTENT_AFTER_UNPUBLISH,
    EVENT_CONTENT_AFTER_DELETE,
    EVENT_BLUEPRINT_AFTER_CREATE,
    EVENT_BLUEPRINT_AFTER_UPDATE,
    EVENT_BLUEPRINT_AFTER_DELETE,
    EVENT_WEBHOOK_AFTER_SEND,
];

// =============================================================================
// Event Payload
// =============================================================================

/// An event fired by the core, carried as the webhook delivery payload body
/// `{event, timestamp, data}` per the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormworkEvent {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl FormworkEvent {
    pub fn new(event: &str, data: serde_json::Value) -> Self {
        Self {
            event: event.to_string(),
            timestamp: Utc::now(),
            data,
        }
    }
}

// =============================================================================
// Webhook Models
// =============================================================================

/// A webhook registration record from the database.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = webhooks)]
pub struct Webhook {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub events: serde_json::Value,
    pub headers: Option<serde_json::Value>,
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Webhook {
    pub fn event_list(&self) -> Vec<String> {
        serde_json::from_value(self.events.clone()).unwrap_or_default()
    }

    pub fn subscribes_to(&self, event: &str) -> bool {
        self.is_active && self.event_list().iter().any(|e| e == event)
    }

    pub fn header_map(&self) -> Vec<(String, String)> {
        self.headers
            .as_ref()
            .and_then(|h| h.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A new webhook to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = webhooks)]
pub struct NewWebhook {
    pub name: String,
    pub url: String,
    pub events: serde_json::Value,
    pub headers: Option<serde_json::Value>,
    pub secret: Option<String>,
    pub is_active: bool,
}

impl NewWebhook {
    pub fn new(
        name: &str,
        url: &str,
        events: Vec<String>,
        headers: Option<serde_json::Value>,
        secret: Option<String>,
    ) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Webhook name cannot be empty".to_string());
        }
        if name.len() > 255 {
            return Err("Webhook name cannot exceed 255 characters".to_string());
        }
        if url::Url::parse(url).is_err() {
            return Err(format!("Webhook url '{}' is not a valid absolute URL", url));
        }
        if events.is_empty() {
            return Err("At least one event is required".to_string());
        }
        for event in &events {
            if !VALID_EVENT_TYPES.contains(&event.as_str()) {
                return Err(format!("Unknown event type '{}'", event));
            }
        }

        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            events: serde_json::to_value(&events).map_err(|e| e.to_string())?,
            headers,
            secret,
            is_active: true,
        })
    }
}

/// Changeset for updating a webhook.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = webhooks)]
pub struct UpdateWebhook {
    pub name: Option<String>,
    pub url: Option<String>,
    pub events: Option<serde_json::Value>,
    pub headers: Option<Option<serde_json::Value>>,
    pub secret: Option<Option<String>>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Webhook Delivery Models
// =============================================================================

/// A webhook delivery record from the database — one row per HTTP attempt.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = webhook_deliveries)]
pub struct WebhookDelivery {
    pub id: String,
    pub webhook_id: Uuid,
    pub event: String,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempt: i32,
    pub response: Option<String>,
    pub duration: Option<i32>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A new webhook delivery row to be inserted at attempt start.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = webhook_deliveries)]
pub struct NewWebhookDelivery {
    pub id: String,
    pub webhook_id: Uuid,
    pub event: String,
    pub status_code: Option<i32>,
    pub success: bool,
    pub attempt: i32,
}

impl NewWebhookDelivery {
    /// Starts the delivery row for a given attempt number. `attempt` is
    /// 1-based; a retried delivery creates a fresh row with `attempt =
    /// prior + 1` rather than mutating the previous row (see §Invariants).
    pub fn new(webhook_id: Uuid, event: &str, attempt: i32) -> Result<Self, String> {
        if attempt < 1 {
            return Err("attempt must be at least 1".to_string());
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            webhook_id,
            event: event.to_string(),
            status_code: None,
            success: false,
            attempt,
        })
    }
}

/// Changeset applied once the HTTP attempt completes. Never applied twice to
/// the same row.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = webhook_deliveries)]
pub struct CompleteWebhookDelivery {
    pub status_code: Option<i32>,
    pub success: Option<bool>,
    pub response: Option<Option<String>>,
    pub duration: Option<i32>,
    pub error: Option<Option<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formwork_event_new() {
        let data = serde_json::json!({"id": "123"});
        let event = FormworkEvent::new(EVENT_CONTENT_AFTER_CREATE, data.clone());
        assert_eq!(event.event, EVENT_CONTENT_AFTER_CREATE);
        assert_eq!(event.data, data);
    }

    #[test]
    fn test_new_webhook_success() {
        let result = NewWebhook::new(
            "Slack notifier",
            "https://hooks.example.com/abc",
            vec![EVENT_CONTENT_AFTER_PUBLISH.to_string()],
            None,
            Some("topsecret".to_string()),
        );
        assert!(result.is_ok());
        let webhook = result.unwrap();
        assert!(webhook.is_active);
    }

    #[test]
    fn test_new_webhook_empty_name() {
        let result = NewWebhook::new(
            "",
            "https://hooks.example.com/abc",
            vec![EVENT_CONTENT_AFTER_PUBLISH.to_string()],
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_webhook_invalid_url() {
        let result = NewWebhook::new(
            "Bad",
            "not-a-url",
            vec![EVENT_CONTENT_AFTER_PUBLISH.to_string()],
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_webhook_unknown_event() {
        let result = NewWebhook::new(
            "Bad",
            "https://hooks.example.com/abc",
            vec!["content:beforeLunch".to_string()],
            None,
            None,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown event type"));
    }

    #[test]
    fn test_new_webhook_no_events() {
        let result = NewWebhook::new("Bad", "https://hooks.example.com/abc", vec![], None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_webhook_subscribes_to() {
        let webhook = Webhook {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            url: "https://example.com".to_string(),
            events: serde_json::json!([EVENT_CONTENT_AFTER_PUBLISH]),
            headers: None,
            secret: None,
            is_active: true,
            created_at: Utc::now(),
        };
        assert!(webhook.subscribes_to(EVENT_CONTENT_AFTER_PUBLISH));
        assert!(!webhook.subscribes_to(EVENT_CONTENT_AFTER_DELETE));
    }

    #[test]
    fn test_new_webhook_delivery_success() {
        let delivery = NewWebhookDelivery::new(Uuid::new_v4(), EVENT_CONTENT_AFTER_CREATE, 1).unwrap();
        assert_eq!(delivery.attempt, 1);
        assert!(!delivery.success);
    }

    #[test]
    fn test_new_webhook_delivery_invalid_attempt() {
        let result = NewWebhookDelivery::new(Uuid::new_v4(), EVENT_CONTENT_AFTER_CREATE, 0);
        assert!(result.is_err());
    }
}
