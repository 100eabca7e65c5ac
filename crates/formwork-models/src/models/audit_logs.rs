/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Audit log models for tracking administrative and security-sensitive operations.
//!
//! Audit logs are immutable records that track who did what to which resource.
//! They are used for compliance, debugging, and security incident investigation.

use crate::schema::audit_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Actor type for admin/editor users.
pub const ACTOR_TYPE_USER: &str = "user";
/// Actor type for API-key-authenticated callers.
pub const ACTOR_TYPE_API_KEY: &str = "api_key";
/// Actor type for plugins acting on their own behalf.
pub const ACTOR_TYPE_PLUGIN: &str = "plugin";
/// Actor type for system operations (e.g. the migration runner, the delivery worker).
pub const ACTOR_TYPE_SYSTEM: &str = "system";

pub const VALID_ACTOR_TYPES: &[&str] = &[
    ACTOR_TYPE_USER,
    ACTOR_TYPE_API_KEY,
    ACTOR_TYPE_PLUGIN,
    ACTOR_TYPE_SYSTEM,
];

// Action constants - Authentication
pub const ACTION_AUTH_FAILED: &str = "auth.failed";
pub const ACTION_AUTH_SUCCESS: &str = "auth.success";
pub const ACTION_API_KEY_CREATED: &str = "api_key.created";
pub const ACTION_API_KEY_REVOKED: &str = "api_key.revoked";

// Action constants - Blueprint Engine
pub const ACTION_BLUEPRINT_CREATED: &str = "blueprint.created";
pub const ACTION_BLUEPRINT_UPDATED: &str = "blueprint.updated";
pub const ACTION_BLUEPRINT_DELETED: &str = "blueprint.deleted";

// Action constants - Content Storage Service
pub const ACTION_CONTENT_CREATED: &str = "content.created";
pub const ACTION_CONTENT_UPDATED: &str = "content.updated";
pub const ACTION_CONTENT_PUBLISHED: &str = "content.published";
pub const ACTION_CONTENT_UNPUBLISHED: &str = "content.unpublished";
pub const ACTION_CONTENT_DELETED: &str = "content.deleted";
pub const ACTION_CONTENT_ROLLED_BACK: &str = "content.rolled_back";

// Action constants - Webhooks
pub const ACTION_WEBHOOK_CREATED: &str = "webhook.created";
pub const ACTION_WEBHOOK_UPDATED: &str = "webhook.updated";
pub const ACTION_WEBHOOK_DELETED: &str = "webhook.deleted";
pub const ACTION_WEBHOOK_DELIVERY_FAILED: &str = "webhook.delivery_failed";

// Action constants - Plugin Manager
pub const ACTION_PLUGIN_LOADED: &str = "plugin.loaded";
pub const ACTION_PLUGIN_UNLOADED: &str = "plugin.unloaded";
pub const ACTION_PLUGIN_RECONFIGURED: &str = "plugin.reconfigured";

// Action constants - Migration Runner
pub const ACTION_MIGRATION_APPLIED: &str = "migration.applied";
pub const ACTION_MIGRATION_ROLLED_BACK: &str = "migration.rolled_back";

// Action constants - Admin
pub const ACTION_CONFIG_RELOADED: &str = "config.reloaded";

// Resource type constants
pub const RESOURCE_TYPE_BLUEPRINT: &str = "blueprint";
pub const RESOURCE_TYPE_CONTENT: &str = "content";
pub const RESOURCE_TYPE_WEBHOOK: &str = "webhook";
pub const RESOURCE_TYPE_PLUGIN: &str = "plugin";
pub const RESOURCE_TYPE_USER: &str = "user";
pub const RESOURCE_TYPE_API_KEY: &str = "api_key";
pub const RESOURCE_TYPE_MIGRATION: &str = "migration";
pub const RESOURCE_TYPE_CONFIG: &str = "config";
pub const RESOURCE_TYPE_SYSTEM: &str = "system";

// =============================================================================
// Audit Log Models
// =============================================================================

/// An audit log record from the database.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = audit_logs)]
pub struct AuditLog {
    /// Unique identifier for the log entry.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of actor: user, api_key, plugin, system.
    pub actor_type: String,
    /// ID of the actor (NULL for system or unauthenticated).
    pub actor_id: Option<Uuid>,
    /// The action performed (e.g., "content.created", "auth.failed").
    pub action: String,
    /// Type of resource affected.
    pub resource_type: String,
    /// ID of the affected resource (NULL if not applicable).
    pub resource_id: Option<Uuid>,
    /// Additional structured details.
    pub details: Option<serde_json::Value>,
    /// Client IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A new audit log entry to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLog {
    /// Type of actor.
    pub actor_type: String,
    /// ID of the actor.
    pub actor_id: Option<Uuid>,
    /// The action performed.
    pub action: String,
    /// Type of resource affected.
    pub resource_type: String,
    /// ID of the affected resource.
    pub resource_id: Option<Uuid>,
    /// Additional structured details.
    pub details: Option<serde_json::Value>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client user agent string.
    pub user_agent: Option<String>,
}

impl NewAuditLog {
    /// Creates a new audit log entry.
    pub fn new(
        actor_type: &str,
        actor_id: Option<Uuid>,
        action: &str,
        resource_type: &str,
        resource_id: Option<Uuid>,
    ) -> Result<Self, String> {
        if !VALID_ACTOR_TYPES.contains(&actor_type) {
            return Err(format!(
                "Invalid actor_type '{}'. Must be one of: {:?}",
                actor_type, VALID_ACTOR_TYPES
            ));
        }
        if action.trim().is_empty() {
            return Err("Action cannot be empty".to_string());
        }
        if resource_type.trim().is_empty() {
            return Err("Resource type cannot be empty".to_string());
        }

        Ok(Self {
            actor_type: actor_type.to_string(),
            actor_id,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id,
            details: None,
            ip_address: None,
            user_agent: None,
        })
    }

    /// Adds details to the audit log entry.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds client IP address to the audit log entry.
    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Adds user agent to the audit log entry.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }
}

// =============================================================================
// Query Filters
// =============================================================================

/// Filters for querying audit logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_audit_log_success() {
        let result = NewAuditLog::new(
            ACTOR_TYPE_USER,
            Some(Uuid::new_v4()),
            ACTION_CONTENT_CREATED,
            RESOURCE_TYPE_CONTENT,
            Some(Uuid::new_v4()),
        );

        assert!(result.is_ok());
        let log = result.unwrap();
        assert_eq!(log.actor_type, ACTOR_TYPE_USER);
        assert_eq!(log.action, ACTION_CONTENT_CREATED);
    }

    #[test]
    fn test_new_audit_log_invalid_actor_type() {
        let result = NewAuditLog::new(
            "invalid",
            None,
            ACTION_CONTENT_CREATED,
            RESOURCE_TYPE_CONTENT,
            None,
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid actor_type"));
    }

    #[test]
    fn test_new_audit_log_empty_action() {
        let result = NewAuditLog::new(ACTOR_TYPE_SYSTEM, None, "", RESOURCE_TYPE_SYSTEM, None);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Action cannot be empty"));
    }

    #[test]
    fn test_audit_log_with_details() {
        let log = NewAuditLog::new(
            ACTOR_TYPE_USER,
            Some(Uuid::new_v4()),
            ACTION_CONTENT_CREATED,
            RESOURCE_TYPE_CONTENT,
            Some(Uuid::new_v4()),
        )
        .unwrap()
        .with_details(serde_json::json!({"slug": "hello-world"}));

        assert!(log.details.is_some());
        assert_eq!(log.details.unwrap()["slug"], "hello-world");
    }

    #[test]
    fn test_audit_log_with_ip_address() {
        let log = NewAuditLog::new(
            ACTOR_TYPE_USER,
            None,
            ACTION_AUTH_SUCCESS,
            RESOURCE_TYPE_SYSTEM,
            None,
        )
        .unwrap()
        .with_ip_address("192.168.1.100");

        assert!(log.ip_address.is_some());
        assert_eq!(log.ip_address.unwrap(), "192.168.1.100");
    }

    #[test]
    fn test_audit_log_system_action() {
        let result = NewAuditLog::new(
            ACTOR_TYPE_SYSTEM,
            None,
            ACTION_CONFIG_RELOADED,
            RESOURCE_TYPE_CONFIG,
            None,
        );

        assert!(result.is_ok());
        let log = result.unwrap();
        assert!(log.actor_id.is_none());
        assert_eq!(log.actor_type, ACTOR_TYPE_SYSTEM);
    }
}
