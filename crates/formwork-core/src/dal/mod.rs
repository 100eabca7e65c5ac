/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! # Data Access Layer (DAL) Module
//!
//! This module provides an abstraction layer for database operations in the
//! Formwork core. It includes structures and methods for interacting with
//! blueprints, content items, their version history, relations, webhooks,
//! and the ambient entities (users, API keys, runtime settings, plugin
//! configs, migration bookkeeping, audit logs) the storage and plugin
//! services depend on.
//!
//! ## Main Structures
//!
//! - `DAL`: The main Data Access Layer struct that provides access to all sub-DALs.
//!
//! ## Usage
//!
//! ```rust
//! use formwork_core::dal::DAL;
//! use formwork_core::db::create_shared_connection_pool;
//!
//! let pool = create_shared_connection_pool("database_url", "app_name", 5);
//! let dal = DAL::new(pool);
//!
//! let blueprints = dal.blueprints().list().expect("Failed to list blueprints");
//! ```

use crate::db::ConnectionPool;

pub mod blueprints;
use blueprints::BlueprintsDAL;

pub mod contents;
use contents::ContentsDAL;

pub mod versions;
use versions::VersionsDAL;

pub mod relations;
use relations::RelationsDAL;

pub mod webhooks;
use webhooks::WebhooksDAL;

pub mod webhook_deliveries;
use webhook_deliveries::WebhookDeliveriesDAL;

pub mod users;
use users::UsersDAL;

pub mod api_keys;
use api_keys::ApiKeysDAL;

pub mod settings;
use settings::SettingsDAL;

pub mod plugin_configs;
use plugin_configs::PluginConfigsDAL;

pub mod migrations;
use migrations::MigrationsDAL;

pub mod audit_logs;
use audit_logs::AuditLogsDAL;

/// The main Data Access Layer struct.
///
/// This struct serves as the central point for database operations,
/// managing a connection pool and providing access to specific DAL
/// implementations for different entities.
#[derive(Clone)]
pub struct DAL {
    /// A connection pool for PostgreSQL database connections with schema support.
    pub pool: ConnectionPool,
}

impl DAL {
    /// Creates a new DAL instance with the given connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        DAL { pool }
    }

    /// Provides access to the Blueprints Data Access Layer.
    pub fn blueprints(&self) -> BlueprintsDAL {
        BlueprintsDAL { dal: self }
    }

    /// Provides access to the Content Items Data Access Layer.
    pub fn contents(&self) -> ContentsDAL {
        ContentsDAL { dal: self }
    }

    /// Provides access to the Versions Data Access Layer.
    pub fn versions(&self) -> VersionsDAL {
        VersionsDAL { dal: self }
    }

    /// Provides access to the Relations Data Access Layer.
    pub fn relations(&self) -> RelationsDAL {
        RelationsDAL { dal: self }
    }

    /// Provides access to the Webhooks Data Access Layer.
    pub fn webhooks(&self) -> WebhooksDAL {
        WebhooksDAL { dal: self }
    }

    /// Provides access to the Webhook Deliveries Data Access Layer.
    pub fn webhook_deliveries(&self) -> WebhookDeliveriesDAL {
        WebhookDeliveriesDAL { dal: self }
    }

    /// Provides access to the Users Data Access Layer.
    pub fn users(&self) -> UsersDAL {
        UsersDAL { dal: self }
    }

    /// Provides access to the API Keys Data Access Layer.
    pub fn api_keys(&self) -> ApiKeysDAL {
        ApiKeysDAL { dal: self }
    }

    /// Provides access to the runtime Settings Data Access Layer.
    pub fn settings(&self) -> SettingsDAL {
        SettingsDAL { dal: self }
    }

    /// Provides access to the Plugin Configs Data Access Layer.
    pub fn plugin_configs(&self) -> PluginConfigsDAL {
        PluginConfigsDAL { dal: self }
    }

    /// Provides access to the Migration Runner's bookkeeping Data Access Layer.
    pub fn migrations(&self) -> MigrationsDAL {
        MigrationsDAL { dal: self }
    }

    /// Provides access to the Audit Logs Data Access Layer.
    pub fn audit_logs(&self) -> AuditLogsDAL {
        AuditLogsDAL { dal: self }
    }
}
