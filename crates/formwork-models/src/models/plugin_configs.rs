/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Plugin configuration models.
//!
//! One row per loaded plugin, keyed by its manifest id. Config validity
//! against the plugin's declared schema is the Plugin Manager's job (it
//! uses `jsonschema`); this model only owns the persisted shape.

use crate::schema::plugin_configs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A plugin config record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = plugin_configs, primary_key(plugin_id))]
pub struct PluginConfig {
    pub plugin_id: String,
    pub config: serde_json::Value,
    pub environment: String,
    pub updated_at: DateTime<Utc>,
}

/// A new plugin config to be inserted or upserted by plugin_id.
#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = plugin_configs)]
pub struct NewPluginConfig {
    pub plugin_id: String,
    pub config: serde_json::Value,
    pub environment: String,
}

impl NewPluginConfig {
    pub fn new(plugin_id: &str, config: serde_json::Value, environment: &str) -> Result<Self, String> {
        if plugin_id.trim().is_empty() {
            return Err("plugin_id cannot be empty".to_string());
        }
        if environment.trim().is_empty() {
            return Err("environment cannot be empty".to_string());
        }
        Ok(Self {
            plugin_id: plugin_id.to_string(),
            config,
            environment: environment.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plugin_config_success() {
        let cfg = NewPluginConfig::new("seo-fields", serde_json::json!({}), "production").unwrap();
        assert_eq!(cfg.plugin_id, "seo-fields");
    }

    #[test]
    fn test_new_plugin_config_empty_id() {
        let result = NewPluginConfig::new("", serde_json::json!({}), "production");
        assert!(result.is_err());
    }
}
