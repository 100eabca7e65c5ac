/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Plugin Manager configuration operations.

use crate::dal::DAL;
use chrono::Utc;
use diesel::prelude::*;
use formwork_models::models::plugin_configs::{NewPluginConfig, PluginConfig};
use formwork_models::schema::plugin_configs;

/// Data Access Layer for plugin configuration operations.
pub struct PluginConfigsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl PluginConfigsDAL<'_> {
    /// Retrieves a plugin's stored config by its manifest id.
    pub fn get(&self, plugin_id: &str) -> Result<Option<PluginConfig>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        plugin_configs::table
            .filter(plugin_configs::plugin_id.eq(plugin_id))
            .first(conn)
            .optional()
    }

    /// Lists every stored plugin config, used at startup to reload the set
    /// of previously-enabled plugins.
    pub fn list(&self) -> Result<Vec<PluginConfig>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        plugin_configs::table.load(conn)
    }

    /// Upserts a plugin's config by id, bumping `updated_at`.
    pub fn upsert(&self, new_config: &NewPluginConfig) -> Result<PluginConfig, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(plugin_configs::table)
            .values(new_config)
            .on_conflict(plugin_configs::plugin_id)
            .do_update()
            .set((new_config, plugin_configs::updated_at.eq(Utc::now())))
            .get_result(conn)
    }

    /// Deletes a plugin's stored config, used when a plugin is unloaded.
    pub fn delete(&self, plugin_id: &str) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(plugin_configs::table.filter(plugin_configs::plugin_id.eq(plugin_id)))
            .execute(conn)
    }
}
