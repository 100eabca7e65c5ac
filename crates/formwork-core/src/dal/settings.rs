/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for runtime settings operations.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::settings::{NewSetting, Setting};
use formwork_models::schema::settings;

/// Data Access Layer for runtime settings operations.
pub struct SettingsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl SettingsDAL<'_> {
    /// Retrieves a setting by key.
    pub fn get(&self, key: &str) -> Result<Option<Setting>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        settings::table
            .filter(settings::key.eq(key))
            .first(conn)
            .optional()
    }

    /// Lists every runtime setting.
    pub fn list(&self) -> Result<Vec<Setting>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        settings::table.order(settings::key.asc()).load(conn)
    }

    /// Upserts a setting by key.
    pub fn set(&self, new_setting: &NewSetting) -> Result<Setting, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(settings::table)
            .values(new_setting)
            .on_conflict(settings::key)
            .do_update()
            .set(new_setting)
            .get_result(conn)
    }

    /// Deletes a setting by key.
    pub fn delete(&self, key: &str) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(settings::table.filter(settings::key.eq(key))).execute(conn)
    }
}
