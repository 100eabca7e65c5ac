/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for API key operations.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::api_keys::{ApiKey, NewApiKey, UpdateApiKey};
use formwork_models::schema::api_keys;
use uuid::Uuid;

/// Data Access Layer for API key operations.
pub struct ApiKeysDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ApiKeysDAL<'_> {
    /// Creates a new API key record.
    pub fn create(&self, new_key: &NewApiKey) -> Result<ApiKey, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(api_keys::table)
            .values(new_key)
            .get_result(conn)
    }

    /// Retrieves an API key by id.
    pub fn get(&self, id: Uuid) -> Result<Option<ApiKey>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        api_keys::table
            .filter(api_keys::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Retrieves an active API key by its prefix, the first step of
    /// verifying a raw presented key (the caller still has to check the
    /// hash and `is_active`/`expires_at`).
    pub fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        api_keys::table
            .filter(api_keys::key_prefix.eq(prefix))
            .first(conn)
            .optional()
    }

    /// Lists every API key belonging to a user.
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ApiKey>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        api_keys::table
            .filter(api_keys::user_id.eq(user_id))
            .load(conn)
    }

    /// Applies a changeset to an API key (e.g. revocation).
    pub fn update(&self, id: Uuid, changes: &UpdateApiKey) -> Result<ApiKey, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(api_keys::table.filter(api_keys::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Deletes an API key outright.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(api_keys::table.filter(api_keys::id.eq(id))).execute(conn)
    }
}
