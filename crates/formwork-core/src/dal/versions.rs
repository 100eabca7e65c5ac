/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Version operations. Versions are append-only:
//! this DAL exposes no update method.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::versions::{NewVersion, Version};
use formwork_models::schema::versions;
use uuid::Uuid;

/// Data Access Layer for Version operations.
pub struct VersionsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl VersionsDAL<'_> {
    /// Inserts a new version row.
    pub fn create(&self, new_version: &NewVersion) -> Result<Version, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(versions::table)
            .values(new_version)
            .get_result(conn)
    }

    /// Lists every version of a content item, oldest first.
    pub fn list_for_content(&self, content_id: Uuid) -> Result<Vec<Version>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        versions::table
            .filter(versions::content_id.eq(content_id))
            .order(versions::version_number.asc())
            .load(conn)
    }

    /// Retrieves a specific version of a content item.
    pub fn get(
        &self,
        content_id: Uuid,
        version_number: i32,
    ) -> Result<Option<Version>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        versions::table
            .filter(versions::content_id.eq(content_id))
            .filter(versions::version_number.eq(version_number))
            .first(conn)
            .optional()
    }

    /// Returns the highest version number recorded for a content item, or
    /// `None` if it has no history yet.
    pub fn max_version_number(&self, content_id: Uuid) -> Result<Option<i32>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        versions::table
            .filter(versions::content_id.eq(content_id))
            .select(diesel::dsl::max(versions::version_number))
            .first(conn)
    }

    /// Deletes every version of a content item. Used when the content item
    /// itself is deleted; version history never outlives its content item.
    pub fn delete_for_content(&self, content_id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(versions::table.filter(versions::content_id.eq(content_id))).execute(conn)
    }
}
