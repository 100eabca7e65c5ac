/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Content Item operations.

use crate::dal::DAL;
use chrono::Utc;
use diesel::prelude::*;
use formwork_models::models::contents::{Content, NewContent, UpdateContent};
use formwork_models::schema::contents;
use uuid::Uuid;

/// Data Access Layer for Content Item operations.
pub struct ContentsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl ContentsDAL<'_> {
    /// Creates a new content item. Surfaces as
    /// `diesel::result::Error::DatabaseError(UniqueViolation, _)` when
    /// `(blueprint_id, slug)` is already taken; the storage service
    /// translates that into `CmsError::Conflict`.
    pub fn create(&self, new_content: &NewContent) -> Result<Content, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(contents::table)
            .values(new_content)
            .get_result(conn)
    }

    /// Retrieves a content item by id.
    pub fn get(&self, id: Uuid) -> Result<Option<Content>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        contents::table
            .filter(contents::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Retrieves content items by id, preserving no particular order. Used
    /// by the storage service's batched `populate` pass.
    pub fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Content>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        contents::table
            .filter(contents::id.eq_any(ids))
            .load(conn)
    }

    /// Retrieves a content item by its natural key.
    pub fn get_by_slug(
        &self,
        blueprint_id: Uuid,
        slug: &str,
    ) -> Result<Option<Content>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        contents::table
            .filter(contents::blueprint_id.eq(blueprint_id))
            .filter(contents::slug.eq(slug))
            .first(conn)
            .optional()
    }

    /// Lists every content item for a blueprint, unfiltered and unpaginated;
    /// the Query Planner's filters/sort/pagination are applied by the
    /// storage service over this set (acceptable at this scale — see
    /// non-goals around a push-down query engine).
    pub fn list_by_blueprint(&self, blueprint_id: Uuid) -> Result<Vec<Content>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        contents::table
            .filter(contents::blueprint_id.eq(blueprint_id))
            .load(conn)
    }

    /// Applies a changeset to a content item, always bumping `updated_at`.
    pub fn update(
        &self,
        id: Uuid,
        mut changes: UpdateContent,
    ) -> Result<Content, diesel::result::Error> {
        changes.updated_at = Some(Utc::now());
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(contents::table.filter(contents::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Deletes a content item outright. Callers are responsible for first
    /// resolving relation deletion policy and removing version history.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(contents::table.filter(contents::id.eq(id))).execute(conn)
    }
}
