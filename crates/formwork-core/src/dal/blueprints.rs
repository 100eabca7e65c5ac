/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Blueprint operations.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::blueprints::{Blueprint, NewBlueprint, UpdateBlueprint};
use formwork_models::schema::blueprints;
use uuid::Uuid;

/// Data Access Layer for Blueprint operations.
pub struct BlueprintsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl BlueprintsDAL<'_> {
    /// Creates a new blueprint in the database.
    pub fn create(&self, new_blueprint: &NewBlueprint) -> Result<Blueprint, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(blueprints::table)
            .values(new_blueprint)
            .get_result(conn)
    }

    /// Retrieves a blueprint by id.
    pub fn get(&self, id: Uuid) -> Result<Option<Blueprint>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        blueprints::table
            .filter(blueprints::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Retrieves a blueprint by its slug.
    pub fn get_by_slug(&self, slug: &str) -> Result<Option<Blueprint>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        blueprints::table
            .filter(blueprints::slug.eq(slug))
            .first(conn)
            .optional()
    }

    /// Lists all blueprints.
    pub fn list(&self) -> Result<Vec<Blueprint>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        blueprints::table.order(blueprints::name.asc()).load(conn)
    }

    /// Applies a changeset to a blueprint.
    pub fn update(
        &self,
        id: Uuid,
        changes: &UpdateBlueprint,
    ) -> Result<Blueprint, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(blueprints::table.filter(blueprints::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Deletes a blueprint. The storage service is responsible for first
    /// deleting (or rejecting the delete of) dependent content items.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(blueprints::table.filter(blueprints::id.eq(id))).execute(conn)
    }
}
