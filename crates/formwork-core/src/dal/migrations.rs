/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Migration Runner bookkeeping.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::migrations::{MigrationRecord, NewMigrationRecord};
use formwork_models::schema::migrations;

/// Data Access Layer for migration-record operations.
pub struct MigrationsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl MigrationsDAL<'_> {
    /// Records that a migration has been applied.
    pub fn record_applied(
        &self,
        record: &NewMigrationRecord,
    ) -> Result<MigrationRecord, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(migrations::table)
            .values(record)
            .get_result(conn)
    }

    /// Lists every applied migration, oldest first by id (ids are
    /// timestamp-prefixed, so lexical order is chronological order).
    pub fn list_applied(&self) -> Result<Vec<MigrationRecord>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        migrations::table.order(migrations::id.asc()).load(conn)
    }

    /// Retrieves a single applied-migration record by id.
    pub fn get(&self, id: &str) -> Result<Option<MigrationRecord>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        migrations::table
            .filter(migrations::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Removes an applied-migration record, called after a successful
    /// `down` invocation during rollback.
    pub fn remove_applied(&self, id: &str) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(migrations::table.filter(migrations::id.eq(id))).execute(conn)
    }
}
