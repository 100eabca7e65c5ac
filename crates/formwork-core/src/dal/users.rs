/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for User operations.

use crate::dal::DAL;
use chrono::Utc;
use diesel::prelude::*;
use formwork_models::models::users::{NewUser, UpdateUser, User};
use formwork_models::schema::users;
use uuid::Uuid;

/// Data Access Layer for User operations.
pub struct UsersDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl UsersDAL<'_> {
    /// Creates a new user.
    pub fn create(&self, new_user: &NewUser) -> Result<User, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(users::table)
            .values(new_user)
            .get_result(conn)
    }

    /// Retrieves a user by id.
    pub fn get(&self, id: Uuid) -> Result<Option<User>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        users::table.filter(users::id.eq(id)).first(conn).optional()
    }

    /// Retrieves a user by email (already lowercased by the model constructor).
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        users::table
            .filter(users::email.eq(email.to_lowercase()))
            .first(conn)
            .optional()
    }

    /// Lists every user.
    pub fn list(&self) -> Result<Vec<User>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        users::table.order(users::email.asc()).load(conn)
    }

    /// Applies a changeset to a user, bumping `updated_at`.
    pub fn update(&self, id: Uuid, mut changes: UpdateUser) -> Result<User, diesel::result::Error> {
        changes.updated_at = Some(Utc::now());
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(users::table.filter(users::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Deletes a user outright.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(users::table.filter(users::id.eq(id))).execute(conn)
    }
}
