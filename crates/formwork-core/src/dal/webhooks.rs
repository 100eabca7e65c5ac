/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Webhook registration operations.
//!
//! Matching a fired event against registered webhooks is an exact-match
//! lookup against a closed event-type set (`Webhook::subscribes_to`), not
//! the wildcard pattern matching an agent-targeted delivery system would
//! need — the delivery engine filters `list_active()` in memory rather than
//! pushing the match down into SQL, since the set of webhooks is expected to
//! be small.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::webhooks::{NewWebhook, UpdateWebhook, Webhook};
use formwork_models::schema::webhooks;
use uuid::Uuid;

/// Data Access Layer for Webhook registration operations.
pub struct WebhooksDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl WebhooksDAL<'_> {
    /// Registers a new webhook.
    pub fn create(&self, new_webhook: &NewWebhook) -> Result<Webhook, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(webhooks::table)
            .values(new_webhook)
            .get_result(conn)
    }

    /// Retrieves a webhook by id.
    pub fn get(&self, id: Uuid) -> Result<Option<Webhook>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        webhooks::table
            .filter(webhooks::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Lists every registered webhook.
    pub fn list(&self) -> Result<Vec<Webhook>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        webhooks::table.load(conn)
    }

    /// Lists active webhooks. The delivery engine filters this set by
    /// `subscribes_to(event)` in memory.
    pub fn list_active(&self) -> Result<Vec<Webhook>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        webhooks::table.filter(webhooks::is_active.eq(true)).load(conn)
    }

    /// Applies a changeset to a webhook.
    pub fn update(&self, id: Uuid, changes: &UpdateWebhook) -> Result<Webhook, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(webhooks::table.filter(webhooks::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Deletes a webhook registration. Past deliveries are left in place.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(webhooks::table.filter(webhooks::id.eq(id))).execute(conn)
    }
}
