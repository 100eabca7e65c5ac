/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for WebhookDelivery operations.
//!
//! Deliveries are append-only: a retried attempt inserts a fresh row with
//! `attempt = prior + 1` rather than mutating the one before it, so this DAL
//! exposes `create` + a single `complete` changeset and no claim/acquire
//! machinery — the Webhook Delivery Engine runs the whole attempt loop
//! in-process and never hands a delivery off to a remote worker.

use crate::dal::DAL;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use formwork_models::models::webhooks::{CompleteWebhookDelivery, NewWebhookDelivery, WebhookDelivery};
use formwork_models::schema::webhook_deliveries;
use uuid::Uuid;

/// Data Access Layer for WebhookDelivery operations.
pub struct WebhookDeliveriesDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl WebhookDeliveriesDAL<'_> {
    /// Inserts the row for a delivery attempt, prior to the HTTP call.
    pub fn create(
        &self,
        new_delivery: &NewWebhookDelivery,
    ) -> Result<WebhookDelivery, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(webhook_deliveries::table)
            .values(new_delivery)
            .get_result(conn)
    }

    /// Applies the outcome of the HTTP attempt to its row. Never applied
    /// twice to the same id.
    pub fn complete(
        &self,
        id: &str,
        changes: &CompleteWebhookDelivery,
    ) -> Result<WebhookDelivery, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::update(webhook_deliveries::table.filter(webhook_deliveries::id.eq(id)))
            .set(changes)
            .get_result(conn)
    }

    /// Retrieves a delivery attempt row by id.
    pub fn get(&self, id: &str) -> Result<Option<WebhookDelivery>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        webhook_deliveries::table
            .filter(webhook_deliveries::id.eq(id))
            .first(conn)
            .optional()
    }

    /// Lists every attempt row for a webhook, newest first.
    pub fn list_for_webhook(
        &self,
        webhook_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookDelivery>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        webhook_deliveries::table
            .filter(webhook_deliveries::webhook_id.eq(webhook_id))
            .order(webhook_deliveries::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load(conn)
    }

    /// Deletes delivery rows older than the retention window that have
    /// already reached a terminal outcome (`completed_at` set).
    pub fn cleanup_old(&self, retention_days: i64) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        let cutoff = Utc::now() - Duration::days(retention_days);

        diesel::delete(
            webhook_deliveries::table
                .filter(webhook_deliveries::created_at.lt(cutoff))
                .filter(webhook_deliveries::completed_at.is_not_null()),
        )
        .execute(conn)
    }
}
