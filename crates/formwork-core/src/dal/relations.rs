/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Data Access Layer for Relation operations.

use crate::dal::DAL;
use diesel::prelude::*;
use formwork_models::models::relations::{NewRelation, Relation};
use formwork_models::schema::relations;
use uuid::Uuid;

/// Data Access Layer for Relation operations.
pub struct RelationsDAL<'a> {
    /// Reference to the main DAL instance.
    pub dal: &'a DAL,
}

impl RelationsDAL<'_> {
    /// Creates a new relation edge.
    pub fn create(&self, new_relation: &NewRelation) -> Result<Relation, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::insert_into(relations::table)
            .values(new_relation)
            .get_result(conn)
    }

    /// Lists relations where `content_id` is the source (outgoing edges).
    pub fn list_outgoing(&self, content_id: Uuid) -> Result<Vec<Relation>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        relations::table
            .filter(relations::source_content_id.eq(content_id))
            .load(conn)
    }

    /// Lists relations where `content_id` is the target (incoming edges) —
    /// what the delete algorithm consults to decide whether a delete is
    /// restricted, cascaded, or nulled out.
    pub fn list_incoming(&self, content_id: Uuid) -> Result<Vec<Relation>, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        relations::table
            .filter(relations::target_content_id.eq(content_id))
            .load(conn)
    }

    /// Deletes every relation touching `content_id`, as source or target.
    pub fn delete_touching(&self, content_id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(
            relations::table.filter(
                relations::source_content_id
                    .eq(content_id)
                    .or(relations::target_content_id.eq(content_id)),
            ),
        )
        .execute(conn)
    }

    /// Deletes a single relation by id. Used by the set-null policy, which
    /// strips only the offending edge rather than touching the rest of the
    /// target's incoming relations.
    pub fn delete(&self, id: Uuid) -> Result<usize, diesel::result::Error> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        diesel::delete(relations::table.filter(relations::id.eq(id))).execute(conn)
    }
}
