/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Relation models: directed edges between Content Items.
//!
//! The database enforces uniqueness of (source, target, type) and nothing
//! else — deletion policy (restrict/cascade/set-null) is an application-side
//! concern, carried in `metadata.policy` and read by the Content Storage
//! Service's delete algorithm, never by a DB foreign key.

use crate::schema::relations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const RELATION_ONE_TO_ONE: &str = "one-to-one";
pub const RELATION_ONE_TO_MANY: &str = "one-to-many";
pub const RELATION_MANY_TO_MANY: &str = "many-to-many";

pub const VALID_RELATION_TYPES: &[&str] = &[
    RELATION_ONE_TO_ONE,
    RELATION_ONE_TO_MANY,
    RELATION_MANY_TO_MANY,
];

pub const POLICY_RESTRICT: &str = "restrict";
pub const POLICY_CASCADE: &str = "cascade";
pub const POLICY_SET_NULL: &str = "set-null";

pub const VALID_DELETION_POLICIES: &[&str] = &[POLICY_RESTRICT, POLICY_CASCADE, POLICY_SET_NULL];

/// A relation record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = relations)]
pub struct Relation {
    pub id: Uuid,
    pub source_content_id: Uuid,
    pub target_content_id: Uuid,
    pub relation_type: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Relation {
    /// The deletion policy that governs this relation, defaulting to
    /// `restrict` when unset — the safest choice absent explicit
    /// configuration, per the relation field's `options.onDelete`.
    pub fn deletion_policy(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("policy"))
            .and_then(|p| p.as_str())
            .filter(|p| VALID_DELETION_POLICIES.contains(p))
            .unwrap_or(POLICY_RESTRICT)
    }
}

/// A new relation to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = relations)]
pub struct NewRelation {
    pub source_content_id: Uuid,
    pub target_content_id: Uuid,
    pub relation_type: String,
    pub metadata: Option<serde_json::Value>,
}

impl NewRelation {
    pub fn new(
        source_content_id: Uuid,
        target_content_id: Uuid,
        relation_type: &str,
        policy: &str,
    ) -> Result<Self, String> {
        if !VALID_RELATION_TYPES.contains(&relation_type) {
            return Err(format!(
                "Invalid relation type '{}'. Must be one of: {:?}",
                relation_type, VALID_RELATION_TYPES
            ));
        }
        if !VALID_DELETION_POLICIES.contains(&policy) {
            return Err(format!(
                "Invalid deletion policy '{}'. Must be one of: {:?}",
                policy, VALID_DELETION_POLICIES
            ));
        }
        Ok(Self {
            source_content_id,
            target_content_id,
            relation_type: relation_type.to_string(),
            metadata: Some(serde_json::json!({ "policy": policy })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_relation_success() {
        let rel = NewRelation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            RELATION_ONE_TO_MANY,
            POLICY_CASCADE,
        )
        .unwrap();
        assert_eq!(rel.relation_type, RELATION_ONE_TO_MANY);
    }

    #[test]
    fn test_new_relation_invalid_type() {
        let result = NewRelation::new(Uuid::new_v4(), Uuid::new_v4(), "sideways", POLICY_RESTRICT);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_relation_invalid_policy() {
        let result = NewRelation::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            RELATION_ONE_TO_ONE,
            "delete-everything",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_deletion_policy_defaults_to_restrict() {
        let rel = Relation {
            id: Uuid::new_v4(),
            source_content_id: Uuid::new_v4(),
            target_content_id: Uuid::new_v4(),
            relation_type: RELATION_ONE_TO_ONE.to_string(),
            metadata: None,
            created_at: Utc::now(),
        };
        assert_eq!(rel.deletion_policy(), POLICY_RESTRICT);
    }
}
