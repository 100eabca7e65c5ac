/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Version models: append-only snapshots of a Content Item's data.

use crate::schema::versions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A version record as stored. Never updated once inserted.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = versions)]
pub struct Version {
    pub id: Uuid,
    pub content_id: Uuid,
    pub blueprint_id: Uuid,
    pub data: serde_json::Value,
    pub version_number: i32,
    pub created_by: Option<Uuid>,
    pub change_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new version to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = versions)]
pub struct NewVersion {
    pub content_id: Uuid,
    pub blueprint_id: Uuid,
    pub data: serde_json::Value,
    pub version_number: i32,
    pub created_by: Option<Uuid>,
    pub change_summary: Option<String>,
}

impl NewVersion {
    /// Builds the first version of a content item (`version_number = 1`).
    pub fn initial(
        content_id: Uuid,
        blueprint_id: Uuid,
        data: serde_json::Value,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            content_id,
            blueprint_id,
            data,
            version_number: 1,
            created_by,
            change_summary: Some("initial create".to_string()),
        }
    }

    /// Builds the next version after `prior_version_number`.
    ///
    /// `version_number` must be strictly greater than every prior version for
    /// this content item; the DAL is responsible for enforcing that under a
    /// transaction against a fresh read of the max, since two concurrent
    /// updates racing on the same content item must not produce the same
    /// number.
    pub fn next(
        content_id: Uuid,
        blueprint_id: Uuid,
        data: serde_json::Value,
        prior_version_number: i32,
        created_by: Option<Uuid>,
        change_summary: String,
    ) -> Result<Self, String> {
        if prior_version_number < 1 {
            return Err("prior_version_number must be at least 1".to_string());
        }
        Ok(Self {
            content_id,
            blueprint_id,
            data,
            version_number: prior_version_number + 1,
            created_by,
            change_summary: Some(change_summary),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_version() {
        let v = NewVersion::initial(Uuid::new_v4(), Uuid::new_v4(), serde_json::json!({}), None);
        assert_eq!(v.version_number, 1);
        assert_eq!(v.change_summary.as_deref(), Some("initial create"));
    }

    #[test]
    fn test_next_version() {
        let v = NewVersion::next(
            Uuid::new_v4(),
            Uuid::new_v4(),
            serde_json::json!({"title": "new"}),
            3,
            None,
            "title changed".to_string(),
        )
        .unwrap();
        assert_eq!(v.version_number, 4);
    }

    #[test]
    fn test_next_version_invalid_prior() {
        let result = NewVersion::next(
            Uuid::new_v4(),
            Uuid::new_v4(),
            serde_json::json!({}),
            0,
            None,
            "x".to_string(),
        );
        assert!(result.is_err());
    }
}
