/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Content Item models.
//!
//! A Content Item's natural key is (blueprint_id, slug); the database
//! enforces this with a unique constraint but the storage service is
//! responsible for the specific error kind surfaced on violation.

use crate::schema::contents;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_ARCHIVED: &str = "archived";

pub const VALID_STATUSES: &[&str] = &[STATUS_DRAFT, STATUS_PUBLISHED, STATUS_ARCHIVED];

/// A content item record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = contents)]
pub struct Content {
    pub id: Uuid,
    pub blueprint_id: Uuid,
    pub slug: String,
    pub data: serde_json::Value,
    pub meta: Option<serde_json::Value>,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub published_by: Option<Uuid>,
}

/// A new content item to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = contents)]
pub struct NewContent {
    pub blueprint_id: Uuid,
    pub slug: String,
    pub data: serde_json::Value,
    pub meta: Option<serde_json::Value>,
    pub status: String,
    pub created_by: Option<Uuid>,
}

impl NewContent {
    /// Constructs a new content row. Slug shape and field-level data
    /// validity are the storage service's job (it runs the blueprint engine
    /// first); this constructor only enforces what can never be relaxed
    /// regardless of blueprint: a non-empty slug and a known status.
    pub fn new(
        blueprint_id: Uuid,
        slug: &str,
        data: serde_json::Value,
        status: &str,
        created_by: Option<Uuid>,
    ) -> Result<Self, String> {
        if slug.trim().is_empty() {
            return Err("Content slug cannot be empty".to_string());
        }
        if !VALID_STATUSES.contains(&status) {
            return Err(format!(
                "Invalid status '{}'. Must be one of: {:?}",
                status, VALID_STATUSES
            ));
        }
        Ok(Self {
            blueprint_id,
            slug: slug.to_string(),
            data,
            meta: None,
            status: status.to_string(),
            created_by,
        })
    }
}

/// Changeset for updating a content item.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = contents)]
pub struct UpdateContent {
    pub slug: Option<String>,
    pub data: Option<serde_json::Value>,
    pub meta: Option<Option<serde_json::Value>>,
    pub status: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub published_at: Option<Option<DateTime<Utc>>>,
    pub published_by: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_content_success() {
        let result = NewContent::new(
            Uuid::new_v4(),
            "hello-world",
            serde_json::json!({"title": "Hello"}),
            STATUS_DRAFT,
            None,
        );
        assert!(result.is_ok());
        assert_eq!(result.unwrap().status, STATUS_DRAFT);
    }

    #[test]
    fn test_new_content_empty_slug() {
        let result = NewContent::new(
            Uuid::new_v4(),
            "",
            serde_json::json!({}),
            STATUS_DRAFT,
            None,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("cannot be empty"));
    }

    #[test]
    fn test_new_content_invalid_status() {
        let result = NewContent::new(
            Uuid::new_v4(),
            "hello-world",
            serde_json::json!({}),
            "deleted",
            None,
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status"));
    }
}
