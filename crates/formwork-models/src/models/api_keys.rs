/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! API key models.
//!
//! Keys themselves are generated and verified by a prefixed-API-key
//! controller (see `formwork-core::utils::pak`); this crate only owns the
//! persisted `key_hash`/`key_prefix` pair and never sees the raw key.

use crate::schema::api_keys;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An API key record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = api_keys)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub permissions: serde_json::Value,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub rate_limit_per_minute: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A new API key to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = api_keys)]
pub struct NewApiKey {
    pub user_id: Uuid,
    pub key_hash: String,
    pub key_prefix: String,
    pub permissions: serde_json::Value,
    pub rate_limit_per_minute: Option<i32>,
}

impl NewApiKey {
    pub fn new(
        user_id: Uuid,
        key_hash: String,
        key_prefix: String,
        rate_limit_per_minute: Option<i32>,
    ) -> Result<Self, String> {
        if key_hash.trim().is_empty() {
            return Err("key_hash cannot be empty".to_string());
        }
        if key_prefix.trim().is_empty() || key_prefix.len() > 16 {
            return Err("key_prefix must be non-empty and at most 16 characters".to_string());
        }
        Ok(Self {
            user_id,
            key_hash,
            key_prefix,
            permissions: serde_json::json!([]),
            rate_limit_per_minute,
        })
    }
}

/// Changeset for updating an API key (revocation, rotation of limits).
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = api_keys)]
pub struct UpdateApiKey {
    pub is_active: Option<bool>,
    pub permissions: Option<serde_json::Value>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub rate_limit_per_minute: Option<Option<i32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_api_key_success() {
        let key = NewApiKey::new(Uuid::new_v4(), "hash".to_string(), "fwk_ab".to_string(), Some(60))
            .unwrap();
        assert_eq!(key.key_prefix, "fwk_ab");
    }

    #[test]
    fn test_new_api_key_prefix_too_long() {
        let result = NewApiKey::new(
            Uuid::new_v4(),
            "hash".to_string(),
            "this_prefix_is_way_too_long".to_string(),
            None,
        );
        assert!(result.is_err());
    }
}
