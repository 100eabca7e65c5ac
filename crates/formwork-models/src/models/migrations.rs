/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Migration Runner bookkeeping models.
//!
//! Distinct from diesel's own schema-migration tracking table: this table
//! records which *content-level* registry migrations (see
//! `formwork-core::migration_runner`) have been applied, keyed by the
//! migration's own timestamp-prefixed id, not a surrogate uuid.

use crate::schema::migrations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// An applied-migration record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = migrations, primary_key(id))]
pub struct MigrationRecord {
    pub id: String,
    pub name: String,
    pub executed_at: DateTime<Utc>,
    pub execution_time_ms: i32,
}

/// A new applied-migration record to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = migrations)]
pub struct NewMigrationRecord {
    pub id: String,
    pub name: String,
    pub execution_time_ms: i32,
}

impl NewMigrationRecord {
    pub fn new(id: &str, name: &str, execution_time_ms: i32) -> Result<Self, String> {
        if id.trim().is_empty() {
            return Err("migration id cannot be empty".to_string());
        }
        if name.trim().is_empty() {
            return Err("migration name cannot be empty".to_string());
        }
        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            execution_time_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_migration_record_success() {
        let rec = NewMigrationRecord::new("20260101000000_add_seo_fields", "add seo fields", 12)
            .unwrap();
        assert_eq!(rec.id, "20260101000000_add_seo_fields");
    }

    #[test]
    fn test_new_migration_record_empty_id() {
        let result = NewMigrationRecord::new("", "x", 0);
        assert!(result.is_err());
    }
}
