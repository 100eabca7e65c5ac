/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! User models.
//!
//! Authentication itself (password hashing, session issuance) is delegated
//! to the HTTP collaborator; this crate only owns the persisted shape and
//! the structural invariants email uniqueness depends on.

use crate::schema::users;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_VIEWER: &str = "viewer";

pub const VALID_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_EDITOR, ROLE_VIEWER];

/// A user record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub permissions: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A new user to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub permissions: serde_json::Value,
}

impl NewUser {
    pub fn new(email: &str, password_hash: &str, role: &str) -> Result<Self, String> {
        if !email.contains('@') || email.trim().is_empty() {
            return Err(format!("Invalid email '{}'", email));
        }
        if !VALID_ROLES.contains(&role) {
            return Err(format!(
                "Invalid role '{}'. Must be one of: {:?}",
                role, VALID_ROLES
            ));
        }
        Ok(Self {
            email: email.to_lowercase(),
            password_hash: password_hash.to_string(),
            role: role.to_string(),
            permissions: serde_json::json!([]),
        })
    }
}

/// Changeset for updating a user.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UpdateUser {
    pub password_hash: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_lowercases_email() {
        let user = NewUser::new("Admin@Example.com", "hash", ROLE_ADMIN).unwrap();
        assert_eq!(user.email, "admin@example.com");
    }

    #[test]
    fn test_new_user_invalid_email() {
        let result = NewUser::new("not-an-email", "hash", ROLE_ADMIN);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_user_invalid_role() {
        let result = NewUser::new("a@b.com", "hash", "superuser");
        assert!(result.is_err());
    }
}
