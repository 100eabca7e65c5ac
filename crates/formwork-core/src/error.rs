/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Crate-level error type.
//!
//! DAL functions return `Result<T, diesel::result::Error>` directly;
//! service-level code (Content Storage Service, Plugin Manager, Migration
//! Runner) translates into `CmsError` at the boundary where domain meaning
//! is known.

use std::fmt;

/// A single (field path, message) validation failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The crate-level error taxonomy from the error handling design.
#[derive(Debug)]
pub enum CmsError {
    /// Input failed structural or per-field checks.
    Validation(Vec<FieldError>),
    /// Resource by id/slug does not exist.
    NotFound { resource: String, id: String },
    /// Unique constraint violation (duplicate slug, duplicate relation).
    Conflict(String),
    /// Delete refused because of an enforced relation policy.
    Restrict(String),
    /// Unauthorized or forbidden; delegated to the collaborator.
    Auth(String),
    /// Underlying DB failure (timeout, constraint, connection loss).
    Storage(diesel::result::Error),
    /// Plugin lifecycle error (bad manifest, bad config, init/enable failure).
    Plugin(String),
    /// Migration up or down failure.
    Migration(String),
    /// Filter-hook error when strategy is `stop`.
    Hook(String),
    /// Webhook retry ceiling reached.
    WebhookTerminal { webhook_id: String, event: String },
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmsError::Validation(errors) => {
                write!(f, "validation failed: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", e.path, e.message)?;
                }
                Ok(())
            }
            CmsError::NotFound { resource, id } => write!(f, "{} '{}' not found", resource, id),
            CmsError::Conflict(msg) => write!(f, "conflict: {}", msg),
            CmsError::Restrict(msg) => write!(f, "delete restricted: {}", msg),
            CmsError::Auth(msg) => write!(f, "auth error: {}", msg),
            CmsError::Storage(e) => write!(f, "storage error: {}", e),
            CmsError::Plugin(msg) => write!(f, "plugin error: {}", msg),
            CmsError::Migration(msg) => write!(f, "migration error: {}", msg),
            CmsError::Hook(msg) => write!(f, "hook error: {}", msg),
            CmsError::WebhookTerminal { webhook_id, event } => write!(
                f,
                "webhook {} exhausted retries delivering {}",
                webhook_id, event
            ),
        }
    }
}

impl std::error::Error for CmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CmsError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<diesel::result::Error> for CmsError {
    fn from(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) = e {
            return CmsError::Conflict(info.message().to_string());
        }
        if matches!(e, DieselError::NotFound) {
            return CmsError::NotFound {
                resource: "record".to_string(),
                id: "unknown".to_string(),
            };
        }
        CmsError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = CmsError::Validation(vec![FieldError::new("title", "is required")]);
        assert_eq!(err.to_string(), "validation failed: title: is required");
    }

    #[test]
    fn test_not_found_display() {
        let err = CmsError::NotFound {
            resource: "content".to_string(),
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "content 'abc' not found");
    }

    #[test]
    fn test_from_diesel_not_found() {
        let err: CmsError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, CmsError::NotFound { .. }));
    }
}
