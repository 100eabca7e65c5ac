/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Blueprint models: the schema definitions that shape Content Items.
//!
//! A blueprint's `fields` and `settings` are persisted as JSON columns rather
//! than normalized tables — the field list is ordered, heterogeneous, and
//! mutated as a unit, which maps far more naturally onto a JSON document than
//! a join.

use crate::schema::blueprints;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default status assigned to newly created content when a blueprint doesn't
/// override it.
pub const DEFAULT_STATUS_DRAFT: &str = "draft";

/// Access levels a blueprint's content may be exposed under.
pub const API_ACCESS_PUBLIC: &str = "public";
pub const API_ACCESS_AUTHENTICATED: &str = "authenticated";
pub const API_ACCESS_PRIVATE: &str = "private";

pub const VALID_API_ACCESS: &[&str] = &[
    API_ACCESS_PUBLIC,
    API_ACCESS_AUTHENTICATED,
    API_ACCESS_PRIVATE,
];

pub const VALID_CONTENT_STATUSES: &[&str] = &["draft", "published", "archived"];

/// A single ordered validation rule attached to a field definition.
///
/// `params` is intentionally untyped: its shape depends on `kind` (e.g.
/// `minLength`/`maxLength`/`pattern` for text, `min`/`max` for number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationRule {
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// UI hints the core round-trips but never interprets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldUiHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

/// One field in a blueprint's ordered field list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub validation: Vec<ValidationRule>,
    #[serde(default)]
    pub ui: FieldUiHints,
}

/// Blueprint-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlueprintSettings {
    #[serde(default)]
    pub draft_mode: bool,
    #[serde(default)]
    pub versioning: bool,
    #[serde(default = "default_status")]
    pub default_status: String,
    #[serde(default = "default_api_access")]
    pub api_access: String,
}

fn default_status() -> String {
    DEFAULT_STATUS_DRAFT.to_string()
}

fn default_api_access() -> String {
    API_ACCESS_PRIVATE.to_string()
}

impl Default for BlueprintSettings {
    fn default() -> Self {
        Self {
            draft_mode: false,
            versioning: false,
            default_status: default_status(),
            api_access: default_api_access(),
        }
    }
}

/// A blueprint record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = blueprints)]
pub struct Blueprint {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub fields: serde_json::Value,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blueprint {
    /// Deserializes the stored `fields` JSON into the ordered field list.
    ///
    /// A malformed column (should not happen absent a hand edit) surfaces as
    /// an empty list rather than a panic; callers that care about the
    /// distinction should read `fields` directly.
    pub fn field_definitions(&self) -> Vec<FieldDefinition> {
        serde_json::from_value(self.fields.clone()).unwrap_or_default()
    }

    /// Deserializes the stored `settings` JSON, falling back to defaults for
    /// any missing key.
    pub fn resolved_settings(&self) -> BlueprintSettings {
        serde_json::from_value(self.settings.clone()).unwrap_or_default()
    }
}

/// A new blueprint to be inserted.
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = blueprints)]
pub struct NewBlueprint {
    pub name: String,
    pub slug: String,
    pub fields: serde_json::Value,
    pub settings: serde_json::Value,
}

impl NewBlueprint {
    /// Builds a new blueprint from a name, slug, and field list, checking the
    /// structural invariants that hold regardless of the field kinds
    /// themselves (name non-empty, slug shape, at least one field, unique
    /// keys). Per-field validation rule semantics belong to the field type
    /// registry, not to this constructor.
    pub fn new(
        name: &str,
        slug: &str,
        fields: Vec<FieldDefinition>,
        settings: BlueprintSettings,
    ) -> Result<Self, String> {
        if name.trim().is_empty() {
            return Err("Blueprint name cannot be empty".to_string());
        }
        if slug.is_empty() || !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(format!("Blueprint slug '{}' must match ^[a-z0-9-]+$", slug));
        }
        if fields.is_empty() {
            return Err("Blueprint must declare at least one field".to_string());
        }
        let mut seen_keys = std::collections::HashSet::new();
        for field in &fields {
            if !seen_keys.insert(field.key.clone()) {
                return Err(format!("Duplicate field key '{}'", field.key));
            }
        }
        if !VALID_API_ACCESS.contains(&settings.api_access.as_str()) {
            return Err(format!(
                "Invalid apiAccess '{}'. Must be one of: {:?}",
                settings.api_access, VALID_API_ACCESS
            ));
        }

        Ok(Self {
            name: name.to_string(),
            slug: slug.to_string(),
            fields: serde_json::to_value(&fields).map_err(|e| e.to_string())?,
            settings: serde_json::to_value(&settings).map_err(|e| e.to_string())?,
        })
    }
}

/// Changeset for updating a blueprint. `updated_at` is always bumped by the
/// DAL, never passed in by callers.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = blueprints)]
pub struct UpdateBlueprint {
    pub name: Option<String>,
    pub fields: Option<serde_json::Value>,
    pub settings: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_field(key: &str) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4().to_string(),
            name: key.to_string(),
            key: key.to_string(),
            kind: "text".to_string(),
            required: false,
            options: serde_json::Value::Null,
            validation: vec![],
            ui: FieldUiHints::default(),
        }
    }

    #[test]
    fn test_new_blueprint_success() {
        let result = NewBlueprint::new(
            "Article",
            "article",
            vec![text_field("title")],
            BlueprintSettings::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_new_blueprint_invalid_slug() {
        let result = NewBlueprint::new(
            "Article",
            "Article Slug!",
            vec![text_field("title")],
            BlueprintSettings::default(),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("must match"));
    }

    #[test]
    fn test_new_blueprint_no_fields() {
        let result = NewBlueprint::new("Article", "article", vec![], BlueprintSettings::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("at least one field"));
    }

    #[test]
    fn test_new_blueprint_duplicate_keys() {
        let result = NewBlueprint::new(
            "Article",
            "article",
            vec![text_field("title"), text_field("title")],
            BlueprintSettings::default(),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Duplicate field key"));
    }

    #[test]
    fn test_new_blueprint_invalid_api_access() {
        let mut settings = BlueprintSettings::default();
        settings.api_access = "everyone".to_string();
        let result = NewBlueprint::new("Article", "article", vec![text_field("title")], settings);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid apiAccess"));
    }

    #[test]
    fn test_blueprint_settings_default() {
        let settings = BlueprintSettings::default();
        assert_eq!(settings.default_status, DEFAULT_STATUS_DRAFT);
        assert_eq!(settings.api_access, API_ACCESS_PRIVATE);
        assert!(!settings.versioning);
    }
}
