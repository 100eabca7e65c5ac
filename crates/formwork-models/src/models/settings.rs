/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Runtime settings models: a flat key/value store for values that live in
//! the database rather than the static config layer (e.g. values editable
//! from an admin surface at runtime).

use crate::schema::settings;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A runtime setting record as stored.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = settings, primary_key(key))]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

/// A new setting to be inserted, or upserted by key.
#[derive(Debug, Clone, Insertable, AsChangeset, Serialize, Deserialize)]
#[diesel(table_name = settings)]
pub struct NewSetting {
    pub key: String,
    pub value: serde_json::Value,
}

impl NewSetting {
    pub fn new(key: &str, value: serde_json::Value) -> Result<Self, String> {
        if key.trim().is_empty() {
            return Err("Setting key cannot be empty".to_string());
        }
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_setting_success() {
        let setting = NewSetting::new("default_locale", serde_json::json!("en")).unwrap();
        assert_eq!(setting.key, "default_locale");
    }

    #[test]
    fn test_new_setting_empty_key() {
        let result = NewSetting::new("", serde_json::json!(null));
        assert!(result.is_err());
    }
}
