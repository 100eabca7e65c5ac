/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Field Type Registry (component A).
//!
//! Provides, for each closed field kind, `validate`/`serialize`/
//! `deserialize`/`default`. Built-ins are registered at startup; plugins may
//! add further kinds via `register` but may not override a built-in.

use crate::error::FieldError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A field-kind handler. Implementations must not panic on malformed input;
/// validation failures are returned as data, never raised.
pub trait FieldHandler: Send + Sync {
    fn validate(&self, value: &Value, rules: &Value, options: &Value) -> Vec<FieldError>;
    fn serialize(&self, value: &Value) -> Value;
    fn deserialize(&self, raw: &Value) -> Value;
    fn default_value(&self, options: &Value) -> Value;
}

fn is_empty_string(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty()) || matches!(value, Value::Null)
}

fn rule_usize(rules: &Value, key: &str) -> Option<u64> {
    rules.get(key).and_then(|v| v.as_u64())
}

fn rule_f64(rules: &Value, key: &str) -> Option<f64> {
    rules.get(key).and_then(|v| v.as_f64())
}

fn rule_str<'a>(rules: &'a Value, key: &str) -> Option<&'a str> {
    rules.get(key).and_then(|v| v.as_str())
}

struct TextHandler {
    multiline: bool,
}

impl FieldHandler for TextHandler {
    fn validate(&self, value: &Value, rules: &Value, _options: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let text = match value.as_str() {
            Some(s) => s,
            None if value.is_null() => "",
            None => {
                errors.push(FieldError::new("", "expected a string"));
                return errors;
            }
        };
        if let Some(min) = rule_usize(rules, "minLength") {
            if (text.chars().count() as u64) < min {
                errors.push(FieldError::new("", format!("must be at least {} characters", min)));
            }
        }
        if let Some(max) = rule_usize(rules, "maxLength") {
            if (text.chars().count() as u64) > max {
                errors.push(FieldError::new("", format!("must be at most {} characters", max)));
            }
        }
        if let Some(pattern) = rule_str(rules, "pattern") {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(text) {
                        errors.push(FieldError::new("", "does not match required pattern"));
                    }
                }
                Err(_) => {
                    errors.push(FieldError::new("", "configured pattern rule is invalid"));
                }
            }
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        match value.as_str() {
            Some(s) => Value::String(s.trim().to_string()),
            None => value.clone(),
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

struct NumberHandler;

impl FieldHandler for NumberHandler {
    fn validate(&self, value: &Value, rules: &Value, _options: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if value.is_null() {
            return errors;
        }
        let n = match value.as_f64() {
            Some(n) => n,
            None => {
                errors.push(FieldError::new("", "expected a number"));
                return errors;
            }
        };
        if let Some(min) = rule_f64(rules, "min") {
            if n < min {
                errors.push(FieldError::new("", format!("must be at least {}", min)));
            }
        }
        if let Some(max) = rule_f64(rules, "max") {
            if n > max {
                errors.push(FieldError::new("", format!("must be at most {}", max)));
            }
        }
        if rules.get("integer").and_then(|v| v.as_bool()).unwrap_or(false) && n.fract() != 0.0 {
            errors.push(FieldError::new("", "must be an integer"));
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Null
    }
}

struct BooleanHandler;

impl FieldHandler for BooleanHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        if value.is_null() || is_empty_string(value) || value.is_boolean() {
            Vec::new()
        } else {
            vec![FieldError::new("", "expected a boolean")]
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        if is_empty_string(value) {
            Value::Null
        } else {
            value.clone()
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Null
    }
}

struct DateHandler;

impl FieldHandler for DateHandler {
    fn validate(&self, value: &Value, rules: &Value, _options: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if is_empty_string(value) {
            return errors;
        }
        let text = match value.as_str() {
            Some(s) => s,
            None => {
                errors.push(FieldError::new("", "expected an ISO-8601 date string"));
                return errors;
            }
        };
        let parsed = chrono::DateTime::parse_from_rfc3339(text)
            .map(|d| d.timestamp())
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").map(|d| d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp())
            });
        let ts = match parsed {
            Ok(ts) => ts,
            Err(_) => {
                errors.push(FieldError::new("", "not a valid ISO-8601 date"));
                return errors;
            }
        };
        if let Some(min) = rule_str(rules, "minDate") {
            if let Ok(min_dt) = chrono::DateTime::parse_from_rfc3339(min) {
                if ts < min_dt.timestamp() {
                    errors.push(FieldError::new("", format!("must be on or after {}", min)));
                }
            }
        }
        if let Some(max) = rule_str(rules, "maxDate") {
            if let Ok(max_dt) = chrono::DateTime::parse_from_rfc3339(max) {
                if ts > max_dt.timestamp() {
                    errors.push(FieldError::new("", format!("must be on or before {}", max)));
                }
            }
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        if is_empty_string(value) {
            Value::Null
        } else {
            value.clone()
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Null
    }
}

struct SlugHandler;

impl FieldHandler for SlugHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if is_empty_string(value) {
            return errors;
        }
        match value.as_str() {
            Some(s) if crate::slug::is_valid(s) => {}
            Some(_) => errors.push(FieldError::new("", "must match ^[a-z0-9-]+$")),
            None => errors.push(FieldError::new("", "expected a string")),
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        match value.as_str() {
            Some(s) => Value::String(s.to_lowercase()),
            None => value.clone(),
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

struct EmailHandler;

impl FieldHandler for EmailHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        if is_empty_string(value) {
            return Vec::new();
        }
        match value.as_str() {
            Some(s) if EMAIL_PATTERN.is_match(s) => Vec::new(),
            _ => vec![FieldError::new("", "must be a valid email address")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        match value.as_str() {
            Some(s) => Value::String(s.to_lowercase()),
            None => value.clone(),
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

struct UrlHandler;

impl FieldHandler for UrlHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        if is_empty_string(value) {
            return Vec::new();
        }
        match value.as_str() {
            Some(s) if url::Url::parse(s).is_ok() => Vec::new(),
            _ => vec![FieldError::new("", "must be a valid absolute URL")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

struct SelectHandler;

fn allowed_option_values(options: &Value) -> Vec<String> {
    options
        .get("options")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| o.get("value").and_then(|v| v.as_str()).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

impl FieldHandler for SelectHandler {
    fn validate(&self, value: &Value, _rules: &Value, options: &Value) -> Vec<FieldError> {
        if is_empty_string(value) {
            return Vec::new();
        }
        let allowed = allowed_option_values(options);
        match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => Vec::new(),
            _ => vec![FieldError::new("", "value is not one of the allowed options")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

struct MultiselectHandler;

impl FieldHandler for MultiselectHandler {
    fn validate(&self, value: &Value, _rules: &Value, options: &Value) -> Vec<FieldError> {
        let arr = match value.as_array() {
            Some(a) => a,
            None if value.is_null() => return Vec::new(),
            None => return vec![FieldError::new("", "expected an array of strings")],
        };
        let allowed = allowed_option_values(options);
        let mut errors = Vec::new();
        for v in arr {
            match v.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => {}
                _ => {
                    errors.push(FieldError::new("", "contains a value not in the allowed set"));
                    break;
                }
            }
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Array(Vec::new())
    }
}

struct JsonHandler;

impl FieldHandler for JsonHandler {
    fn validate(&self, _value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        Vec::new()
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        match raw {
            Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
            other => other.clone(),
        }
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Null
    }
}

struct MediaHandler;

impl FieldHandler for MediaHandler {
    fn validate(&self, value: &Value, _rules: &Value, options: &Value) -> Vec<FieldError> {
        let multiple = options.get("multiple").and_then(|v| v.as_bool()).unwrap_or(false);
        if multiple {
            match value {
                Value::Array(_) | Value::Null => Vec::new(),
                _ => vec![FieldError::new("", "expected an array of media ids")],
            }
        } else {
            match value {
                Value::String(_) | Value::Null => Vec::new(),
                _ => vec![FieldError::new("", "expected a single media id")],
            }
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, options: &Value) -> Value {
        let multiple = options.get("multiple").and_then(|v| v.as_bool()).unwrap_or(false);
        if multiple {
            Value::Array(Vec::new())
        } else {
            Value::Null
        }
    }
}

struct RelationHandler;

impl FieldHandler for RelationHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        // endpoint existence is checked by the Content Storage Service, not here.
        match value {
            Value::Object(_) | Value::Array(_) | Value::Null => Vec::new(),
            _ => vec![FieldError::new("", "expected a relation reference")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, options: &Value) -> Value {
        let many = options
            .get("type")
            .and_then(|v| v.as_str())
            .map(|t| t != "one-to-one")
            .unwrap_or(false);
        if many {
            Value::Array(Vec::new())
        } else {
            Value::Null
        }
    }
}

static COLOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

struct ColorHandler;

impl FieldHandler for ColorHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        if is_empty_string(value) {
            return Vec::new();
        }
        match value.as_str() {
            Some(s) if COLOR_PATTERN.is_match(s) => Vec::new(),
            _ => vec![FieldError::new("", "must be a #RRGGBB hex color")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        match value.as_str() {
            Some(s) => Value::String(s.to_uppercase()),
            None => value.clone(),
        }
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

struct LocationHandler;

impl FieldHandler for LocationHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        if value.is_null() {
            return Vec::new();
        }
        let mut errors = Vec::new();
        let lat = value.get("lat").and_then(|v| v.as_f64());
        let lng = value.get("lng").and_then(|v| v.as_f64());
        match lat {
            Some(lat) if (-90.0..=90.0).contains(&lat) => {}
            Some(_) => errors.push(FieldError::new("lat", "must be between -90 and 90")),
            None => errors.push(FieldError::new("lat", "is required")),
        }
        match lng {
            Some(lng) if (-180.0..=180.0).contains(&lng) => {}
            Some(_) => errors.push(FieldError::new("lng", "must be between -180 and 180")),
            None => errors.push(FieldError::new("lng", "is required")),
        }
        errors
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::Null
    }
}

struct ReferenceHandler;

impl FieldHandler for ReferenceHandler {
    fn validate(&self, value: &Value, _rules: &Value, _options: &Value) -> Vec<FieldError> {
        match value {
            Value::String(_) | Value::Null => Vec::new(),
            _ => vec![FieldError::new("", "expected a string reference")],
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        value.clone()
    }

    fn deserialize(&self, raw: &Value) -> Value {
        raw.clone()
    }

    fn default_value(&self, _options: &Value) -> Value {
        Value::String(String::new())
    }
}

/// The Field Type Registry: a lookup from field kind name to handler.
pub struct FieldRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn FieldHandler>>>,
    builtin_kinds: Vec<&'static str>,
}

impl FieldRegistry {
    /// Builds a registry pre-populated with the closed set of built-in kinds.
    pub fn with_builtins() -> Self {
        let mut handlers: HashMap<String, Arc<dyn FieldHandler>> = HashMap::new();
        handlers.insert("text".into(), Arc::new(TextHandler { multiline: false }));
        handlers.insert("textarea".into(), Arc::new(TextHandler { multiline: true }));
        handlers.insert("rich-text".into(), Arc::new(TextHandler { multiline: true }));
        handlers.insert("number".into(), Arc::new(NumberHandler));
        handlers.insert("boolean".into(), Arc::new(BooleanHandler));
        handlers.insert("date".into(), Arc::new(DateHandler));
        handlers.insert("datetime".into(), Arc::new(DateHandler));
        handlers.insert("slug".into(), Arc::new(SlugHandler));
        handlers.insert("email".into(), Arc::new(EmailHandler));
        handlers.insert("url".into(), Arc::new(UrlHandler));
        handlers.insert("select".into(), Arc::new(SelectHandler));
        handlers.insert("multiselect".into(), Arc::new(MultiselectHandler));
        handlers.insert("json".into(), Arc::new(JsonHandler));
        handlers.insert("media".into(), Arc::new(MediaHandler));
        handlers.insert("relation".into(), Arc::new(RelationHandler));
        handlers.insert("color".into(), Arc::new(ColorHandler));
        handlers.insert("location".into(), Arc::new(LocationHandler));
        handlers.insert("reference".into(), Arc::new(ReferenceHandler));

        let builtin_kinds = handlers.keys().cloned().collect::<Vec<_>>();
        let builtin_kinds: Vec<&'static str> = builtin_kinds
            .into_iter()
            .map(|s| Box::leak(s.into_boxed_str()) as &'static str)
            .collect();

        Self {
            handlers: RwLock::new(handlers),
            builtin_kinds,
        }
    }

    /// Registers an additional field kind. Rejects attempts to override a
    /// built-in kind.
    pub fn register(&self, kind: &str, handler: Arc<dyn FieldHandler>) -> Result<(), String> {
        if self.builtin_kinds.contains(&kind) {
            return Err(format!("cannot override built-in field kind '{}'", kind));
        }
        self.handlers.write().unwrap().insert(kind.to_string(), handler);
        Ok(())
    }

    /// Looks up a handler by kind name.
    pub fn lookup(&self, kind: &str) -> Option<Arc<dyn FieldHandler>> {
        self.handlers.read().unwrap().get(kind).cloned()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_kinds_present() {
        let registry = FieldRegistry::with_builtins();
        for kind in [
            "text", "textarea", "rich-text", "number", "boolean", "date", "datetime", "slug",
            "email", "url", "select", "multiselect", "json", "media", "relation", "color",
            "location", "reference",
        ] {
            assert!(registry.lookup(kind).is_some(), "missing kind {}", kind);
        }
    }

    #[test]
    fn test_cannot_override_builtin() {
        let registry = FieldRegistry::with_builtins();
        let result = registry.register("text", Arc::new(NumberHandler));
        assert!(result.is_err());
    }

    #[test]
    fn test_register_new_kind() {
        let registry = FieldRegistry::with_builtins();
        registry.register("custom", Arc::new(NumberHandler)).unwrap();
        assert!(registry.lookup("custom").is_some());
    }

    #[test]
    fn test_boolean_empty_string_is_no_value_not_false() {
        let handler = BooleanHandler;
        assert_eq!(handler.serialize(&json!("")), Value::Null);
    }

    #[test]
    fn test_text_pattern_invalid_regex_is_field_error_not_panic() {
        let handler = TextHandler { multiline: false };
        let errors = handler.validate(&json!("abc"), &json!({"pattern": "(unterminated"}), &json!({}));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_email_autovalidates_without_rules() {
        let handler = EmailHandler;
        assert!(handler.validate(&json!("not-an-email"), &json!({}), &json!({})).len() == 1);
        assert!(handler.validate(&json!("a@b.com"), &json!({}), &json!({})).is_empty());
    }

    #[test]
    fn test_url_autovalidates_without_rules() {
        let handler = UrlHandler;
        assert!(handler.validate(&json!("not a url"), &json!({}), &json!({})).len() == 1);
        assert!(handler
            .validate(&json!("https://example.com"), &json!({}), &json!({}))
            .is_empty());
    }

    #[test]
    fn test_select_value_not_in_options() {
        let handler = SelectHandler;
        let options = json!({"options": [{"value": "a"}, {"value": "b"}]});
        assert!(handler.validate(&json!("c"), &json!({}), &options).len() == 1);
        assert!(handler.validate(&json!("a"), &json!({}), &options).is_empty());
    }

    #[test]
    fn test_location_bounds() {
        let handler = LocationHandler;
        assert!(handler
            .validate(&json!({"lat": 100.0, "lng": 0.0}), &json!({}), &json!({}))
            .len()
            == 1);
        assert!(handler
            .validate(&json!({"lat": 45.0, "lng": -120.0}), &json!({}), &json!({}))
            .is_empty());
    }

    #[test]
    fn test_json_deserialize_parse_failure_yields_null() {
        let handler = JsonHandler;
        assert_eq!(handler.deserialize(&json!("not json")), Value::Null);
    }
}
