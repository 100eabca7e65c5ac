/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Blueprint Engine (component B).
//!
//! Validates an untyped data map against a full blueprint definition,
//! delegating per-field checks to the Field Type Registry (component A).

use crate::error::FieldError;
use crate::fields::FieldRegistry;
use crate::slug;
use formwork_models::models::blueprints::Blueprint;
use serde_json::Value;
use std::collections::HashSet;

pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<String>,
}

/// Flattens a field's ordered validation-rule list into the `{ruleKind:
/// params}` shape the Field Type Registry's handlers expect (e.g. a rule
/// `{kind: "minLength", params: 3}` becomes `{"minLength": 3}`).
fn flatten_rules(rules: &[formwork_models::models::blueprints::ValidationRule]) -> Value {
    let mut map = serde_json::Map::new();
    for rule in rules {
        map.insert(rule.kind.clone(), rule.params.clone());
    }
    Value::Object(map)
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Validates `data` against `blueprint` using `registry` for per-field
/// checks. Never mutates its inputs; deterministic.
pub fn validate(blueprint: &Blueprint, data: &Value, registry: &FieldRegistry) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if blueprint.name.trim().is_empty() {
        errors.push(FieldError::new("", "blueprint name cannot be empty"));
    }
    if !slug::is_valid(&blueprint.slug) {
        errors.push(FieldError::new("", "blueprint slug must match ^[a-z0-9-]+$"));
    }
    let fields = blueprint.field_definitions();
    if fields.is_empty() {
        errors.push(FieldError::new("", "blueprint must declare at least one field"));
    }
    let mut seen_keys = HashSet::new();
    for f in &fields {
        if !seen_keys.insert(f.key.clone()) {
            errors.push(FieldError::new("", format!("duplicate field key '{}'", f.key)));
        }
    }

    if !errors.is_empty() {
        return ValidationResult {
            ok: false,
            errors,
            warnings,
        };
    }

    let data_obj = data.as_object().cloned().unwrap_or_default();

    for field in &fields {
        let value = data_obj.get(&field.key).cloned().unwrap_or(Value::Null);

        if field.required && value_is_empty(&value) {
            errors.push(FieldError::new(&field.key, "is required"));
            continue;
        }

        match registry.lookup(&field.kind) {
            Some(handler) => {
                let rules = flatten_rules(&field.validation);
                let options = field.options.clone();
                for e in handler.validate(&value, &rules, &options) {
                    let path = if e.path.is_empty() {
                        field.key.clone()
                    } else {
                        format!("{}.{}", field.key, e.path)
                    };
                    errors.push(FieldError::new(path, e.message));
                }
            }
            None => errors.push(FieldError::new(&field.key, format!("unknown field kind '{}'", field.kind))),
        }
    }

    let declared: HashSet<&str> = fields.iter().map(|f| f.key.as_str()).collect();
    for key in data_obj.keys() {
        if !declared.contains(key.as_str()) {
            warnings.push(format!("field '{}' is not declared on this blueprint", key));
        }
    }

    ValidationResult {
        ok: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_models::models::blueprints::{BlueprintSettings, FieldDefinition, FieldUiHints, NewBlueprint};
    use serde_json::json;

    fn field(key: &str, kind: &str, required: bool) -> FieldDefinition {
        FieldDefinition {
            id: uuid::Uuid::new_v4().to_string(),
            name: key.to_string(),
            key: key.to_string(),
            kind: kind.to_string(),
            required,
            options: Value::Null,
            validation: vec![],
            ui: FieldUiHints::default(),
        }
    }

    fn sample_blueprint() -> Blueprint {
        let new = NewBlueprint::new(
            "Posts",
            "posts",
            vec![field("title", "text", true), field("body", "textarea", false)],
            BlueprintSettings::default(),
        )
        .unwrap();
        Blueprint {
            id: uuid::Uuid::new_v4(),
            name: new.name,
            slug: new.slug,
            fields: new.fields,
            settings: new.settings,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_valid_data_passes() {
        let blueprint = sample_blueprint();
        let registry = FieldRegistry::with_builtins();
        let result = validate(&blueprint, &json!({"title": "Hello", "body": "World"}), &registry);
        assert!(result.ok);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_missing_required_field_errors() {
        let blueprint = sample_blueprint();
        let registry = FieldRegistry::with_builtins();
        let result = validate(&blueprint, &json!({"body": "World"}), &registry);
        assert!(!result.ok);
        assert!(result.errors.iter().any(|e| e.path == "title"));
    }

    #[test]
    fn test_extra_key_is_warning_not_error() {
        let blueprint = sample_blueprint();
        let registry = FieldRegistry::with_builtins();
        let result = validate(&blueprint, &json!({"title": "Hi", "extra": "x"}), &registry);
        assert!(result.ok);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_absent_key_treated_as_undefined() {
        let blueprint = sample_blueprint();
        let registry = FieldRegistry::with_builtins();
        let result = validate(&blueprint, &json!({"title": "Hi"}), &registry);
        assert!(result.ok);
    }
}
