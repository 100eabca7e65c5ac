/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Plugin Manager (component G).
//!
//! A plugin is a manifest plus an optional set of lifecycle callbacks
//! (`init`, `enable`, `reconfigure`, `disable`, `destroy`). `load` walks the
//! manifest through structural validation, duplicate-id rejection, forward
//! config migration, and post-migration schema validation before handing the
//! plugin a runtime context and running `init` then `enable`. The manager
//! does not track what hooks a plugin registered on the orchestrator — a
//! plugin's own `disable`/`destroy` callbacks are responsible for
//! unsubscribing anything they added.

use crate::dal::DAL;
use crate::error::CmsError;
use crate::fields::FieldRegistry;
use crate::hooks::HookOrchestrator;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use formwork_models::models::plugin_configs::NewPluginConfig;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub type LifecycleCallback = Arc<dyn Fn(Arc<PluginRuntimeContext>) -> BoxFuture<Result<(), String>> + Send + Sync>;
pub type ConfigMigrationFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+").unwrap());

/// A single forward config migration: applies when the stored `__version`
/// stamp equals `from_version`, producing `to_version`.
#[derive(Clone)]
pub struct ConfigMigration {
    pub from_version: u32,
    pub to_version: u32,
    pub apply: ConfigMigrationFn,
}

/// A plugin's static declaration: identity, compatibility constraints, and
/// its config's shape.
#[derive(Clone, Default)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub version: String,
    pub dependencies: Vec<String>,
    pub incompatible_with: Vec<String>,
    pub engine: Option<String>,
    pub config_schema: Option<Value>,
    pub migrations: Vec<ConfigMigration>,
}

/// The optional lifecycle hooks a plugin may implement. Every callback
/// receives the same runtime context and returns an error string on
/// failure; an absent callback is a no-op.
#[derive(Clone, Default)]
pub struct PluginLifecycle {
    pub init: Option<LifecycleCallback>,
    pub enable: Option<LifecycleCallback>,
    pub reconfigure: Option<LifecycleCallback>,
    pub disable: Option<LifecycleCallback>,
    pub destroy: Option<LifecycleCallback>,
}

/// A plugin ready to be loaded: its manifest plus its lifecycle.
#[derive(Clone, Default)]
pub struct Plugin {
    pub manifest: PluginManifest,
    pub lifecycle: PluginLifecycle,
}

/// What a plugin's lifecycle callbacks are handed at call time: its own
/// manifest and resolved config, plus the shared registries it may act
/// against. Scoped logging is done through `tracing`'s span machinery by
/// the caller, not carried as a field here.
pub struct PluginRuntimeContext {
    pub manifest: PluginManifest,
    pub config: Value,
    pub hooks: Arc<HookOrchestrator>,
    pub registry: Arc<FieldRegistry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Loading,
    Active,
    Disabling,
    Disabled,
    Error,
}

struct LoadedPlugin {
    manifest: PluginManifest,
    lifecycle: PluginLifecycle,
    config: Value,
    state: PluginState,
}

/// The Plugin Manager: tracks loaded plugins by manifest id and drives their
/// lifecycle and config persistence.
pub struct PluginManager {
    dal: DAL,
    hooks: Arc<HookOrchestrator>,
    registry: Arc<FieldRegistry>,
    plugins: RwLock<HashMap<String, LoadedPlugin>>,
}

impl PluginManager {
    pub fn new(dal: DAL, hooks: Arc<HookOrchestrator>, registry: Arc<FieldRegistry>) -> Self {
        Self {
            dal,
            hooks,
            registry,
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// The lifecycle state of a loaded plugin, if it's tracked at all.
    pub fn state_of(&self, id: &str) -> Option<PluginState> {
        self.plugins.read().unwrap().get(id).map(|p| p.state)
    }

    /// Loads and activates a plugin. On any failure the plugin is left out
    /// of the active set (or marked `Error` if it had already begun its
    /// lifecycle), never partially active.
    pub async fn load(&self, plugin: Plugin, raw_config: Value) -> Result<(), CmsError> {
        validate_manifest(&plugin.manifest)?;

        if self.plugins.read().unwrap().contains_key(&plugin.manifest.id) {
            return Err(CmsError::Plugin(format!("plugin '{}' is already loaded", plugin.manifest.id)));
        }

        let migrated_config = apply_config_migrations(&plugin.manifest, raw_config);

        if let Some(schema) = &plugin.manifest.config_schema {
            validate_against_schema(schema, &migrated_config).map_err(|e| {
                CmsError::Plugin(format!(
                    "config for plugin '{}' failed schema validation: {}",
                    plugin.manifest.id, e
                ))
            })?;
        }

        let new_config = NewPluginConfig::new(&plugin.manifest.id, migrated_config.clone(), "default")
            .map_err(CmsError::Plugin)?;
        self.dal.plugin_configs().upsert(&new_config)?;

        let id = plugin.manifest.id.clone();
        self.plugins.write().unwrap().insert(
            id.clone(),
            LoadedPlugin {
                manifest: plugin.manifest.clone(),
                lifecycle: plugin.lifecycle.clone(),
                config: migrated_config.clone(),
                state: PluginState::Loading,
            },
        );

        let context = Arc::new(PluginRuntimeContext {
            manifest: plugin.manifest.clone(),
            config: migrated_config,
            hooks: self.hooks.clone(),
            registry: self.registry.clone(),
        });

        if let Err(e) = run_lifecycle(&plugin.lifecycle.init, context.clone()).await {
            self.set_state(&id, PluginState::Error);
            return Err(CmsError::Plugin(format!("plugin '{}' init failed: {}", id, e)));
        }
        if let Err(e) = run_lifecycle(&plugin.lifecycle.enable, context).await {
            self.set_state(&id, PluginState::Error);
            return Err(CmsError::Plugin(format!("plugin '{}' enable failed: {}", id, e)));
        }

        self.set_state(&id, PluginState::Active);
        Ok(())
    }

    /// Merges `partial` onto a loaded plugin's stored config, revalidates
    /// against its schema, persists, and invokes its `reconfigure` callback.
    pub async fn reconfigure(&self, id: &str, partial: Value) -> Result<(), CmsError> {
        let (manifest, lifecycle, merged) = {
            let plugins = self.plugins.read().unwrap();
            let loaded = plugins
                .get(id)
                .ok_or_else(|| CmsError::Plugin(format!("plugin '{}' is not loaded", id)))?;
            let mut merged = loaded.config.as_object().cloned().unwrap_or_default();
            if let Some(patch) = partial.as_object() {
                for (k, v) in patch {
                    merged.insert(k.clone(), v.clone());
                }
            }
            (loaded.manifest.clone(), loaded.lifecycle.clone(), Value::Object(merged))
        };

        if let Some(schema) = &manifest.config_schema {
            validate_against_schema(schema, &merged).map_err(|e| {
                CmsError::Plugin(format!("config for plugin '{}' failed schema validation: {}", id, e))
            })?;
        }

        let new_config = NewPluginConfig::new(id, merged.clone(), "default").map_err(CmsError::Plugin)?;
        self.dal.plugin_configs().upsert(&new_config)?;

        let context = Arc::new(PluginRuntimeContext {
            manifest,
            config: merged.clone(),
            hooks: self.hooks.clone(),
            registry: self.registry.clone(),
        });
        run_lifecycle(&lifecycle.reconfigure, context)
            .await
            .map_err(|e| CmsError::Plugin(format!("plugin '{}' reconfigure failed: {}", id, e)))?;

        if let Some(loaded) = self.plugins.write().unwrap().get_mut(id) {
            loaded.config = merged;
        }
        Ok(())
    }

    /// Disables then destroys a plugin and drops it from the active set.
    pub async fn unload(&self, id: &str) -> Result<(), CmsError> {
        let (manifest, lifecycle, config) = {
            let mut plugins = self.plugins.write().unwrap();
            let loaded = plugins
                .get_mut(id)
                .ok_or_else(|| CmsError::Plugin(format!("plugin '{}' is not loaded", id)))?;
            loaded.state = PluginState::Disabling;
            (loaded.manifest.clone(), loaded.lifecycle.clone(), loaded.config.clone())
        };

        let context = Arc::new(PluginRuntimeContext {
            manifest,
            config,
            hooks: self.hooks.clone(),
            registry: self.registry.clone(),
        });

        run_lifecycle(&lifecycle.disable, context.clone())
            .await
            .map_err(|e| CmsError::Plugin(format!("plugin '{}' disable failed: {}", id, e)))?;
        run_lifecycle(&lifecycle.destroy, context)
            .await
            .map_err(|e| CmsError::Plugin(format!("plugin '{}' destroy failed: {}", id, e)))?;

        self.plugins.write().unwrap().remove(id);
        self.dal.plugin_configs().delete(id)?;
        Ok(())
    }

    fn set_state(&self, id: &str, state: PluginState) {
        if let Some(loaded) = self.plugins.write().unwrap().get_mut(id) {
            loaded.state = state;
        }
    }
}

async fn run_lifecycle(callback: &Option<LifecycleCallback>, context: Arc<PluginRuntimeContext>) -> Result<(), String> {
    match callback {
        Some(f) => f(context).await,
        None => Ok(()),
    }
}

/// Structural checks that hold regardless of any particular plugin's
/// config schema: non-empty id/name, a dotted numeric version.
fn validate_manifest(manifest: &PluginManifest) -> Result<(), CmsError> {
    if manifest.id.trim().is_empty() {
        return Err(CmsError::Plugin("plugin manifest is missing an id".to_string()));
    }
    if manifest.name.trim().is_empty() {
        return Err(CmsError::Plugin(format!("plugin '{}' is missing a name", manifest.id)));
    }
    if !VERSION_PATTERN.is_match(&manifest.version) {
        return Err(CmsError::Plugin(format!(
            "plugin '{}' has a malformed version '{}'",
            manifest.id, manifest.version
        )));
    }
    Ok(())
}

/// Walks a plugin's config forward through its migration chain, starting
/// from the stored `__version` stamp (0 if absent), until no further
/// migration applies, then restamps the current version.
fn apply_config_migrations(manifest: &PluginManifest, raw_config: Value) -> Value {
    let mut config = raw_config;
    let mut version = config.get("__version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;

    while let Some(migration) = manifest.migrations.iter().find(|m| m.from_version == version) {
        config = (migration.apply)(config);
        version = migration.to_version;
    }

    match config {
        Value::Object(mut obj) => {
            obj.insert("__version".to_string(), json!(version));
            Value::Object(obj)
        }
        other => other,
    }
}

fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), String> {
    let compiled = jsonschema::JSONSchema::compile(schema).map_err(|e| e.to_string())?;
    match compiled.validate(instance) {
        Ok(()) => Ok(()),
        Err(errors) => Err(errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_manifest() -> PluginManifest {
        PluginManifest {
            id: "seo-toolkit".to_string(),
            name: "SEO Toolkit".to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_manifest_rejects_empty_id() {
        let mut manifest = sample_manifest();
        manifest.id = String::new();
        assert!(validate_manifest(&manifest).is_err());
    }

    #[test]
    fn test_validate_manifest_rejects_bad_version() {
        let mut manifest = sample_manifest();
        manifest.version = "not-a-version".to_string();
        assert!(validate_manifest(&manifest).is_err());
    }

    #[test]
    fn test_validate_manifest_accepts_well_formed() {
        assert!(validate_manifest(&sample_manifest()).is_ok());
    }

    #[test]
    fn test_apply_config_migrations_walks_chain() {
        let manifest = PluginManifest {
            migrations: vec![
                ConfigMigration {
                    from_version: 0,
                    to_version: 1,
                    apply: Arc::new(|mut v| {
                        v["renamed"] = v.get("old").cloned().unwrap_or(Value::Null);
                        v
                    }),
                },
                ConfigMigration {
                    from_version: 1,
                    to_version: 2,
                    apply: Arc::new(|v| v),
                },
            ],
            ..sample_manifest()
        };
        let result = apply_config_migrations(&manifest, json!({"old": "value"}));
        assert_eq!(result["renamed"], json!("value"));
        assert_eq!(result["__version"], json!(2));
    }

    #[test]
    fn test_apply_config_migrations_no_match_leaves_config_stamped() {
        let manifest = sample_manifest();
        let result = apply_config_migrations(&manifest, json!({"a": 1}));
        assert_eq!(result["__version"], json!(0));
        assert_eq!(result["a"], json!(1));
    }

    #[test]
    fn test_validate_against_schema_rejects_mismatch() {
        let schema = json!({"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}});
        assert!(validate_against_schema(&schema, &json!({})).is_err());
        assert!(validate_against_schema(&schema, &json!({"name": "x"})).is_ok());
    }
}
