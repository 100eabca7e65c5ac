/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Content Storage Service (component E).
//!
//! The write/read path for Content Items: validates against a blueprint via
//! the Blueprint Engine, serializes per-field via the Field Type Registry,
//! derives slugs via the Slug Normalizer, and threads every mutation through
//! the Hook Orchestrator's `beforeX`/`afterX` events. Multi-statement writes
//! (create+version, update+version, delete+cascade) run inside a single
//! diesel transaction obtained directly from the pool rather than through the
//! per-entity DAL, since the DAL's accessors each acquire their own
//! connection.

use crate::blueprint_engine;
use crate::dal::DAL;
use crate::error::{CmsError, FieldError};
use crate::fields::FieldRegistry;
use crate::hooks::{ErrorStrategy, HookOrchestrator};
use crate::query::{FilterValue, Operator, PlannedFilter, PlannedQuery, SortDirection};
use crate::slug;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use formwork_models::models::blueprints::Blueprint;
use formwork_models::models::contents::{
    Content, NewContent, UpdateContent, STATUS_ARCHIVED, STATUS_DRAFT, STATUS_PUBLISHED,
};
use formwork_models::models::relations::{Relation, POLICY_CASCADE, POLICY_RESTRICT, POLICY_SET_NULL};
use formwork_models::models::versions::NewVersion;
use formwork_models::models::webhooks::{
    EVENT_CONTENT_AFTER_CREATE, EVENT_CONTENT_AFTER_DELETE, EVENT_CONTENT_AFTER_PUBLISH,
    EVENT_CONTENT_AFTER_UNPUBLISH, EVENT_CONTENT_AFTER_UPDATE,
};
use formwork_models::schema::{contents, relations as relations_schema, versions};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// A page of query results, mirroring the Query Planner's pagination
/// contract back out to the caller.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub items: Vec<Value>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// The Content Storage Service: create/update/publish/unpublish/delete/get/
/// query/rollback over Content Items.
pub struct ContentStorageService<'a> {
    pub dal: &'a DAL,
    pub registry: &'a FieldRegistry,
    pub hooks: &'a HookOrchestrator,
}

impl<'a> ContentStorageService<'a> {
    pub fn new(dal: &'a DAL, registry: &'a FieldRegistry, hooks: &'a HookOrchestrator) -> Self {
        Self { dal, registry, hooks }
    }

    /// Creates a content item under `blueprint_id`.
    ///
    /// Validation failures return as `CmsError::Validation`, never panic.
    /// A duplicate `(blueprint_id, slug)` surfaces through the transaction's
    /// `?` as `CmsError::Conflict` via the blanket diesel error conversion.
    pub async fn create(
        &self,
        blueprint_id: Uuid,
        data: Value,
        explicit_slug: Option<&str>,
        created_by: Option<Uuid>,
    ) -> Result<Content, CmsError> {
        let blueprint = self.dal.blueprints().get(blueprint_id)?.ok_or_else(|| CmsError::NotFound {
            resource: "blueprint".to_string(),
            id: blueprint_id.to_string(),
        })?;

        let validation = blueprint_engine::validate(&blueprint, &data, self.registry);
        if !validation.ok {
            return Err(CmsError::Validation(validation.errors));
        }

        let slug_value = derive_slug(&blueprint, &data, explicit_slug)?;
        let serialized = serialize_for_storage(&blueprint, &data, self.registry);

        let filter_ctx = json!({
            "blueprintId": blueprint_id,
            "slug": slug_value,
            "data": serialized,
            "actor": created_by,
        });
        let filtered = self
            .hooks
            .filter("content:beforeCreate", filter_ctx, ErrorStrategy::Stop)
            .await;
        if !filtered.errors.is_empty() {
            return Err(CmsError::Hook(filtered.errors.join("; ")));
        }
        let final_data = filtered.data.get("data").cloned().unwrap_or(serialized);
        let final_slug = filtered
            .data
            .get("slug")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or(slug_value);

        let settings = blueprint.resolved_settings();
        let new_content = NewContent::new(
            blueprint_id,
            &final_slug,
            final_data.clone(),
            &settings.default_status,
            created_by,
        )
        .map_err(|e| CmsError::Validation(vec![FieldError::new("", e)]))?;

        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        let content: Content = conn.transaction(|conn| {
            let content: Content = diesel::insert_into(contents::table)
                .values(&new_content)
                .get_result(conn)?;
            if settings.versioning {
                let version = NewVersion::initial(content.id, blueprint_id, final_data.clone(), created_by);
                diesel::insert_into(versions::table).values(&version).execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(content)
        })?;

        // Action hooks never roll back a committed write; errors are logged
        // by the orchestrator itself and otherwise ignored here.
        self.hooks
            .emit(EVENT_CONTENT_AFTER_CREATE, json!({"content": &content}), ErrorStrategy::Continue)
            .await;

        Ok(content)
    }

    /// Shallow-merges `patch` onto the existing data, validates the result,
    /// and writes a new version only when the merge actually changed a
    /// declared field.
    pub async fn update(&self, id: Uuid, patch: Value, updated_by: Option<Uuid>) -> Result<Content, CmsError> {
        let existing = self.dal.contents().get(id)?.ok_or_else(|| CmsError::NotFound {
            resource: "content".to_string(),
            id: id.to_string(),
        })?;
        let blueprint = self.dal.blueprints().get(existing.blueprint_id)?.ok_or_else(|| CmsError::NotFound {
            resource: "blueprint".to_string(),
            id: existing.blueprint_id.to_string(),
        })?;

        let mut merged = existing.data.as_object().cloned().unwrap_or_default();
        if let Some(patch_obj) = patch.as_object() {
            for (k, v) in patch_obj {
                merged.insert(k.clone(), v.clone());
            }
        }
        let merged_value = Value::Object(merged);

        let validation = blueprint_engine::validate(&blueprint, &merged_value, self.registry);
        if !validation.ok {
            return Err(CmsError::Validation(validation.errors));
        }

        let serialized = serialize_for_storage(&blueprint, &merged_value, self.registry);
        let changes = diff_declared_fields(&existing.data, &serialized);

        let filter_ctx = json!({"contentId": id, "data": serialized, "changes": &changes});
        let filtered = self
            .hooks
            .filter("content:beforeUpdate", filter_ctx, ErrorStrategy::Stop)
            .await;
        if !filtered.errors.is_empty() {
            return Err(CmsError::Hook(filtered.errors.join("; ")));
        }
        let final_data = filtered.data.get("data").cloned().unwrap_or(serialized);

        let versioning = blueprint.resolved_settings().versioning;
        let change_summary = serde_json::to_string(&changes).unwrap_or_default();

        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        let updated: Content = conn.transaction(|conn| {
            let update_changes = UpdateContent {
                data: Some(final_data.clone()),
                updated_at: Some(Utc::now()),
                ..Default::default()
            };
            let updated: Content = diesel::update(contents::table.filter(contents::id.eq(id)))
                .set(&update_changes)
                .get_result(conn)?;

            if versioning && !changes.is_empty() {
                let prior: Option<i32> = versions::table
                    .filter(versions::content_id.eq(id))
                    .select(diesel::dsl::max(versions::version_number))
                    .first(conn)?;
                let version = match prior {
                    None => NewVersion::initial(id, existing.blueprint_id, final_data.clone(), updated_by),
                    Some(n) => NewVersion::next(
                        id,
                        existing.blueprint_id,
                        final_data.clone(),
                        n,
                        updated_by,
                        change_summary.clone(),
                    )
                    .expect("prior_version_number is always >= 1 once any version exists"),
                };
                diesel::insert_into(versions::table).values(&version).execute(conn)?;
            }
            Ok::<_, diesel::result::Error>(updated)
        })?;

        self.hooks
            .emit(
                EVENT_CONTENT_AFTER_UPDATE,
                json!({"content": &updated, "changes": changes}),
                ErrorStrategy::Continue,
            )
            .await;

        Ok(updated)
    }

    /// Publishes a content item. Idempotent: publishing an already-published
    /// item is a no-op and fires no event.
    pub async fn publish(&self, id: Uuid, published_by: Option<Uuid>) -> Result<Content, CmsError> {
        let existing = self.dal.contents().get(id)?.ok_or_else(|| CmsError::NotFound {
            resource: "content".to_string(),
            id: id.to_string(),
        })?;
        if existing.status == STATUS_PUBLISHED {
            return Ok(existing);
        }

        let filtered = self
            .hooks
            .filter("content:beforePublish", json!({"contentId": id}), ErrorStrategy::Stop)
            .await;
        if !filtered.errors.is_empty() {
            return Err(CmsError::Hook(filtered.errors.join("; ")));
        }

        let changes = UpdateContent {
            status: Some(STATUS_PUBLISHED.to_string()),
            published_at: Some(Some(Utc::now())),
            published_by: Some(published_by),
            ..Default::default()
        };
        let updated = self.dal.contents().update(id, changes)?;

        self.hooks
            .emit(EVENT_CONTENT_AFTER_PUBLISH, json!({"content": &updated}), ErrorStrategy::Continue)
            .await;

        Ok(updated)
    }

    /// Unpublishes a content item back to `draft`. Idempotent in the same
    /// way as `publish`.
    pub async fn unpublish(&self, id: Uuid) -> Result<Content, CmsError> {
        let existing = self.dal.contents().get(id)?.ok_or_else(|| CmsError::NotFound {
            resource: "content".to_string(),
            id: id.to_string(),
        })?;
        if existing.status != STATUS_PUBLISHED {
            return Ok(existing);
        }

        let filtered = self
            .hooks
            .filter("content:beforeUnpublish", json!({"contentId": id}), ErrorStrategy::Stop)
            .await;
        if !filtered.errors.is_empty() {
            return Err(CmsError::Hook(filtered.errors.join("; ")));
        }

        let changes = UpdateContent {
            status: Some(STATUS_DRAFT.to_string()),
            ..Default::default()
        };
        let updated = self.dal.contents().update(id, changes)?;

        self.hooks
            .emit(EVENT_CONTENT_AFTER_UNPUBLISH, json!({"content": &updated}), ErrorStrategy::Continue)
            .await;

        Ok(updated)
    }

    /// Archives a content item from either `draft` or `published`. No
    /// webhook-subscribable event is defined for this transition.
    pub async fn archive(&self, id: Uuid) -> Result<Content, CmsError> {
        let existing = self.dal.contents().get(id)?.ok_or_else(|| CmsError::NotFound {
            resource: "content".to_string(),
            id: id.to_string(),
        })?;
        if existing.status == STATUS_ARCHIVED {
            return Ok(existing);
        }
        let changes = UpdateContent {
            status: Some(STATUS_ARCHIVED.to_string()),
            ..Default::default()
        };
        self.dal.contents().update(id, changes).map_err(CmsError::from)
    }

    /// Deletes a content item, resolving every incoming relation's deletion
    /// policy first: `restrict` aborts the whole operation (nothing is
    /// deleted), `cascade` recursively deletes the referencing content
    /// depth-first, `set-null` just removes the offending edge. The whole
    /// resolution runs inside one transaction so a `restrict` discovered
    /// partway through a cascade rolls back everything already deleted.
    pub async fn delete(&self, id: Uuid) -> Result<(), CmsError> {
        let conn = &mut self.dal.pool.get().expect("Failed to get DB connection");
        conn.transaction(|conn| {
            let mut visited = HashSet::new();
            delete_recursive(conn, id, &mut visited)
        })?;

        self.hooks
            .emit(EVENT_CONTENT_AFTER_DELETE, json!({"contentId": id}), ErrorStrategy::Continue)
            .await;

        Ok(())
    }

    /// Retrieves a content item, optionally expanding relation fields named
    /// in `populate` by batching a single lookup per distinct set of
    /// referenced ids, then threading the result through the `afterGet`
    /// filter chain (used by plugins to attach synthetic fields).
    pub async fn get(&self, id: Uuid, populate: &[String]) -> Result<Value, CmsError> {
        let content = self.dal.contents().get(id)?.ok_or_else(|| CmsError::NotFound {
            resource: "content".to_string(),
            id: id.to_string(),
        })?;

        let mut result = serde_json::to_value(&content).unwrap_or_else(|_| json!({}));
        if !populate.is_empty() {
            self.populate_relations(&mut result, populate)?;
        }

        let filtered = self.hooks.filter("content:afterGet", result, ErrorStrategy::Continue).await;
        Ok(filtered.data)
    }

    fn populate_relations(&self, result: &mut Value, populate: &[String]) -> Result<(), CmsError> {
        let Some(data) = result.get_mut("data").and_then(|d| d.as_object_mut()) else {
            return Ok(());
        };

        let mut ids_needed: HashSet<Uuid> = HashSet::new();
        for key in populate {
            if let Some(value) = data.get(key) {
                collect_relation_ids(value, &mut ids_needed);
            }
        }
        if ids_needed.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = ids_needed.into_iter().collect();
        let fetched = self.dal.contents().get_many(&ids)?;
        let by_id: HashMap<Uuid, &Content> = fetched.iter().map(|c| (c.id, c)).collect();

        for key in populate {
            if let Some(value) = data.get(key).cloned() {
                data.insert(key.clone(), expand_relation_value(&value, &by_id));
            }
        }
        Ok(())
    }

    /// Applies the Query Planner's filters, sort, and pagination over a
    /// blueprint's content set in memory — there is no push-down query
    /// engine; see the blueprint-scoped DAL listing this reads from.
    pub async fn query(&self, blueprint_id: Uuid, planned: &PlannedQuery) -> Result<QueryResult, CmsError> {
        let blueprint = self.dal.blueprints().get(blueprint_id)?.ok_or_else(|| CmsError::NotFound {
            resource: "blueprint".to_string(),
            id: blueprint_id.to_string(),
        })?;
        let known_fields: HashSet<String> = blueprint
            .field_definitions()
            .into_iter()
            .map(|f| f.key)
            .chain(["id", "slug", "status", "createdAt", "updatedAt", "publishedAt"].iter().map(|s| s.to_string()))
            .collect();

        let items = self.dal.contents().list_by_blueprint(blueprint_id)?;
        let mut matched: Vec<&Content> = items
            .iter()
            .filter(|c| planned.filters.iter().all(|f| matches_filter(c, f)))
            .collect();

        for clause in planned.sort.iter().rev() {
            if !known_fields.contains(&clause.field) {
                tracing::warn!(
                    "query sort field '{}' is not declared on blueprint '{}'; ignoring",
                    clause.field,
                    blueprint.slug
                );
                continue;
            }
            matched.sort_by(|a, b| {
                let ordering = compare_for_sort(&field_value(a, &clause.field), &field_value(b, &clause.field));
                if clause.direction == SortDirection::Desc {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let total = matched.len() as i64;
        let total_pages = if planned.limit > 0 { (total + planned.limit - 1) / planned.limit } else { 0 };
        let start = ((planned.page - 1) * planned.limit).max(0) as usize;
        let page_items: Vec<Value> = matched
            .into_iter()
            .skip(start)
            .take(planned.limit.max(0) as usize)
            .map(|c| project_fields(c, &planned.fields))
            .collect();

        Ok(QueryResult {
            items: page_items,
            page: planned.page,
            limit: planned.limit,
            total,
            total_pages,
        })
    }

    /// Loads version `version_number` and re-runs it through `update`,
    /// producing a new version rather than deleting anything after it —
    /// rollback never erases history.
    pub async fn rollback(
        &self,
        id: Uuid,
        version_number: i32,
        performed_by: Option<Uuid>,
    ) -> Result<Content, CmsError> {
        let version = self.dal.versions().get(id, version_number)?.ok_or_else(|| CmsError::NotFound {
            resource: "version".to_string(),
            id: format!("{}@{}", id, version_number),
        })?;
        self.update(id, version.data, performed_by).await
    }
}

fn delete_recursive(conn: &mut PgConnection, id: Uuid, visited: &mut HashSet<Uuid>) -> Result<(), CmsError> {
    if !visited.insert(id) {
        return Ok(());
    }

    let incoming: Vec<Relation> = relations_schema::table
        .filter(relations_schema::target_content_id.eq(id))
        .load(conn)
        .map_err(CmsError::from)?;

    for rel in &incoming {
        match rel.deletion_policy() {
            POLICY_RESTRICT => {
                return Err(CmsError::Restrict(format!(
                    "content {} is referenced by {} via a restrict relation",
                    id, rel.source_content_id
                )));
            }
            POLICY_CASCADE => delete_recursive(conn, rel.source_content_id, visited)?,
            POLICY_SET_NULL => {
                diesel::delete(relations_schema::table.filter(relations_schema::id.eq(rel.id)))
                    .execute(conn)
                    .map_err(CmsError::from)?;
            }
            _ => {}
        }
    }

    diesel::delete(
        relations_schema::table.filter(
            relations_schema::source_content_id
                .eq(id)
                .or(relations_schema::target_content_id.eq(id)),
        ),
    )
    .execute(conn)
    .map_err(CmsError::from)?;

    diesel::delete(versions::table.filter(versions::content_id.eq(id)))
        .execute(conn)
        .map_err(CmsError::from)?;

    diesel::delete(contents::table.filter(contents::id.eq(id)))
        .execute(conn)
        .map_err(CmsError::from)?;

    Ok(())
}

/// Derives a slug for a new content item: an explicit slug must already
/// match the slug grammar; absent one, a `title` field's value is
/// normalized, falling back to the blueprint's own name.
fn derive_slug(blueprint: &Blueprint, data: &Value, explicit: Option<&str>) -> Result<String, CmsError> {
    if let Some(s) = explicit {
        return if slug::is_valid(s) {
            Ok(s.to_string())
        } else {
            Err(CmsError::Validation(vec![FieldError::new("slug", "must match ^[a-z0-9-]+$")]))
        };
    }

    let title_value = blueprint
        .field_definitions()
        .into_iter()
        .find(|f| f.key == "title")
        .and_then(|f| data.get(&f.key).and_then(|v| v.as_str()).map(String::from))
        .filter(|s| !s.trim().is_empty());

    let source = title_value.unwrap_or_else(|| blueprint.name.clone());
    let normalized = slug::normalize(&source);
    if normalized.is_empty() {
        Err(CmsError::Validation(vec![FieldError::new(
            "slug",
            "could not derive a slug from the title field or blueprint name",
        )]))
    } else {
        Ok(normalized)
    }
}

/// Serializes `data` per the blueprint's declared fields, dropping any key
/// not declared on the blueprint and filling declared-but-absent fields with
/// the field kind's default.
fn serialize_for_storage(blueprint: &Blueprint, data: &Value, registry: &FieldRegistry) -> Value {
    let data_obj = data.as_object();
    let mut out = Map::new();
    for field in blueprint.field_definitions() {
        let raw = data_obj.and_then(|o| o.get(&field.key)).cloned().unwrap_or(Value::Null);
        let value = match registry.lookup(&field.kind) {
            Some(handler) => {
                let raw = if raw.is_null() { handler.default_value(&field.options) } else { raw };
                handler.serialize(&raw)
            }
            None => raw,
        };
        out.insert(field.key.clone(), value);
    }
    Value::Object(out)
}

/// Produces a `{field, old, new}` entry for every declared field whose
/// serialized value changed between the prior and the new data.
fn diff_declared_fields(old: &Value, new: &Value) -> Vec<Value> {
    let old_obj = old.as_object().cloned().unwrap_or_default();
    let new_obj = new.as_object().cloned().unwrap_or_default();
    let mut keys: HashSet<&String> = old_obj.keys().collect();
    keys.extend(new_obj.keys());
    let mut sorted_keys: Vec<&String> = keys.into_iter().collect();
    sorted_keys.sort();

    sorted_keys
        .into_iter()
        .filter_map(|key| {
            let old_v = old_obj.get(key).cloned().unwrap_or(Value::Null);
            let new_v = new_obj.get(key).cloned().unwrap_or(Value::Null);
            if old_v == new_v {
                None
            } else {
                Some(json!({"field": key, "old": old_v, "new": new_v}))
            }
        })
        .collect()
}

fn collect_relation_ids(value: &Value, out: &mut HashSet<Uuid>) {
    match value {
        Value::String(s) => {
            if let Ok(uuid) = Uuid::parse_str(s) {
                out.insert(uuid);
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_relation_ids(v, out)),
        _ => {}
    }
}

fn expand_relation_value(value: &Value, by_id: &HashMap<Uuid, &Content>) -> Value {
    match value {
        Value::String(s) => Uuid::parse_str(s)
            .ok()
            .and_then(|uuid| by_id.get(&uuid))
            .map(|c| serde_json::to_value(c).unwrap_or(Value::Null))
            .unwrap_or_else(|| value.clone()),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| expand_relation_value(v, by_id)).collect()),
        other => other.clone(),
    }
}

fn field_value(content: &Content, field: &str) -> Value {
    match field {
        "id" => json!(content.id),
        "slug" => json!(content.slug),
        "status" => json!(content.status),
        "createdAt" => json!(content.created_at),
        "updatedAt" => json!(content.updated_at),
        "publishedAt" => json!(content.published_at),
        other => content.data.get(other).cloned().unwrap_or(Value::Null),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_eq(actual: &Value, raw: &str) -> bool {
    as_text(actual) == raw
}

fn compare_to_raw(actual: &Value, raw: &str) -> Ordering {
    if let (Some(a), Ok(b)) = (actual.as_f64(), raw.parse::<f64>()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    as_text(actual).as_str().cmp(raw)
}

fn matches_filter(content: &Content, filter: &PlannedFilter) -> bool {
    let actual = field_value(content, &filter.field);
    match (filter.op, &filter.value) {
        (Operator::Eq, FilterValue::Single(v)) => value_eq(&actual, v),
        (Operator::Ne, FilterValue::Single(v)) => !value_eq(&actual, v),
        (Operator::In, FilterValue::List(vs)) => vs.iter().any(|v| value_eq(&actual, v)),
        (Operator::Nin, FilterValue::List(vs)) => !vs.iter().any(|v| value_eq(&actual, v)),
        (Operator::Gt, FilterValue::Single(v)) => compare_to_raw(&actual, v) == Ordering::Greater,
        (Operator::Gte, FilterValue::Single(v)) => compare_to_raw(&actual, v) != Ordering::Less,
        (Operator::Lt, FilterValue::Single(v)) => compare_to_raw(&actual, v) == Ordering::Less,
        (Operator::Lte, FilterValue::Single(v)) => compare_to_raw(&actual, v) != Ordering::Greater,
        (Operator::Contains, FilterValue::Single(v)) => as_text(&actual).contains(v.as_str()),
        (Operator::StartsWith, FilterValue::Single(v)) => as_text(&actual).starts_with(v.as_str()),
        (Operator::EndsWith, FilterValue::Single(v)) => as_text(&actual).ends_with(v.as_str()),
        _ => true,
    }
}

fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    as_text(a).cmp(&as_text(b))
}

fn project_fields(content: &Content, fields: &Option<Vec<String>>) -> Value {
    let mut value = serde_json::to_value(content).unwrap_or_else(|_| json!({}));
    if let Some(allowed) = fields {
        if let Some(data_obj) = value.get_mut("data").and_then(|d| d.as_object_mut()) {
            let allowed_set: HashSet<&str> = allowed.iter().map(String::as_str).collect();
            data_obj.retain(|k, _| allowed_set.contains(k.as_str()));
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_content(data: Value) -> Content {
        Content {
            id: Uuid::new_v4(),
            blueprint_id: Uuid::new_v4(),
            slug: "hello-world".to_string(),
            data,
            meta: None,
            status: STATUS_DRAFT.to_string(),
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            published_at: None,
            published_by: None,
        }
    }

    #[test]
    fn test_diff_declared_fields_only_changed_keys() {
        let old = json!({"title": "Old", "body": "same"});
        let new = json!({"title": "New", "body": "same"});
        let changes = diff_declared_fields(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["field"], "title");
    }

    #[test]
    fn test_diff_declared_fields_no_changes() {
        let old = json!({"title": "Same"});
        let new = json!({"title": "Same"});
        assert!(diff_declared_fields(&old, &new).is_empty());
    }

    #[test]
    fn test_matches_filter_eq() {
        let content = sample_content(json!({"title": "Hello"}));
        let filter = PlannedFilter {
            field: "title".to_string(),
            op: Operator::Eq,
            value: FilterValue::Single("Hello".to_string()),
        };
        assert!(matches_filter(&content, &filter));
    }

    #[test]
    fn test_matches_filter_gte_numeric() {
        let content = sample_content(json!({"age": 21}));
        let filter = PlannedFilter {
            field: "age".to_string(),
            op: Operator::Gte,
            value: FilterValue::Single("18".to_string()),
        };
        assert!(matches_filter(&content, &filter));
    }

    #[test]
    fn test_matches_filter_in_list() {
        let content = sample_content(json!({}));
        let filter = PlannedFilter {
            field: "status".to_string(),
            op: Operator::In,
            value: FilterValue::List(vec!["draft".to_string(), "published".to_string()]),
        };
        assert!(matches_filter(&content, &filter));
    }

    #[test]
    fn test_project_fields_filters_data_keys() {
        let content = sample_content(json!({"title": "Hi", "body": "Text"}));
        let projected = project_fields(&content, &Some(vec!["title".to_string()]));
        let data = projected.get("data").unwrap();
        assert!(data.get("title").is_some());
        assert!(data.get("body").is_none());
    }

    #[test]
    fn test_project_fields_none_keeps_all() {
        let content = sample_content(json!({"title": "Hi", "body": "Text"}));
        let projected = project_fields(&content, &None);
        let data = projected.get("data").unwrap();
        assert!(data.get("title").is_some());
        assert!(data.get("body").is_some());
    }

    #[test]
    fn test_collect_relation_ids_scalar_and_array() {
        let id1 = Uuid::new_v4();
        let id2 = Uuid::new_v4();
        let value = json!([id1.to_string(), id2.to_string()]);
        let mut out = HashSet::new();
        collect_relation_ids(&value, &mut out);
        assert_eq!(out.len(), 2);
        assert!(out.contains(&id1));
    }
}
