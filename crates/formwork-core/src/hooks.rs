/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Hook Orchestrator (component D).
//!
//! Two registries sharing a shape (action handlers via `on`, filter
//! handlers via `add_filter`) and two execution entry points (`emit`,
//! `filter`): a priority-ordered, pluggable hook system that a single
//! mpsc-channel webhook dispatcher would have been too narrow to express.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub type ActionCallback = Arc<dyn Fn(Value) -> BoxFuture<Result<(), String>> + Send + Sync>;
pub type FilterCallback = Arc<dyn Fn(Value) -> BoxFuture<Result<Value, String>> + Send + Sync>;

/// Named priority levels; ties are broken by registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
    Custom(i64),
}

impl Priority {
    fn weight(self) -> i64 {
        match self {
            Priority::Low => 10,
            Priority::Normal => 50,
            Priority::High => 100,
            Priority::Critical => 1000,
            Priority::Custom(w) => w,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Whether a handler error aborts the dispatch or is merely collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStrategy {
    Stop,
    Continue,
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        ErrorStrategy::Continue
    }
}

#[derive(Clone)]
struct ActionHandler {
    id: u64,
    index: u64,
    priority: i64,
    once: bool,
    callback: ActionCallback,
}

#[derive(Clone)]
struct FilterHandler {
    id: u64,
    index: u64,
    priority: i64,
    once: bool,
    callback: FilterCallback,
}

fn sort_by_priority_then_index<T>(handlers: &mut [T], priority: impl Fn(&T) -> i64, index: impl Fn(&T) -> u64) {
    handlers.sort_by(|a, b| priority(b).cmp(&priority(a)).then(index(a).cmp(&index(b))));
}

/// A token identifying a single registered handler, returned by `on`/
/// `add_filter` in place of an unsubscribe closure (idiomatic for this
/// language's ownership model).
#[derive(Debug, Clone, Copy)]
pub struct Subscription {
    pub event: &'static str,
    pub id: u64,
}

pub struct EmitOutcome {
    pub executed: usize,
    pub errors: Vec<String>,
}

pub struct FilterOutcome {
    pub data: Value,
    pub errors: Vec<String>,
}

/// The Hook Orchestrator: action (`emit`) and filter (`filter`) dispatch
/// over priority-ordered handler lists.
#[derive(Default)]
pub struct HookOrchestrator {
    actions: RwLock<HashMap<String, Vec<ActionHandler>>>,
    filters: RwLock<HashMap<String, Vec<FilterHandler>>>,
    next_index: AtomicU64,
    next_id: AtomicU64,
}

impl HookOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&self) -> u64 {
        self.next_index.fetch_add(1, Ordering::SeqCst)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Registers an action-hook handler for `event`.
    pub fn on(&self, event: &str, priority: Priority, once: bool, callback: ActionCallback) -> u64 {
        let id = self.next_id();
        let handler = ActionHandler {
            id,
            index: self.next_index(),
            priority: priority.weight(),
            once,
            callback,
        };
        let mut actions = self.actions.write().unwrap();
        actions.entry(event.to_string()).or_default().push(handler);
        id
    }

    /// Registers a filter-hook handler for `event`.
    pub fn add_filter(&self, event: &str, priority: Priority, once: bool, callback: FilterCallback) -> u64 {
        let id = self.next_id();
        let handler = FilterHandler {
            id,
            index: self.next_index(),
            priority: priority.weight(),
            once,
            callback,
        };
        let mut filters = self.filters.write().unwrap();
        filters.entry(event.to_string()).or_default().push(handler);
        id
    }

    /// Removes a single handler by id from either registry for `event`.
    pub fn unsubscribe(&self, event: &str, id: u64) {
        if let Some(list) = self.actions.write().unwrap().get_mut(event) {
            list.retain(|h| h.id != id);
        }
        if let Some(list) = self.filters.write().unwrap().get_mut(event) {
            list.retain(|h| h.id != id);
        }
    }

    /// Removes all handlers on `event` whose callback pointer equals
    /// `callback` (reference equality, not structural), to prevent
    /// accumulation when a plugin re-registers the same callback.
    pub fn off(&self, event: &str, callback: &ActionCallback) {
        if let Some(list) = self.actions.write().unwrap().get_mut(event) {
            list.retain(|h| !Arc::ptr_eq(&h.callback, callback));
        }
    }

    /// Removes all filter handlers on `event` whose callback pointer equals
    /// `callback` (reference equality, not structural) — the `add_filter`
    /// counterpart to `off`.
    pub fn off_filter(&self, event: &str, callback: &FilterCallback) {
        if let Some(list) = self.filters.write().unwrap().get_mut(event) {
            list.retain(|h| !Arc::ptr_eq(&h.callback, callback));
        }
    }

    /// Drops every registered handler in both registries.
    pub fn clear(&self) {
        self.actions.write().unwrap().clear();
        self.filters.write().unwrap().clear();
    }

    /// Dispatches action handlers for `event`.
    ///
    /// `Stop`: sequential, priority-then-index order; the first failing
    /// handler aborts the rest and its error is returned as the sole entry.
    /// `Continue` (default): all handlers run concurrently; errors are
    /// collected, never raised. `once` handlers are identified at dispatch
    /// start and removed only after every handler has completed.
    pub async fn emit(&self, event: &str, context: Value, strategy: ErrorStrategy) -> EmitOutcome {
        let mut snapshot = {
            let actions = self.actions.read().unwrap();
            actions.get(event).cloned().unwrap_or_default()
        };
        sort_by_priority_then_index(&mut snapshot, |h| h.priority, |h| h.index);

        let once_ids: Vec<u64> = snapshot.iter().filter(|h| h.once).map(|h| h.id).collect();

        let outcome = match strategy {
            ErrorStrategy::Stop => {
                let mut executed = 0;
                let mut errors = Vec::new();
                for handler in &snapshot {
                    match (handler.callback)(context.clone()).await {
                        Ok(()) => executed += 1,
                        Err(e) => {
                            error!("action hook '{}' failed (stop strategy): {}", event, e);
                            errors.push(e);
                            break;
                        }
                    }
                }
                EmitOutcome { executed, errors }
            }
            ErrorStrategy::Continue => {
                let futures: Vec<_> = snapshot
                    .iter()
                    .map(|h| {
                        let fut = (h.callback)(context.clone());
                        tokio::spawn(fut)
                    })
                    .collect();
                let mut executed = 0;
                let mut errors = Vec::new();
                for f in futures {
                    match f.await {
                        Ok(Ok(())) => executed += 1,
                        Ok(Err(e)) => {
                            debug!("action hook '{}' failed (continue strategy): {}", event, e);
                            errors.push(e);
                        }
                        Err(join_err) => errors.push(join_err.to_string()),
                    }
                }
                EmitOutcome { executed, errors }
            }
        };

        if !once_ids.is_empty() {
            if let Some(list) = self.actions.write().unwrap().get_mut(event) {
                list.retain(|h| !once_ids.contains(&h.id));
            }
        }

        outcome
    }

    /// Threads `data` sequentially through filter handlers for `event` in
    /// priority-then-index order. A failing handler either stops the chain
    /// (`Stop`) or is skipped, preserving the pre-chain data (`Continue`).
    pub async fn filter(&self, event: &str, data: Value, strategy: ErrorStrategy) -> FilterOutcome {
        let mut snapshot = {
            let filters = self.filters.read().unwrap();
            filters.get(event).cloned().unwrap_or_default()
        };
        sort_by_priority_then_index(&mut snapshot, |h| h.priority, |h| h.index);

        let once_ids: Vec<u64> = snapshot.iter().filter(|h| h.once).map(|h| h.id).collect();

        let mut current = data;
        let mut errors = Vec::new();
        for handler in &snapshot {
            match (handler.callback)(current.clone()).await {
                Ok(next) => current = next,
                Err(e) => {
                    errors.push(e.clone());
                    if strategy == ErrorStrategy::Stop {
                        if !once_ids.is_empty() {
                            if let Some(list) = self.filters.write().unwrap().get_mut(event) {
                                list.retain(|h| !once_ids.contains(&h.id));
                            }
                        }
                        return FilterOutcome { data: current, errors };
                    }
                    // Continue strategy: skip this handler, data unchanged.
                }
            }
        }

        if !once_ids.is_empty() {
            if let Some(list) = self.filters.write().unwrap().get_mut(event) {
                list.retain(|h| !once_ids.contains(&h.id));
            }
        }

        FilterOutcome { data: current, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use serde_json::json;

    fn action_callback(counter: Arc<AtomicUsize>) -> ActionCallback {
        Arc::new(move |_ctx| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    #[tokio::test]
    async fn test_emit_continue_invokes_all_handlers_once() {
        let orchestrator = HookOrchestrator::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            orchestrator.on("content:afterCreate", Priority::Normal, false, action_callback(counter.clone()));
        }
        let outcome = orchestrator
            .emit("content:afterCreate", json!({}), ErrorStrategy::Continue)
            .await;
        assert_eq!(outcome.executed, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_emit_stop_aborts_on_first_error() {
        let orchestrator = HookOrchestrator::new();
        let ran: Arc<RwLock<Vec<u32>>> = Arc::new(RwLock::new(Vec::new()));

        let ran1 = ran.clone();
        orchestrator.on(
            "evt",
            Priority::High,
            false,
            Arc::new(move |_| {
                let ran1 = ran1.clone();
                Box::pin(async move {
                    ran1.write().unwrap().push(1);
                    Err("boom".to_string())
                })
            }),
        );
        let ran2 = ran.clone();
        orchestrator.on(
            "evt",
            Priority::Low,
            false,
            Arc::new(move |_| {
                let ran2 = ran2.clone();
                Box::pin(async move {
                    ran2.write().unwrap().push(2);
                    Ok(())
                })
            }),
        );

        let outcome = orchestrator.emit("evt", json!({}), ErrorStrategy::Stop).await;
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(*ran.read().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_once_handler_removed_after_emit() {
        let orchestrator = HookOrchestrator::new();
        let counter = Arc::new(AtomicUsize::new(0));
        orchestrator.on("evt", Priority::Normal, true, action_callback(counter.clone()));

        orchestrator.emit("evt", json!({}), ErrorStrategy::Continue).await;
        orchestrator.emit("evt", json!({}), ErrorStrategy::Continue).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_filter_chain_threads_data() {
        let orchestrator = HookOrchestrator::new();
        orchestrator.add_filter(
            "content:beforeCreate",
            Priority::Normal,
            false,
            Arc::new(|data: Value| {
                Box::pin(async move {
                    let mut data = data;
                    data["step1"] = json!(true);
                    Ok(data)
                })
            }),
        );
        orchestrator.add_filter(
            "content:beforeCreate",
            Priority::Normal,
            false,
            Arc::new(|data: Value| {
                Box::pin(async move {
                    let mut data = data;
                    data["step2"] = json!(true);
                    Ok(data)
                })
            }),
        );

        let outcome = orchestrator
            .filter("content:beforeCreate", json!({}), ErrorStrategy::Stop)
            .await;
        assert_eq!(outcome.data, json!({"step1": true, "step2": true}));
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_filter_continue_preserves_data_on_error() {
        let orchestrator = HookOrchestrator::new();
        orchestrator.add_filter(
            "evt",
            Priority::Normal,
            false,
            Arc::new(|_data: Value| Box::pin(async move { Err("bad".to_string()) })),
        );

        let outcome = orchestrator
            .filter("evt", json!({"original": true}), ErrorStrategy::Continue)
            .await;
        assert_eq!(outcome.data, json!({"original": true}));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_off_removes_all_matching_callback_registrations() {
        let orchestrator = HookOrchestrator::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let callback = action_callback(counter.clone());
        orchestrator.on("evt", Priority::Normal, false, callback.clone());
        orchestrator.on("evt", Priority::Normal, false, callback.clone());

        orchestrator.off("evt", &callback);
        let outcome = orchestrator.emit("evt", json!({}), ErrorStrategy::Continue).await;
        assert_eq!(outcome.executed, 0);
    }

    #[tokio::test]
    async fn test_off_filter_removes_all_matching_callback_registrations() {
        let orchestrator = HookOrchestrator::new();
        let callback: FilterCallback = Arc::new(|data: Value| Box::pin(async move { Ok(data) }));
        orchestrator.add_filter("evt", Priority::Normal, false, callback.clone());
        orchestrator.add_filter("evt", Priority::Normal, false, callback.clone());

        orchestrator.off_filter("evt", &callback);
        let outcome = orchestrator
            .filter("evt", json!({"original": true}), ErrorStrategy::Continue)
            .await;
        assert_eq!(outcome.data, json!({"original": true}));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_priority_weights() {
        assert_eq!(Priority::Low.weight(), 10);
        assert_eq!(Priority::Normal.weight(), 50);
        assert_eq!(Priority::High.weight(), 100);
        assert_eq!(Priority::Critical.weight(), 1000);
    }
}
