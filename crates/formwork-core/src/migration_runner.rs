/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Migration Runner (component I).
//!
//! Distinct from schema provisioning (out of scope — owned by whatever
//! applies the DDL behind `formwork_models::schema`): these are
//! content-level data migrations — registered in-process, identified by a
//! timestamp-prefixed id, applied in id order, and tracked in the
//! `migrations` table via `dal::migrations`.

use crate::dal::DAL;
use crate::error::CmsError;
use diesel::prelude::*;
use diesel::PgConnection;
use formwork_models::models::migrations::NewMigrationRecord;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

pub type MigrationFn = Arc<dyn Fn(&mut PgConnection) -> Result<(), String> + Send + Sync>;

/// A single content-level migration. `down` is optional — migrations
/// without one can be applied but never rolled back.
#[derive(Clone)]
pub struct Migration {
    pub id: String,
    pub name: String,
    pub up: MigrationFn,
    pub down: Option<MigrationFn>,
}

/// What happened during a `migrate`/`rollback` run.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub applied: Vec<String>,
    pub rolled_back: Vec<String>,
    pub errors: Vec<(String, String)>,
}

/// Holds the registered migrations and drives them against a DAL.
pub struct MigrationRunner {
    dal: DAL,
    migrations: Vec<Migration>,
}

impl MigrationRunner {
    pub fn new(dal: DAL) -> Self {
        Self {
            dal,
            migrations: Vec::new(),
        }
    }

    /// Registers a migration. Order of registration doesn't matter — ids
    /// are sorted lexically (and so chronologically, given the
    /// timestamp-prefixed convention) before every run.
    pub fn register(&mut self, migration: Migration) {
        self.migrations.push(migration);
        self.migrations.sort_by(|a, b| a.id.cmp(&b.id));
    }

    /// Applies every registered migration not yet recorded as applied, in
    /// id order. With `stop_on_error` set, the first failure halts the run
    /// and leaves the remaining migrations pending; otherwise the runner
    /// records the failure and continues to the next one.
    ///
    /// `transactional`, combined with `stop_on_error`, runs every pending
    /// migration inside a single shared transaction instead of one per
    /// migration: any failure rolls back the whole batch, leaving nothing
    /// partially applied. Without `stop_on_error` each migration still needs
    /// its own commit/rollback boundary, so `transactional` has no effect in
    /// that case.
    pub fn migrate(&self, stop_on_error: bool, transactional: bool) -> Result<MigrationReport, CmsError> {
        if transactional && stop_on_error {
            return self.migrate_batched();
        }

        let applied_ids: HashSet<String> = self
            .dal
            .migrations()
            .list_applied()?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut report = MigrationReport::default();

        for migration in self.migrations.iter().filter(|m| !applied_ids.contains(&m.id)) {
            let mut conn = self.dal.pool.get().expect("Failed to get DB connection");
            let start = Instant::now();

            let result: Result<(), CmsError> = conn.transaction(|conn| {
                (migration.up)(conn).map_err(CmsError::Migration)
            });

            match result {
                Ok(()) => {
                    let elapsed_ms = start.elapsed().as_millis() as i32;
                    let record = NewMigrationRecord::new(&migration.id, &migration.name, elapsed_ms)
                        .map_err(CmsError::Migration)?;
                    self.dal.migrations().record_applied(&record)?;
                    report.applied.push(migration.id.clone());
                }
                Err(e) => {
                    report.errors.push((migration.id.clone(), e.to_string()));
                    if stop_on_error {
                        return Ok(report);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Runs every pending migration's `up` inside one shared transaction,
    /// rolling back the entire batch on the first failure.
    fn migrate_batched(&self) -> Result<MigrationReport, CmsError> {
        let applied_ids: HashSet<String> = self
            .dal
            .migrations()
            .list_applied()?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut report = MigrationReport::default();
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| !applied_ids.contains(&m.id)).collect();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut conn = self.dal.pool.get().expect("Failed to get DB connection");
        let result: Result<Vec<(String, String, i32)>, CmsError> = conn.transaction(|conn| {
            let mut applied = Vec::new();
            for migration in &pending {
                let start = Instant::now();
                (migration.up)(conn).map_err(CmsError::Migration)?;
                applied.push((migration.id.clone(), migration.name.clone(), start.elapsed().as_millis() as i32));
            }
            Ok(applied)
        });

        match result {
            Ok(applied) => {
                for (id, name, elapsed_ms) in applied {
                    let record = NewMigrationRecord::new(&id, &name, elapsed_ms).map_err(CmsError::Migration)?;
                    self.dal.migrations().record_applied(&record)?;
                    report.applied.push(id);
                }
            }
            Err(e) => {
                report.errors.push(("batch".to_string(), e.to_string()));
            }
        }

        Ok(report)
    }

    /// Rolls back the `n` most recently applied migrations, newest first.
    /// A migration with no `down` callback, or one no longer registered,
    /// is recorded as an error; with `stop_on_error` set this halts the
    /// rest of the batch.
    pub fn rollback(&self, n: usize, stop_on_error: bool) -> Result<MigrationReport, CmsError> {
        let mut applied = self.dal.migrations().list_applied()?;
        applied.reverse();
        applied.truncate(n);

        let mut report = MigrationReport::default();

        for record in applied {
            let migration = match self.migrations.iter().find(|m| m.id == record.id) {
                Some(m) => m,
                None => {
                    report
                        .errors
                        .push((record.id.clone(), "migration is no longer registered".to_string()));
                    if stop_on_error {
                        return Ok(report);
                    }
                    continue;
                }
            };

            let down = match &migration.down {
                Some(f) => f,
                None => {
                    report
                        .errors
                        .push((record.id.clone(), "migration has no down callback".to_string()));
                    if stop_on_error {
                        return Ok(report);
                    }
                    continue;
                }
            };

            let mut conn = self.dal.pool.get().expect("Failed to get DB connection");
            let result: Result<(), CmsError> = conn.transaction(|conn| down(conn).map_err(CmsError::Migration));

            match result {
                Ok(()) => {
                    self.dal.migrations().remove_applied(&record.id)?;
                    report.rolled_back.push(record.id.clone());
                }
                Err(e) => {
                    report.errors.push((record.id.clone(), e.to_string()));
                    if stop_on_error {
                        return Ok(report);
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_migration(id: &str) -> Migration {
        Migration {
            id: id.to_string(),
            name: format!("migration {}", id),
            up: Arc::new(|_conn| Ok(())),
            down: Some(Arc::new(|_conn| Ok(()))),
        }
    }

    #[test]
    fn test_register_sorts_by_id() {
        let mut runner_migrations = vec![noop_migration("20260201000000_b"), noop_migration("20260101000000_a")];
        runner_migrations.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(runner_migrations[0].id, "20260101000000_a");
        assert_eq!(runner_migrations[1].id, "20260201000000_b");
    }

    #[test]
    fn test_migration_report_default_is_empty() {
        let report = MigrationReport::default();
        assert!(report.applied.is_empty());
        assert!(report.rolled_back.is_empty());
        assert!(report.errors.is_empty());
    }
}
