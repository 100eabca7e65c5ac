/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Utility functions and structures for the Formwork core.
//!
//! This module contains helper functions used throughout the crate: audit
//! logging, background tasks, prefixed API key generation, and first-run
//! bootstrap of an admin account.

use crate::dal::DAL;
use formwork_models::models::api_keys::NewApiKey;
use formwork_models::models::users::{NewUser, ROLE_ADMIN};
use formwork_utils::config::Settings;
use std::fs;
use std::path::Path;
use tokio::sync::oneshot;
use tracing::info;

pub mod audit;
pub mod background_tasks;
pub mod pak;

/// Waits for a shutdown signal, then performs cleanup.
pub async fn shutdown(shutdown_rx: oneshot::Receiver<()>) {
    let _ = shutdown_rx.await;
    let _ = fs::remove_file("/tmp/key.txt");
}

/// Performs first-time startup: if no admin user exists yet, creates one
/// along with an API key and writes the raw key to a temporary file so an
/// operator can retrieve it once.
pub fn first_startup(dal: &DAL, config: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    pak::create_pak_controller(Some(config))?;

    let existing_admin = dal
        .users()
        .list()?
        .into_iter()
        .find(|u| u.role == ROLE_ADMIN);

    if existing_admin.is_some() {
        return Ok(());
    }

    upsert_admin(dal)
}

/// Creates the initial admin user and API key.
fn upsert_admin(dal: &DAL) -> Result<(), Box<dyn std::error::Error>> {
    let (raw_key, hash) = pak::create_pak()?;

    let placeholder_password_hash = pak::create_pak()?.1;
    let new_user = NewUser::new("admin@localhost", &placeholder_password_hash, ROLE_ADMIN)?;
    let admin = dal.users().create(&new_user)?;

    let key_prefix = raw_key
        .rsplit_once('_')
        .map(|(head, _long_token)| head.to_string())
        .unwrap_or_else(|| raw_key.clone());
    let new_key = NewApiKey::new(admin.id, hash, key_prefix, None)?;
    dal.api_keys().create(&new_key)?;

    info!("Writing admin API key to temporary file");
    let key_path = Path::new("/tmp/formwork-keys/key.txt");
    fs::create_dir_all(key_path.parent().unwrap())?;
    fs::write(key_path, raw_key)?;

    Ok(())
}
