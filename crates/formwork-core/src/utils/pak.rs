/*
 * Copyright (c) 2025 Dylan Storey
 * Licensed under the Elastic License 2.0.
 * See LICENSE file in the project root for full license text.
 */

//! Prefixed API Key (PAK) management utilities.
//!
//! Generates and verifies the API keys handed out to CMS users (see
//! `formwork_models::models::api_keys`). The raw key is only ever returned
//! once, at creation time; everything persisted is a hash.

use formwork_utils::config::Settings;
use once_cell::sync::OnceCell;
use prefixed_api_key::PrefixedApiKey;
use prefixed_api_key::PrefixedApiKeyController;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::sync::Arc;
use tracing::info;

/// Singleton instance of the PAK controller.
static PAK_CONTROLLER: OnceCell<Arc<PrefixedApiKeyController<OsRng, Sha256>>> = OnceCell::new();

/// Creates or retrieves the PAK controller.
///
/// `config` only matters on the first call — once initialized, later calls
/// return the existing singleton regardless of what's passed.
pub fn create_pak_controller(
    config: Option<&Settings>,
) -> Result<Arc<PrefixedApiKeyController<OsRng, Sha256>>, &'static str> {
    match (PAK_CONTROLLER.get(), config) {
        (Some(controller), _) => Ok(controller.clone()),
        (None, Some(cfg)) => {
            let controller = PAK_CONTROLLER.get_or_init(|| {
                info!("Initializing PAK_CONTROLLER for the first time");
                Arc::new(create_pak_controller_inner(cfg).expect("Failed to create PAK controller"))
            });
            Ok(controller.clone())
        }
        (None, None) => Err("PAK_CONTROLLER not initialized and no config provided"),
    }
}

fn create_pak_controller_inner(
    config: &Settings,
) -> Result<PrefixedApiKeyController<OsRng, Sha256>, Box<dyn std::error::Error>> {
    let builder = PrefixedApiKeyController::configure()
        .prefix(config.api_key.prefix.clone())
        .short_token_length(config.api_key.short_token_length)
        .short_token_prefix(config.api_key.short_token_prefix.clone())
        .long_token_length(config.api_key.long_token_length)
        .rng_osrng()
        .digest_sha256();

    builder.finalize().map_err(|e| e.into())
}

/// Generates a new API key and its hash. The plaintext key is the only copy
/// the caller will ever see — only the hash should be persisted.
pub fn create_pak() -> Result<(String, String), Box<dyn std::error::Error>> {
    let controller = create_pak_controller(None)?;

    controller
        .try_generate_key_and_hash()
        .map(|(pak, hash)| (pak.to_string(), hash))
        .map_err(|e| e.into())
}

/// Verifies an API key against a stored hash.
pub fn verify_pak(pak: &str, stored_hash: &str) -> bool {
    let pak = match PrefixedApiKey::from_string(pak) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let controller = create_pak_controller(None).expect("PAK controller not initialized");
    let computed_hash = controller.long_token_hashed(&pak);
    stored_hash == computed_hash
}

/// Computes the hash for a given API key, e.g. when rehashing on rotation.
pub fn generate_pak_hash(pak: &str) -> Result<String, &'static str> {
    let pak = PrefixedApiKey::from_string(pak).map_err(|_| "malformed API key")?;
    let controller = create_pak_controller(None).expect("PAK controller not initialized");
    Ok(controller.long_token_hashed(&pak))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_pak_controller_singleton() {
        let config = Settings::new(None).expect("Failed to load configuration");

        let controller1 = create_pak_controller(Some(&config)).expect("Failed to create controller");
        let address1 = Arc::as_ptr(&controller1) as usize;

        let controller2 = create_pak_controller(None).expect("Failed to get controller");
        let address2 = Arc::as_ptr(&controller2) as usize;

        assert_eq!(address1, address2, "Controllers should have the same memory address");

        let threads: Vec<_> = (0..10)
            .map(|_| {
                thread::spawn(move || {
                    let controller = create_pak_controller(None).expect("Failed to get controller in thread");
                    Arc::as_ptr(&controller) as usize
                })
            })
            .collect();

        for thread_address in threads.into_iter().map(|h| h.join().unwrap()) {
            assert_eq!(address1, thread_address);
        }

        let (pak1, hash1) = create_pak().unwrap();
        let (pak2, hash2) = create_pak().unwrap();
        assert_ne!(pak1, pak2, "Generated keys should be different");
        assert_ne!(hash1, hash2, "Generated hashes should be different");
    }

    #[test]
    fn test_verify_pak() {
        let config = Settings::new(None).expect("Failed to load configuration");
        create_pak_controller(Some(&config)).expect("Failed to create controller");

        let (pak, hash) = create_pak().unwrap();
        assert!(verify_pak(&pak, &hash), "API key verification failed");

        assert!(
            !verify_pak(&pak, "0000000000000000000000000000000000000000000000000000000000000000"),
            "Invalid hash should not verify"
        );

        assert!(!verify_pak("not-a-valid-key", &hash), "Malformed key should not verify");
    }

    #[test]
    fn test_generate_pak_hash_matches_original() {
        let config = Settings::new(None).expect("Failed to load configuration");
        create_pak_controller(Some(&config)).expect("Failed to create controller");

        let (pak, original_hash) = create_pak().unwrap();
        let generated_hash = generate_pak_hash(&pak).unwrap();
        assert_eq!(original_hash, generated_hash);

        let (pak2, _) = create_pak().unwrap();
        assert_ne!(generate_pak_hash(&pak).unwrap(), generate_pak_hash(&pak2).unwrap());
    }
}
