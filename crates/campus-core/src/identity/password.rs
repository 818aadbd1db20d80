// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Argon2 password credentials.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use once_cell::sync::Lazy;

use crate::error::{StoreError, StoreResult};

/// Hash verified when no subject matches, so both login failure paths do
/// the same amount of work.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| CredentialHasher::new().hash("campus-dummy-password").ok());

/// Hashes and verifies passwords as Argon2id PHC strings.
///
/// Verification reads the cost parameters from the stored hash, so hashes
/// produced with different costs verify with the same call.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Creates a hasher with the Argon2 default cost.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Creates a hasher with an explicit cost.
    ///
    /// `memory_kib` must be at least `8 * parallelism`.
    pub fn with_cost(memory_kib: u32, iterations: u32, parallelism: u32) -> StoreResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| StoreError::credential(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::credential(e.to_string()))
    }

    /// Verifies a password against a PHC string.
    ///
    /// Malformed hashes never verify.
    pub fn verify(password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification against a fixed hash. Always returns `false`.
    pub fn verify_dummy(password: &str) -> bool {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = Self::verify(password, hash);
        }
        false
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
