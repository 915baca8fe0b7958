// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing for the credential check.
//!
//! Argon2id with per-password random salts. Verification accepts only PHC
//! hashes produced by [`hash`]; there is no plaintext-equality fallback for
//! legacy rows — accounts with unhashed passwords must be reset.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed")]
pub struct HashError;

/// Hash a plaintext password into a PHC string.
pub fn hash(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| HashError)
}

/// Verify a plaintext password against a stored PHC hash.
///
/// Unparseable hashes verify as false rather than erroring: a corrupt stored
/// hash must read as "wrong password", not a 500.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
