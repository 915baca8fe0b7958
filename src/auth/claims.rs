// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and the authenticated principal.

use serde::{Deserialize, Serialize};

use super::roles::Role;

/// The claim set embedded in a signed token.
///
/// Serialization order matters for encoding determinism: a given principal,
/// timestamp and secret always produce the same token string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// The authenticated identity for one request.
///
/// A `Principal` is only ever produced by a successful token verification
/// (or by the credential check at login, which immediately encodes it).
/// Downstream code must never build one from unvalidated input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// Issued-at, unix seconds.
    #[serde(skip)]
    pub issued_at: i64,
    /// Expiry, unix seconds.
    #[serde(skip)]
    pub expires_at: i64,
}

impl Principal {
    /// Check the principal's role against a required role.
    pub fn has_role(&self, required: &Role) -> bool {
        self.role.satisfies(required)
    }

    /// Whether this principal carries the privileged role.
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}
