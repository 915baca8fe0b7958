// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles for authorization.

use serde::{Deserialize, Serialize};

/// Operational roles carried in token claims.
///
/// Role checks are exact string matches with a single exception:
/// `JEFE_AREA` (area chief) satisfies every role check. This is a one-tier
/// bypass, not a hierarchy — there are no intermediate privilege levels.
///
/// The role catalog lives in the user store; names outside the two known
/// variants round-trip through [`Role::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Area chief. Passes every role check.
    JefeArea,
    /// Crew foreman. Read/update access to crew reports and exports.
    Sobrestante,
    /// Any other role from the catalog. Exact-match only.
    Other(String),
}

impl Role {
    /// Whether this role bypasses role checks entirely.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::JefeArea)
    }

    /// Whether this role passes a check for `required`.
    ///
    /// Exact match, case-sensitive, except the privileged role which always
    /// passes.
    pub fn satisfies(&self, required: &Role) -> bool {
        self.is_privileged() || self == required
    }

    /// The wire representation of this role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::JefeArea => "JEFE_AREA",
            Role::Sobrestante => "SOBRESTANTE",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "JEFE_AREA" => Role::JefeArea,
            "SOBRESTANTE" => Role::Sobrestante,
            _ => Role::Other(value),
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
