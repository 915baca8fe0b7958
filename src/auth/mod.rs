// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Self-contained bearer-token authentication for the field report API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with username/password and receives a signed token
//! 2. Client sends `Authorization: Bearer <token>` on every request
//! 3. Handlers call [`AuthGate::validate`] (or `require_role`) before
//!    touching any collaborator:
//!    - the codec verifies the HMAC-SHA256 signature and expiry
//!    - the gate optionally enforces a role, with `JEFE_AREA` passing
//!      every check
//!
//! ## Security
//!
//! - The signing algorithm is fixed; tokens declaring any other algorithm
//!   are rejected
//! - Signature comparison is constant-time
//! - Tokens are self-contained; no server-side session state

pub mod claims;
pub mod error;
pub mod gate;
pub mod roles;
pub mod token;

pub use claims::{Claims, Principal};
pub use error::AuthError;
pub use gate::AuthGate;
pub use roles::Role;
pub use token::{TokenCodec, TokenError};
