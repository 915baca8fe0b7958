// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::failure;

/// Gate-level error taxonomy.
///
/// Every variant is terminal for the current request and maps to a status
/// plus the standard response envelope. Token decode failures are reported
/// to the client with a single message so the response does not reveal
/// which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header on the request.
    #[error("authorization header missing or not a bearer token")]
    TokenMissing,
    /// Token structure or claims could not be parsed.
    #[error("token is malformed")]
    TokenMalformed,
    /// HMAC verification failed.
    #[error("token signature is invalid")]
    TokenInvalidSignature,
    /// The `exp` claim is in the past.
    #[error("token has expired")]
    TokenExpired,
    /// The principal's role does not satisfy the required role.
    #[error("principal role does not satisfy the required role")]
    RoleInsufficient,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::TokenMissing
            | AuthError::TokenMalformed
            | AuthError::TokenInvalidSignature
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::RoleInsufficient => StatusCode::FORBIDDEN,
        }
    }

    /// The standardized message sent to clients.
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::TokenMissing => "token not provided",
            AuthError::TokenMalformed
            | AuthError::TokenInvalidSignature
            | AuthError::TokenExpired => "invalid or expired token",
            AuthError::RoleInsufficient => "insufficient role",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        failure(self.status_code(), self.client_message()).into_response()
    }
}
