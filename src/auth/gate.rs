// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authorization gate.
//!
//! Every protected handler passes through here before touching any
//! collaborator: extract the bearer token, verify it, and optionally check a
//! role. Both paths leave an audit record; auditing never blocks or fails
//! the request.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::claims::Principal;
use super::error::AuthError;
use super::roles::Role;
use super::token::TokenCodec;
use crate::audit::{AuditEvent, AuditEventType, RequestMeta};
use crate::config::Config;

/// Gates requests on a valid, unexpired token and (optionally) a role.
#[derive(Clone)]
pub struct AuthGate {
    codec: TokenCodec,
}

impl AuthGate {
    pub fn new(config: &Config) -> Self {
        Self {
            codec: TokenCodec::new(config),
        }
    }

    /// The codec, for the login handler that issues tokens.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Validate the bearer token on a request.
    ///
    /// A missing or non-`Bearer` header fails with [`AuthError::TokenMissing`];
    /// decode failures map through the token error taxonomy. Success and
    /// failure both leave an audit record.
    pub fn validate(&self, headers: &HeaderMap, meta: &RequestMeta) -> Result<Principal, AuthError> {
        let token = match bearer_token(headers) {
            Some(token) => token,
            None => {
                AuditEvent::new(AuditEventType::AuthFailure)
                    .with_meta(meta)
                    .with_detail("token not provided")
                    .failed()
                    .record();
                return Err(AuthError::TokenMissing);
            }
        };

        match self.codec.decode(token) {
            Ok(principal) => {
                AuditEvent::new(AuditEventType::AuthSuccess)
                    .with_user(principal.user_id)
                    .with_meta(meta)
                    .record();
                Ok(principal)
            }
            Err(err) => {
                AuditEvent::new(AuditEventType::AuthFailure)
                    .with_meta(meta)
                    .with_detail(err.to_string())
                    .failed()
                    .record();
                Err(err.into())
            }
        }
    }

    /// Validate the token, then require a role.
    ///
    /// The check passes when the principal's role equals `required`, or when
    /// it is the privileged role, which satisfies every check.
    pub fn require_role(
        &self,
        headers: &HeaderMap,
        meta: &RequestMeta,
        required: &Role,
    ) -> Result<Principal, AuthError> {
        let principal = self.validate(headers, meta)?;
        self.check_role(&principal, meta, required)?;
        Ok(principal)
    }

    /// Role check for an already-validated principal.
    pub fn check_role(
        &self,
        principal: &Principal,
        meta: &RequestMeta,
        required: &Role,
    ) -> Result<(), AuthError> {
        if principal.has_role(required) {
            Ok(())
        } else {
            AuditEvent::new(AuditEventType::PermissionDenied)
                .with_user(principal.user_id)
                .with_meta(meta)
                .with_detail(format!("required role {required}"))
                .failed()
                .record();
            Err(AuthError::RoleInsufficient)
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn gate() -> AuthGate {
        AuthGate::new(&Config::for_tests("gate-test-secret"))
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn missing_header_is_token_missing() {
        let gate = gate();
        let err = gate
            .validate(&HeaderMap::new(), &RequestMeta::default())
            .unwrap_err();
        assert_eq!(err, AuthError::TokenMissing);
    }

    #[test]
    fn non_bearer_header_is_token_missing() {
        let gate = gate();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        let err = gate.validate(&headers, &RequestMeta::default()).unwrap_err();
        assert_eq!(err, AuthError::TokenMissing);
    }

    #[test]
    fn valid_token_yields_principal() {
        let gate = gate();
        let token = gate.codec().issue(3, "marco", &Role::Other("LINIERO".into()));
        let principal = gate
            .validate(&headers_with(&token), &RequestMeta::default())
            .unwrap();
        assert_eq!(principal.user_id, 3);
        assert_eq!(principal.username, "marco");
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let gate = gate();
        let err = gate
            .validate(&headers_with("not.a.token"), &RequestMeta::default())
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn require_role_exact_match() {
        let gate = gate();
        let meta = RequestMeta::default();
        let token = gate.codec().issue(7, "ana", &Role::Sobrestante);

        assert!(gate
            .require_role(&headers_with(&token), &meta, &Role::Sobrestante)
            .is_ok());
        assert_eq!(
            gate.require_role(&headers_with(&token), &meta, &Role::JefeArea)
                .unwrap_err(),
            AuthError::RoleInsufficient
        );
    }

    #[test]
    fn privileged_role_bypasses_every_check() {
        let gate = gate();
        let meta = RequestMeta::default();
        let token = gate.codec().issue(1, "jefa", &Role::JefeArea);

        for required in [
            Role::JefeArea,
            Role::Sobrestante,
            Role::Other("LINIERO".into()),
        ] {
            assert!(gate
                .require_role(&headers_with(&token), &meta, &required)
                .is_ok());
        }
    }
}
