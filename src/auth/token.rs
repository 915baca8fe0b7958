// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed bearer token codec.
//!
//! Tokens are three dot-joined segments, each URL-safe base64 without
//! padding (RFC 4648 §5): a fixed header, the claim set, and an HMAC-SHA256
//! signature over `header.claims` computed with the configured secret.
//!
//! The algorithm is not negotiable. The encoder always writes
//! `{"typ":"JWT","alg":"HS256"}` and the decoder rejects any token whose
//! header declares anything else, regardless of whether its signature
//! verifies. Signature comparison is constant-time via [`Mac::verify_slice`].

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::claims::{Claims, Principal};
use super::error::AuthError;
use super::roles::Role;
use crate::config::Config;

type HmacSha256 = Hmac<Sha256>;

/// The only header this codec ever produces or accepts.
const HEADER_JSON: &str = r#"{"typ":"JWT","alg":"HS256"}"#;

/// Token verification failures, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Not three non-empty segments, undecodable base64, unparseable JSON,
    /// or a header declaring a foreign algorithm.
    #[error("token is malformed")]
    Malformed,
    /// The recomputed HMAC does not match the signature segment.
    #[error("token signature mismatch")]
    InvalidSignature,
    /// The `exp` claim is before the verification time.
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => AuthError::TokenMalformed,
            TokenError::InvalidSignature => AuthError::TokenInvalidSignature,
            TokenError::Expired => AuthError::TokenExpired,
        }
    }
}

/// Decoded token header, used only to enforce the fixed algorithm.
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    #[allow(dead_code)]
    typ: Option<String>,
    alg: String,
}

/// Encodes and verifies self-contained signed tokens. No storage, no I/O.
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
    lifetime_secs: u64,
}

impl TokenCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.signing_secret.clone(),
            lifetime_secs: config.token_lifetime_secs,
        }
    }

    /// Issue a token for a user with `iat` = now.
    pub fn issue(&self, user_id: i64, username: &str, role: &Role) -> String {
        self.encode_at(user_id, username, role, now_unix())
    }

    /// Encode a token with an explicit issue time. Deterministic: identical
    /// inputs and secret always yield the same token string.
    pub fn encode_at(&self, user_id: i64, username: &str, role: &Role, now: i64) -> String {
        let claims = Claims {
            iat: now,
            exp: now + self.lifetime_secs as i64,
            user_id,
            username: username.to_string(),
            role: role.clone(),
        };

        let header_b64 = Base64UrlUnpadded::encode_string(HEADER_JSON.as_bytes());
        // Claims are a flat struct of integers and strings; serialization
        // cannot fail.
        let claims_json = serde_json::to_vec(&claims).expect("claims serialize");
        let claims_b64 = Base64UrlUnpadded::encode_string(&claims_json);

        let signature = self.sign(header_b64.as_bytes(), claims_b64.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

        format!("{header_b64}.{claims_b64}.{signature_b64}")
    }

    /// Verify a token against the current clock.
    pub fn decode(&self, token: &str) -> Result<Principal, TokenError> {
        self.decode_at(token, now_unix())
    }

    /// Verify a token against an explicit clock.
    ///
    /// Check order: segment structure, signature, header algorithm, claims,
    /// expiry. The signature is checked before anything attacker-controlled
    /// is parsed.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Principal, TokenError> {
        let mut segments = token.split('.');
        let (header_b64, claims_b64, signature_b64) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(c), Some(s), None) if !h.is_empty() && !c.is_empty() && !s.is_empty() => {
                (h, c, s)
            }
            _ => return Err(TokenError::Malformed),
        };

        let signature = Base64UrlUnpadded::decode_vec(signature_b64)
            .map_err(|_| TokenError::InvalidSignature)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let header_json =
            Base64UrlUnpadded::decode_vec(header_b64).map_err(|_| TokenError::Malformed)?;
        let header: Header =
            serde_json::from_slice(&header_json).map_err(|_| TokenError::Malformed)?;
        if header.alg != "HS256" {
            return Err(TokenError::Malformed);
        }

        let claims_json =
            Base64UrlUnpadded::decode_vec(claims_b64).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&claims_json).map_err(|_| TokenError::Malformed)?;

        if claims.exp < now {
            return Err(TokenError::Expired);
        }

        Ok(Principal::from(claims))
    }

    fn sign(&self, header_b64: &[u8], claims_b64: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(header_b64);
        mac.update(b".");
        mac.update(claims_b64);
        mac.finalize().into_bytes().to_vec()
    }
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(&Config::for_tests("unit-test-secret"))
    }

    #[test]
    fn round_trip_preserves_principal() {
        let codec = codec();
        let token = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);
        let principal = codec.decode_at(&token, NOW + 10).unwrap();

        assert_eq!(principal.user_id, 7);
        assert_eq!(principal.username, "ana");
        assert_eq!(principal.role, Role::Sobrestante);
        assert_eq!(principal.issued_at, NOW);
        assert_eq!(principal.expires_at, NOW + 3600);
    }

    #[test]
    fn encoding_is_deterministic() {
        let codec = codec();
        let a = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);
        let b = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);
        assert_eq!(a, b);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);
        // Lifetime is 3600s in the test config.
        assert_eq!(
            codec.decode_at(&token, NOW + 3601),
            Err(TokenError::Expired)
        );
        // Decoding right at exp still passes.
        assert!(codec.decode_at(&token, NOW + 3600).is_ok());
    }

    #[test]
    fn tampering_any_segment_fails_verification() {
        let codec = codec();
        let token = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);

        for (index, _) in token.char_indices() {
            let mut tampered: Vec<u8> = token.as_bytes().to_vec();
            if tampered[index] == b'.' {
                continue;
            }
            tampered[index] = if tampered[index] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered).unwrap();
            if tampered == token {
                continue;
            }

            let err = codec.decode_at(&tampered, NOW).unwrap_err();
            assert!(
                matches!(err, TokenError::InvalidSignature | TokenError::Malformed),
                "tampered byte {index} produced {err:?}"
            );
        }
    }

    #[test]
    fn wrong_secret_fails_signature_check() {
        let codec = codec();
        let other = TokenCodec::new(&Config::for_tests("a-different-secret"));
        let token = codec.encode_at(7, "ana", &Role::Sobrestante, NOW);
        assert_eq!(
            other.decode_at(&token, NOW),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn structural_garbage_is_malformed() {
        let codec = codec();
        for bad in ["", "only-one", "two.segments", "a.b.c.d", "..", "a..c"] {
            assert_eq!(codec.decode_at(bad, NOW), Err(TokenError::Malformed), "{bad:?}");
        }
    }

    #[test]
    fn foreign_algorithm_is_rejected_even_with_valid_signature() {
        let codec = codec();
        let header_b64 =
            Base64UrlUnpadded::encode_string(br#"{"typ":"JWT","alg":"RS256"}"#);
        let claims = Claims {
            iat: NOW,
            exp: NOW + 3600,
            user_id: 7,
            username: "ana".to_string(),
            role: Role::Sobrestante,
        };
        let claims_b64 =
            Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims).unwrap());
        let signature = codec.sign(header_b64.as_bytes(), claims_b64.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&signature);
        let token = format!("{header_b64}.{claims_b64}.{signature_b64}");

        assert_eq!(codec.decode_at(&token, NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn concrete_scenario_from_the_field() {
        // user 7 / "ana" / SOBRESTANTE issued at 1700000000 for 24h.
        let codec = TokenCodec {
            secret: b"unit-test-secret".to_vec(),
            lifetime_secs: 86_400,
        };
        let token = codec.encode_at(7, "ana", &Role::Sobrestante, 1_700_000_000);

        let before = codec.decode_at(&token, 1_700_086_399).unwrap();
        assert_eq!(before.user_id, 7);
        assert_eq!(before.username, "ana");
        assert_eq!(before.role, Role::Sobrestante);
        assert_eq!(before.issued_at, 1_700_000_000);
        assert_eq!(before.expires_at, 1_700_086_400);

        assert_eq!(
            codec.decode_at(&token, 1_700_086_401),
            Err(TokenError::Expired)
        );

        // One corrupted signature byte.
        let mut bytes = token.into_bytes();
        let last = bytes.len() - 1;
        bytes[last] = if bytes[last] == b'A' { b'B' } else { b'A' };
        let corrupted = String::from_utf8(bytes).unwrap();
        assert_eq!(
            codec.decode_at(&corrupted, 1_700_000_100),
            Err(TokenError::InvalidSignature)
        );
    }
}
