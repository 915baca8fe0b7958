// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup
//! ([`Config::from_env`]) and passed by `Arc` into the token codec, the auth
//! gate and the dispatcher. Nothing mutates it afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ENV` | `development` or `production` | `development` |
//! | `JWT_SECRET` | HMAC-SHA256 signing secret | Required in production |
//! | `JWT_EXPIRATION` | Token lifetime in seconds | `86400` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated origin allow-list (production) | app origins |
//! | `UPLOAD_DIR` | Directory for stored report images | `uploads/images` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Development signing secret. Production refuses to start without an
/// explicit `JWT_SECRET`.
const DEV_SIGNING_SECRET: &str = "dev-only-signing-secret";

/// Default token lifetime: 24 hours.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 86_400;

/// Default cap for uploaded report images: 5 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration loading errors. All of these abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingProductionSecret,
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Deployment environment. Selects the CORS origin policy and error
/// verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("PRODUCTION") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Process-wide settings, read-only after [`Config::from_env`].
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// HMAC-SHA256 key for token signing and verification.
    pub signing_secret: Vec<u8>,
    /// Lifetime of issued tokens, in seconds.
    pub token_lifetime_secs: u64,
    /// Origins allowed by the CORS layer in production. Development allows
    /// any origin.
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    /// Destination directory for uploaded report images.
    pub upload_dir: PathBuf,
    /// Upper bound for a single uploaded file.
    pub max_upload_bytes: u64,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();

        let signing_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ if environment.is_production() => {
                return Err(ConfigError::MissingProductionSecret);
            }
            _ => DEV_SIGNING_SECRET.as_bytes().to_vec(),
        };

        let token_lifetime_secs = match env::var("JWT_EXPIRATION") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "JWT_EXPIRATION",
                value: raw,
            })?,
            Err(_) => DEFAULT_TOKEN_LIFETIME_SECS,
        };

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            Err(_) => vec![
                "https://cfedis.space".to_string(),
                "https://www.cfedis.space".to_string(),
            ],
        };

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads/images"));

        Ok(Self {
            environment,
            signing_secret,
            token_lifetime_secs,
            allowed_origins,
            host,
            port,
            upload_dir,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        })
    }

    /// Configuration for tests: fixed secret, one-hour lifetime.
    #[cfg(test)]
    pub fn for_tests(secret: &str) -> Self {
        Self {
            environment: Environment::Development,
            signing_secret: secret.as_bytes().to_vec(),
            token_lifetime_secs: 3600,
            allowed_origins: Vec::new(),
            host: "127.0.0.1".to_string(),
            port: 0,
            upload_dir: std::env::temp_dir(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_is_development() {
        let config = Config::for_tests("secret");
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.environment.is_production());
        assert_eq!(config.token_lifetime_secs, 3600);
    }
}
