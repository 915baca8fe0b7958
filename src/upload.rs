// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload manager for report images.
//!
//! Contract with the handlers: validated file metadata plus content in,
//! stored filename out. Names are sanitized and made unique before anything
//! touches the filesystem.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;

/// Content types accepted for report images.
const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("content type {0} is not allowed")]
    UnsupportedType(String),
    #[error("file exceeds the maximum size of {0} bytes")]
    TooLarge(u64),
    #[error("filename is empty after sanitizing")]
    EmptyFilename,
    #[error("failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedType(_) | UploadError::EmptyFilename => {
                ApiError::bad_request(err.to_string())
            }
            UploadError::TooLarge(_) => ApiError::bad_request(err.to_string()),
            UploadError::Io(_) => ApiError::internal("failed to store file"),
        }
    }
}

/// Stores uploaded files under the configured directory.
#[derive(Debug, Clone)]
pub struct UploadManager {
    dest_dir: PathBuf,
    max_bytes: u64,
}

impl UploadManager {
    pub fn new(config: &Config) -> Self {
        Self {
            dest_dir: config.upload_dir.clone(),
            max_bytes: config.max_upload_bytes,
        }
    }

    /// Validate and persist one file. Returns the stored filename.
    pub fn store(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        if !ALLOWED_TYPES.contains(&content_type) {
            return Err(UploadError::UnsupportedType(content_type.to_string()));
        }
        if bytes.len() as u64 > self.max_bytes {
            return Err(UploadError::TooLarge(self.max_bytes));
        }

        let sanitized = sanitize_filename(filename);
        if sanitized.is_empty() {
            return Err(UploadError::EmptyFilename);
        }

        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitized);
        fs::create_dir_all(&self.dest_dir)?;
        fs::write(self.dest_dir.join(&stored_name), bytes)?;

        Ok(stored_name)
    }
}

/// Strip directory components and any character outside `[A-Za-z0-9._-]`.
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}
