// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the field report API. All types
//! derive `Serialize`/`Deserialize` for JSON handling.
//!
//! ## Model Categories
//!
//! - **Users**: field crew accounts and their roles
//! - **Reports**: grid incident reports with location and catalog references
//! - **Catalog**: report groups, anomaly types, materials
//! - **Chat**: direct and broadcast crew messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Role;

// =============================================================================
// User Models
// =============================================================================

/// A stored user account.
///
/// The password hash never leaves the store; response shapes use
/// [`UserSummary`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role.clone(),
            active: self.active,
            last_login: self.last_login,
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

/// Login credentials. Fields default to empty so missing members surface as
/// validation errors rather than parse errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Request to register a new user. Privileged-role gated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Partial update of a user account. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// Report Models
// =============================================================================

/// Status a report starts in when the creator does not say otherwise.
pub const DEFAULT_REPORT_STATUS: &str = "pendiente";

/// A stored incident report.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    pub id: i64,
    /// Asset registration number the crew reported against.
    pub matricula: String,
    pub grupo_id: i64,
    pub anomalia_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_id: Option<i64>,
    pub descripcion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub status: String,
    pub user_id: i64,
    /// Stored filenames of attached images.
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A report joined with catalog and author names, as returned by list and
/// detail endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grupo_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalia_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
}

/// Wire shape for report creation. Required members are validated by the
/// handler, which turns this into a [`NewReport`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub matricula: String,
    #[serde(default)]
    pub grupo_id: Option<i64>,
    #[serde(default)]
    pub anomalia_id: Option<i64>,
    #[serde(default)]
    pub material_id: Option<i64>,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A validated report ready for the store.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub matricula: String,
    pub grupo_id: i64,
    pub anomalia_id: i64,
    pub material_id: Option<i64>,
    pub descripcion: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<String>,
}

/// Partial update of a report. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReportRequest {
    #[serde(default)]
    pub matricula: Option<String>,
    #[serde(default)]
    pub grupo_id: Option<i64>,
    #[serde(default)]
    pub anomalia_id: Option<i64>,
    #[serde(default)]
    pub material_id: Option<i64>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Catalog Models
// =============================================================================

/// A report group (substation, line section, …).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogGroup {
    pub id: i64,
    pub name: String,
}

/// An anomaly type within a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
}

/// A material within a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
}

// =============================================================================
// Chat Models
// =============================================================================

/// A chat message. `receiver_id = None` marks a broadcast message visible to
/// everyone.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub sender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_id: Option<i64>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A message joined with its sender's username.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessageView {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub receiver_id: Option<i64>,
}

// =============================================================================
// Upload Models
// =============================================================================

/// Validated file metadata plus content, as accepted by the upload manager.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreImageRequest {
    pub filename: String,
    pub content_type: String,
    /// File content, standard base64.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_summary_drops_the_password_hash() {
        let user = User {
            id: 1,
            username: "ana".into(),
            password_hash: "$argon2id$...".into(),
            email: None,
            full_name: "Ana P".into(),
            role: Role::Sobrestante,
            active: true,
            last_login: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(user.summary()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "SOBRESTANTE");
    }

    #[test]
    fn report_view_flattens_report_fields() {
        let now = Utc::now();
        let view = ReportView {
            report: Report {
                id: 5,
                matricula: "TX-1042".into(),
                grupo_id: 1,
                anomalia_id: 2,
                material_id: None,
                descripcion: "poste inclinado".into(),
                latitude: Some(19.43),
                longitude: Some(-99.13),
                status: DEFAULT_REPORT_STATUS.into(),
                user_id: 7,
                images: vec![],
                created_at: now,
                updated_at: now,
            },
            grupo_nombre: Some("Distribución".into()),
            anomalia_nombre: Some("Poste dañado".into()),
            material_nombre: None,
            username: Some("ana".into()),
            user_role: Some(Role::Sobrestante),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["grupo_nombre"], "Distribución");
        assert!(json.get("material_nombre").is_none());
    }
}
