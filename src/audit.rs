// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit trail for security-sensitive operations.
//!
//! Events are structured `tracing` records. Recording is fire-and-forget:
//! it never blocks and never fails the request that triggered it.

use std::net::IpAddr;

use serde::Serialize;

/// Types of auditable events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Gate events
    AuthSuccess,
    AuthFailure,
    PermissionDenied,

    // Credential events
    Login,
    LoginFailed,
    UserRegistered,

    // Report events
    ReportCreated,
    ReportUpdated,
    ReportDeleted,
    ImageStored,

    // Chat events
    MessageSent,
    MessageDeleted,

    // Export events
    ExportGenerated,
}

impl AuditEventType {
    fn as_str(self) -> &'static str {
        match self {
            AuditEventType::AuthSuccess => "auth_success",
            AuditEventType::AuthFailure => "auth_failure",
            AuditEventType::PermissionDenied => "permission_denied",
            AuditEventType::Login => "login",
            AuditEventType::LoginFailed => "login_failed",
            AuditEventType::UserRegistered => "user_registered",
            AuditEventType::ReportCreated => "report_created",
            AuditEventType::ReportUpdated => "report_updated",
            AuditEventType::ReportDeleted => "report_deleted",
            AuditEventType::ImageStored => "image_stored",
            AuditEventType::MessageSent => "message_sent",
            AuditEventType::MessageDeleted => "message_deleted",
            AuditEventType::ExportGenerated => "export_generated",
        }
    }
}

/// Request-scoped metadata handed to the gate and the audit trail.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Peer address, when the listener provides one.
    pub ip: Option<IpAddr>,
    /// The (resource, action) selector pair as a display string.
    pub endpoint: String,
}

/// One audit record.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    event_type: AuditEventType,
    user_id: Option<i64>,
    ip: Option<IpAddr>,
    endpoint: Option<String>,
    detail: Option<String>,
    success: bool,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            user_id: None,
            ip: None,
            endpoint: None,
            detail: None,
            success: true,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_meta(mut self, meta: &RequestMeta) -> Self {
        self.ip = meta.ip;
        self.endpoint = Some(meta.endpoint.clone());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }

    /// Emit the event. Failures log at `warn`, the rest at `info`.
    pub fn record(self) {
        let ip = self.ip.map(|ip| ip.to_string());
        if self.success {
            tracing::info!(
                target: "audit",
                event = self.event_type.as_str(),
                user_id = self.user_id,
                ip = ip.as_deref(),
                endpoint = self.endpoint.as_deref(),
                detail = self.detail.as_deref(),
                "audit"
            );
        } else {
            tracing::warn!(
                target: "audit",
                event = self.event_type.as_str(),
                user_id = self.user_id,
                ip = ip.as_deref(),
                endpoint = self.endpoint.as_deref(),
                detail = self.detail.as_deref(),
                "audit"
            );
        }
    }
}
