// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store backing the resource handlers.
//!
//! The gate and dispatcher are stateless; this store is the collaborator
//! they hand validated requests to. It lives behind `tokio::sync::RwLock`
//! in [`crate::state::AppState`] and is the only shared mutable state in
//! the process.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::Role;
use crate::error::ApiError;
use crate::models::{
    Anomaly, CatalogGroup, ChatMessage, ChatMessageView, Material, NewReport, Report, ReportView,
    UpdateReportRequest, UpdateUserRequest, User, UserSummary, DEFAULT_REPORT_STATUS,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: HashMap<i64, User>,
    reports: HashMap<i64, Report>,
    messages: HashMap<i64, ChatMessage>,
    groups: HashMap<i64, CatalogGroup>,
    anomalies: HashMap<i64, Anomaly>,
    materials: HashMap<i64, Material>,
    next_user_id: i64,
    next_report_id: i64,
    next_message_id: i64,
    next_catalog_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn insert_user(
        &mut self,
        username: impl Into<String>,
        password_hash: impl Into<String>,
        email: Option<String>,
        full_name: Option<String>,
        role: Role,
        active: bool,
    ) -> Result<User, ApiError> {
        let username = username.into();
        if self.user_by_username(&username).is_some() {
            return Err(ApiError::unprocessable("username already exists"));
        }

        self.next_user_id += 1;
        let user = User {
            id: self.next_user_id,
            full_name: full_name.unwrap_or_else(|| username.clone()),
            username,
            password_hash: password_hash.into(),
            email,
            role,
            active,
            last_login: None,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn list_users(&self) -> Vec<UserSummary> {
        let mut users: Vec<UserSummary> = self.users.values().map(User::summary).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    pub fn user_by_id(&self, id: i64) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    /// Apply a partial update. `password_hash` is the already-hashed
    /// replacement when the request carried a new password.
    pub fn update_user(
        &mut self,
        id: i64,
        request: UpdateUserRequest,
        password_hash: Option<String>,
    ) -> Result<User, ApiError> {
        let Some(user) = self.users.get_mut(&id) else {
            return Err(ApiError::not_found("user not found"));
        };

        if let Some(email) = request.email {
            user.email = Some(email);
        }
        if let Some(full_name) = request.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(active) = request.active {
            user.active = active;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }

        Ok(user.clone())
    }

    pub fn delete_user(&mut self, id: i64) -> Result<(), ApiError> {
        if self.users.remove(&id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("user not found"))
        }
    }

    pub fn record_login(&mut self, id: i64, at: DateTime<Utc>) {
        if let Some(user) = self.users.get_mut(&id) {
            user.last_login = Some(at);
        }
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn create_report(&mut self, user_id: i64, new: NewReport) -> Report {
        self.next_report_id += 1;
        let now = Utc::now();
        let report = Report {
            id: self.next_report_id,
            matricula: new.matricula,
            grupo_id: new.grupo_id,
            anomalia_id: new.anomalia_id,
            material_id: new.material_id,
            descripcion: new.descripcion,
            latitude: new.latitude,
            longitude: new.longitude,
            status: new
                .status
                .unwrap_or_else(|| DEFAULT_REPORT_STATUS.to_string()),
            user_id,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.reports.insert(report.id, report.clone());
        report
    }

    pub fn list_reports(&self) -> Vec<ReportView> {
        self.sorted_views(self.reports.values())
    }

    pub fn reports_by_user(&self, user_id: i64) -> Vec<ReportView> {
        self.sorted_views(
            self.reports
                .values()
                .filter(|report| report.user_id == user_id),
        )
    }

    pub fn report_by_id(&self, id: i64) -> Option<Report> {
        self.reports.get(&id).cloned()
    }

    pub fn report_view(&self, id: i64) -> Option<ReportView> {
        self.reports.get(&id).map(|report| self.view(report))
    }

    pub fn update_report(
        &mut self,
        id: i64,
        request: UpdateReportRequest,
    ) -> Result<Report, ApiError> {
        let Some(report) = self.reports.get_mut(&id) else {
            return Err(ApiError::not_found("report not found"));
        };

        if let Some(matricula) = request.matricula {
            report.matricula = matricula;
        }
        if let Some(grupo_id) = request.grupo_id {
            report.grupo_id = grupo_id;
        }
        if let Some(anomalia_id) = request.anomalia_id {
            report.anomalia_id = anomalia_id;
        }
        if let Some(material_id) = request.material_id {
            report.material_id = Some(material_id);
        }
        if let Some(descripcion) = request.descripcion {
            report.descripcion = descripcion;
        }
        if let Some(latitude) = request.latitude {
            report.latitude = Some(latitude);
        }
        if let Some(longitude) = request.longitude {
            report.longitude = Some(longitude);
        }
        if let Some(status) = request.status {
            report.status = status;
        }
        report.updated_at = Utc::now();

        Ok(report.clone())
    }

    pub fn delete_report(&mut self, id: i64) -> Result<(), ApiError> {
        if self.reports.remove(&id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("report not found"))
        }
    }

    pub fn attach_image(&mut self, report_id: i64, filename: String) -> Result<(), ApiError> {
        let Some(report) = self.reports.get_mut(&report_id) else {
            return Err(ApiError::not_found("report not found"));
        };
        report.images.push(filename);
        report.updated_at = Utc::now();
        Ok(())
    }

    /// Reports that carry coordinates, optionally restricted by status.
    pub fn reports_with_location(&self, status: Option<&str>) -> Vec<ReportView> {
        self.sorted_views(self.reports.values().filter(|report| {
            report.latitude.is_some()
                && report.longitude.is_some()
                && status.is_none_or(|wanted| report.status == wanted)
        }))
    }

    /// Reports for the export endpoint, filtered by an inclusive creation
    /// date range and status.
    pub fn reports_for_export(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        status: Option<&str>,
    ) -> Vec<ReportView> {
        self.sorted_views(self.reports.values().filter(|report| {
            let created = report.created_at.date_naive();
            start_date.is_none_or(|start| created >= start)
                && end_date.is_none_or(|end| created <= end)
                && status.is_none_or(|wanted| report.status == wanted)
        }))
    }

    fn sorted_views<'a>(&self, reports: impl Iterator<Item = &'a Report>) -> Vec<ReportView> {
        let mut views: Vec<ReportView> = reports.map(|report| self.view(report)).collect();
        // Newest first, matching the listing order of the reports table.
        views.sort_by(|a, b| {
            b.report
                .created_at
                .cmp(&a.report.created_at)
                .then(b.report.id.cmp(&a.report.id))
        });
        views
    }

    fn view(&self, report: &Report) -> ReportView {
        let author = self.users.get(&report.user_id);
        ReportView {
            grupo_nombre: self.groups.get(&report.grupo_id).map(|g| g.name.clone()),
            anomalia_nombre: self
                .anomalies
                .get(&report.anomalia_id)
                .map(|a| a.name.clone()),
            material_nombre: report
                .material_id
                .and_then(|id| self.materials.get(&id))
                .map(|m| m.name.clone()),
            username: author.map(|user| user.username.clone()),
            user_role: author.map(|user| user.role.clone()),
            report: report.clone(),
        }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub fn insert_group(&mut self, name: impl Into<String>) -> CatalogGroup {
        self.next_catalog_id += 1;
        let group = CatalogGroup {
            id: self.next_catalog_id,
            name: name.into(),
        };
        self.groups.insert(group.id, group.clone());
        group
    }

    pub fn insert_anomaly(&mut self, group_id: i64, name: impl Into<String>) -> Anomaly {
        self.next_catalog_id += 1;
        let anomaly = Anomaly {
            id: self.next_catalog_id,
            group_id,
            name: name.into(),
        };
        self.anomalies.insert(anomaly.id, anomaly.clone());
        anomaly
    }

    pub fn insert_material(&mut self, group_id: i64, name: impl Into<String>) -> Material {
        self.next_catalog_id += 1;
        let material = Material {
            id: self.next_catalog_id,
            group_id,
            name: name.into(),
        };
        self.materials.insert(material.id, material.clone());
        material
    }

    pub fn groups(&self) -> Vec<CatalogGroup> {
        let mut groups: Vec<CatalogGroup> = self.groups.values().cloned().collect();
        groups.sort_by_key(|group| group.id);
        groups
    }

    pub fn anomalies(&self, group_id: Option<i64>) -> Vec<Anomaly> {
        let mut anomalies: Vec<Anomaly> = self
            .anomalies
            .values()
            .filter(|anomaly| group_id.is_none_or(|id| anomaly.group_id == id))
            .cloned()
            .collect();
        anomalies.sort_by_key(|anomaly| anomaly.id);
        anomalies
    }

    pub fn materials(&self, group_id: Option<i64>) -> Vec<Material> {
        let mut materials: Vec<Material> = self
            .materials
            .values()
            .filter(|material| group_id.is_none_or(|id| material.group_id == id))
            .cloned()
            .collect();
        materials.sort_by_key(|material| material.id);
        materials
    }

    // =========================================================================
    // Chat
    // =========================================================================

    pub fn send_message(
        &mut self,
        sender_id: i64,
        message: String,
        receiver_id: Option<i64>,
    ) -> Result<ChatMessage, ApiError> {
        if let Some(receiver) = receiver_id {
            if !self.users.contains_key(&receiver) {
                return Err(ApiError::not_found("receiver not found"));
            }
        }

        self.next_message_id += 1;
        let message = ChatMessage {
            id: self.next_message_id,
            sender_id,
            receiver_id,
            message,
            read: false,
            created_at: Utc::now(),
        };
        self.messages.insert(message.id, message.clone());
        Ok(message)
    }

    /// Messages visible to a user: direct messages to or from them, plus
    /// broadcasts.
    pub fn messages_for_user(&self, user_id: i64) -> Vec<ChatMessageView> {
        self.sorted_messages(self.messages.values().filter(|message| {
            message.sender_id == user_id
                || message.receiver_id == Some(user_id)
                || message.receiver_id.is_none()
        }))
    }

    /// The direct-message thread between two users, both directions.
    pub fn thread_between(&self, user_id: i64, other_id: i64) -> Vec<ChatMessageView> {
        self.sorted_messages(self.messages.values().filter(|message| {
            (message.sender_id == user_id && message.receiver_id == Some(other_id))
                || (message.sender_id == other_id && message.receiver_id == Some(user_id))
        }))
    }

    pub fn global_messages(&self) -> Vec<ChatMessageView> {
        self.sorted_messages(
            self.messages
                .values()
                .filter(|message| message.receiver_id.is_none()),
        )
    }

    pub fn mark_read(&mut self, message_id: i64) -> Result<(), ApiError> {
        let Some(message) = self.messages.get_mut(&message_id) else {
            return Err(ApiError::not_found("message not found"));
        };
        message.read = true;
        Ok(())
    }

    pub fn delete_message(&mut self, message_id: i64) -> Result<(), ApiError> {
        if self.messages.remove(&message_id).is_some() {
            Ok(())
        } else {
            Err(ApiError::not_found("message not found"))
        }
    }

    fn sorted_messages<'a>(
        &self,
        messages: impl Iterator<Item = &'a ChatMessage>,
    ) -> Vec<ChatMessageView> {
        let mut views: Vec<ChatMessageView> = messages
            .map(|message| ChatMessageView {
                sender_username: self
                    .users
                    .get(&message.sender_id)
                    .map(|user| user.username.clone()),
                message: message.clone(),
            })
            .collect();
        views.sort_by(|a, b| {
            a.message
                .created_at
                .cmp(&b.message.created_at)
                .then(a.message.id.cmp(&b.message.id))
        });
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_user(username: &str, role: Role) -> (InMemoryStore, User) {
        let mut store = InMemoryStore::new();
        let user = store
            .insert_user(username, "hash", None, None, role, true)
            .unwrap();
        (store, user)
    }

    fn report_request() -> NewReport {
        NewReport {
            matricula: "TX-1042".into(),
            grupo_id: 1,
            anomalia_id: 2,
            material_id: None,
            descripcion: "poste inclinado".into(),
            latitude: Some(19.43),
            longitude: Some(-99.13),
            status: None,
        }
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let (mut store, _user) = store_with_user("ana", Role::Sobrestante);
        let err = store
            .insert_user("ana", "hash2", None, None, Role::JefeArea, true)
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn report_defaults_to_pending_status() {
        let (mut store, user) = store_with_user("ana", Role::Sobrestante);
        let report = store.create_report(user.id, report_request());
        assert_eq!(report.status, DEFAULT_REPORT_STATUS);
        assert_eq!(report.user_id, user.id);
    }

    #[test]
    fn report_views_join_catalog_and_author_names() {
        let (mut store, user) = store_with_user("ana", Role::Sobrestante);
        let group = store.insert_group("Distribución");
        let anomaly = store.insert_anomaly(group.id, "Poste dañado");

        let mut request = report_request();
        request.grupo_id = group.id;
        request.anomalia_id = anomaly.id;
        let report = store.create_report(user.id, request);

        let view = store.report_view(report.id).unwrap();
        assert_eq!(view.grupo_nombre.as_deref(), Some("Distribución"));
        assert_eq!(view.anomalia_nombre.as_deref(), Some("Poste dañado"));
        assert_eq!(view.username.as_deref(), Some("ana"));
        assert_eq!(view.user_role, Some(Role::Sobrestante));
    }

    #[test]
    fn location_filter_requires_coordinates() {
        let (mut store, user) = store_with_user("ana", Role::Sobrestante);
        store.create_report(user.id, report_request());

        let mut no_location = report_request();
        no_location.latitude = None;
        no_location.longitude = None;
        store.create_report(user.id, no_location);

        assert_eq!(store.reports_with_location(None).len(), 1);
        assert_eq!(store.reports_with_location(Some("resuelto")).len(), 0);
    }

    #[test]
    fn export_filters_by_status() {
        let (mut store, user) = store_with_user("ana", Role::Sobrestante);
        store.create_report(user.id, report_request());
        let mut resolved = report_request();
        resolved.status = Some("resuelto".into());
        store.create_report(user.id, resolved);

        assert_eq!(store.reports_for_export(None, None, None).len(), 2);
        assert_eq!(
            store
                .reports_for_export(None, None, Some("resuelto"))
                .len(),
            1
        );
        let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
        assert!(store
            .reports_for_export(Some(tomorrow), None, None)
            .is_empty());
    }

    #[test]
    fn direct_messages_require_existing_receiver() {
        let (mut store, user) = store_with_user("ana", Role::Sobrestante);
        let err = store
            .send_message(user.id, "hola".into(), Some(999))
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn message_visibility_includes_broadcasts() {
        let (mut store, ana) = store_with_user("ana", Role::Sobrestante);
        let marco = store
            .insert_user("marco", "hash", None, None, Role::Other("LINIERO".into()), true)
            .unwrap();
        let lucia = store
            .insert_user("lucia", "hash", None, None, Role::JefeArea, true)
            .unwrap();

        store
            .send_message(ana.id, "directo".into(), Some(marco.id))
            .unwrap();
        store.send_message(lucia.id, "a todos".into(), None).unwrap();

        // Marco sees his direct message and the broadcast; Lucia only the
        // broadcast she sent.
        assert_eq!(store.messages_for_user(marco.id).len(), 2);
        assert_eq!(store.messages_for_user(lucia.id).len(), 1);
        assert_eq!(store.global_messages().len(), 1);
        assert_eq!(store.thread_between(ana.id, marco.id).len(), 1);
    }

    #[test]
    fn mark_read_and_delete_handle_missing_messages() {
        let mut store = InMemoryStore::new();
        assert_eq!(
            store.mark_read(1).unwrap_err().status,
            axum::http::StatusCode::NOT_FOUND
        );
        assert_eq!(
            store.delete_message(1).unwrap_err().status,
            axum::http::StatusCode::NOT_FOUND
        );
    }
}
