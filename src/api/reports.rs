// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Incident report handlers.
//!
//! Access model: any authenticated user can list and create. A single
//! report can be read or edited by its author, by a crew foreman
//! (`SOBRESTANTE`) or by the area chief; deletion is author-or-chief only.

use base64ct::{Base64, Encoding};
use serde_json::json;

use crate::audit::{AuditEvent, AuditEventType};
use crate::auth::{Principal, Role};
use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::models::{
    CreateReportRequest, NewReport, Report, StoreImageRequest, UpdateReportRequest,
};
use crate::response::{ok, ok_message};

fn can_access(principal: &Principal, report: &Report) -> bool {
    report.user_id == principal.user_id || principal.has_role(&Role::Sobrestante)
}

fn can_delete(principal: &Principal, report: &Report) -> bool {
    report.user_id == principal.user_id || principal.is_privileged()
}

/// `GET ?controller=reports`
pub async fn list(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    Ok(ok("reports retrieved", store.list_reports()))
}

/// `GET ?controller=reports&action=my`
pub async fn my(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    Ok(ok(
        "reports retrieved",
        store.reports_by_user(principal.user_id),
    ))
}

/// `POST ?controller=reports`
pub async fn create(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let request: CreateReportRequest = ctx.json()?;

    let mut missing = Vec::new();
    if request.matricula.trim().is_empty() {
        missing.push("matricula");
    }
    if request.descripcion.trim().is_empty() {
        missing.push("descripcion");
    }
    if request.grupo_id.is_none() {
        missing.push("grupo_id");
    }
    if request.anomalia_id.is_none() {
        missing.push("anomalia_id");
    }
    let (true, Some(grupo_id), Some(anomalia_id)) =
        (missing.is_empty(), request.grupo_id, request.anomalia_id)
    else {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    let report = ctx.state.store.write().await.create_report(
        principal.user_id,
        NewReport {
            matricula: request.matricula,
            grupo_id,
            anomalia_id,
            material_id: request.material_id,
            descripcion: request.descripcion,
            latitude: request.latitude,
            longitude: request.longitude,
            status: request.status,
        },
    );

    AuditEvent::new(AuditEventType::ReportCreated)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("report {}", report.id))
        .record();

    Ok(ok("report created", json!({ "id": report.id })))
}

/// `GET ?controller=reports&action=<id>`
pub async fn get(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let id = ctx.require_id()?;

    let store = ctx.state.store.read().await;
    let report = store
        .report_by_id(id)
        .ok_or_else(|| ApiError::not_found("report not found"))?;
    if !can_access(&principal, &report) {
        return Err(ApiError::forbidden("insufficient role"));
    }

    let view = store
        .report_view(id)
        .ok_or_else(|| ApiError::not_found("report not found"))?;
    Ok(ok("report retrieved", view))
}

/// `PUT ?controller=reports&action=<id>`
pub async fn update(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let id = ctx.require_id()?;
    let request: UpdateReportRequest = ctx.json()?;

    let mut store = ctx.state.store.write().await;
    let report = store
        .report_by_id(id)
        .ok_or_else(|| ApiError::not_found("report not found"))?;
    if !can_access(&principal, &report) {
        return Err(ApiError::forbidden("insufficient role"));
    }

    let updated = store.update_report(id, request)?;

    AuditEvent::new(AuditEventType::ReportUpdated)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("report {}", updated.id))
        .record();

    Ok(ok("report updated", json!({ "id": updated.id })))
}

/// `DELETE ?controller=reports&action=<id>`
pub async fn delete(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let id = ctx.require_id()?;

    let mut store = ctx.state.store.write().await;
    let report = store
        .report_by_id(id)
        .ok_or_else(|| ApiError::not_found("report not found"))?;
    if !can_delete(&principal, &report) {
        return Err(ApiError::forbidden("insufficient role"));
    }

    store.delete_report(id)?;

    AuditEvent::new(AuditEventType::ReportDeleted)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("report {id}"))
        .record();

    Ok(ok_message("report deleted"))
}

/// `POST ?controller=reports&action=images&id=<id>`
///
/// Accepts validated file metadata plus base64 content; the upload manager
/// returns the stored filename, which is attached to the report.
pub async fn upload_image(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let id = ctx.require_id()?;
    let request: StoreImageRequest = ctx.json()?;

    let bytes = Base64::decode_vec(&request.data)
        .map_err(|_| ApiError::bad_request("invalid base64 file data"))?;

    let mut store = ctx.state.store.write().await;
    let report = store
        .report_by_id(id)
        .ok_or_else(|| ApiError::not_found("report not found"))?;
    if !can_access(&principal, &report) {
        return Err(ApiError::forbidden("insufficient role"));
    }

    let filename = ctx
        .state
        .uploads
        .store(&request.filename, &request.content_type, &bytes)?;
    store.attach_image(id, filename.clone())?;

    AuditEvent::new(AuditEventType::ImageStored)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("report {id} image {filename}"))
        .record();

    Ok(ok("image stored", json!({ "filename": filename })))
}
