// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Spreadsheet export handler.
//!
//! Gated on the foreman role (which the area chief bypasses). Returns a CSV
//! attachment rather than the JSON envelope.

use axum::http::header;
use axum::response::IntoResponse;
use chrono::{NaiveDate, Utc};

use crate::audit::{AuditEvent, AuditEventType};
use crate::auth::Role;
use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::export::reports_to_csv;

fn date_filter(ctx: &RequestCtx, name: &'static str) -> Result<Option<NaiveDate>, ApiError> {
    match ctx.param(name) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name} must be YYYY-MM-DD"))),
    }
}

/// `GET ?controller=export&action=reports` (alias `csv`)
///
/// Optional filters: `start_date`, `end_date` (inclusive, on creation date)
/// and `status`.
pub async fn reports_csv(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.require_role(&Role::Sobrestante)?;

    let start_date = date_filter(&ctx, "start_date")?;
    let end_date = date_filter(&ctx, "end_date")?;
    let status = ctx.param("status");

    let views = {
        let store = ctx.state.store.read().await;
        store.reports_for_export(start_date, end_date, status)
    };
    if views.is_empty() {
        return Err(ApiError::not_found(
            "no data to export for the given filters",
        ));
    }

    let csv = reports_to_csv(&views);

    AuditEvent::new(AuditEventType::ExportGenerated)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("{} reports", views.len()))
        .record();

    let filename = format!("reports_{}.csv", Utc::now().format("%Y%m%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
