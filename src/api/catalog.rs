// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Catalog lookups: report groups, anomaly types and materials.
//!
//! Read-only reference data. `anomalies` and `materials` accept an optional
//! `group_id` filter.

use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::response::ok;

fn group_filter(ctx: &RequestCtx) -> Result<Option<i64>, ApiError> {
    match ctx.param("group_id") {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request("group_id must be numeric")),
    }
}

/// `GET ?controller=catalog&action=groups`
pub async fn groups(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    Ok(ok("groups retrieved", store.groups()))
}

/// `GET ?controller=catalog&action=anomalies[&group_id=N]`
pub async fn anomalies(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let filter = group_filter(&ctx)?;
    let store = ctx.state.store.read().await;
    Ok(ok("anomalies retrieved", store.anomalies(filter)))
}

/// `GET ?controller=catalog&action=materials[&group_id=N]`
pub async fn materials(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let filter = group_filter(&ctx)?;
    let store = ctx.state.store.read().await;
    Ok(ok("materials retrieved", store.materials(filter)))
}
