// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crew chat handlers.
//!
//! Messages without a receiver are broadcasts visible to everyone; direct
//! messages are visible to sender and receiver. A numeric action selects
//! the thread with that user (GET) or a message to delete (DELETE).

use serde_json::json;

use crate::audit::{AuditEvent, AuditEventType};
use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::models::SendMessageRequest;
use crate::response::{ok, ok_message};
use crate::validate;

const MAX_MESSAGE_LEN: usize = 500;

/// `GET ?controller=chat`
pub async fn list(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    Ok(ok(
        "messages retrieved",
        store.messages_for_user(principal.user_id),
    ))
}

/// `POST ?controller=chat`
pub async fn send(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let request: SendMessageRequest = ctx.json()?;

    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    if !validate::max_length(&request.message, MAX_MESSAGE_LEN) {
        return Err(ApiError::bad_request(format!(
            "message exceeds the maximum of {MAX_MESSAGE_LEN} characters"
        )));
    }

    let message = ctx.state.store.write().await.send_message(
        principal.user_id,
        request.message,
        request.receiver_id,
    )?;

    AuditEvent::new(AuditEventType::MessageSent)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .record();

    Ok(ok("message sent", json!({ "message_id": message.id })))
}

/// `GET ?controller=chat&action=global`
pub async fn global(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    Ok(ok("messages retrieved", store.global_messages()))
}

/// `PUT ?controller=chat&action=read&id=<id>`
pub async fn mark_read(ctx: RequestCtx) -> HandlerResult {
    ctx.authenticate()?;
    let id = ctx.require_id()?;
    ctx.state.store.write().await.mark_read(id)?;
    Ok(ok_message("message marked as read"))
}

/// `GET ?controller=chat&action=<user_id>` — thread with another user.
pub async fn thread(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let other_id = ctx.require_id()?;

    let store = ctx.state.store.read().await;
    if store.user_by_id(other_id).is_none() {
        return Err(ApiError::not_found("user not found"));
    }
    Ok(ok(
        "messages retrieved",
        store.thread_between(principal.user_id, other_id),
    ))
}

/// `DELETE ?controller=chat&action=<id>`
pub async fn delete(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let id = ctx.require_id()?;
    ctx.state.store.write().await.delete_message(id)?;

    AuditEvent::new(AuditEventType::MessageDeleted)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("message {id}"))
        .record();

    Ok(ok_message("message deleted"))
}
