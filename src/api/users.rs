// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User administration and profile handlers.
//!
//! Listing, fetching, updating and deleting arbitrary users requires the
//! privileged role; the `profile` action lets any authenticated user read
//! and edit their own account.

use crate::auth::Role;
use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::models::UpdateUserRequest;
use crate::password;
use crate::response::{ok, ok_message};
use crate::validate;

/// Longest password accepted through self-service profile updates. The
/// register limit is separate.
const MAX_PROFILE_PASSWORD_LEN: usize = 8;
const MAX_ADMIN_PASSWORD_LEN: usize = 14;

/// `GET ?controller=users`
pub async fn list(ctx: RequestCtx) -> HandlerResult {
    ctx.require_role(&Role::JefeArea)?;
    let store = ctx.state.store.read().await;
    Ok(ok("users retrieved", store.list_users()))
}

/// `GET ?controller=users&action=profile`
pub async fn profile(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let store = ctx.state.store.read().await;
    let user = store
        .user_by_id(principal.user_id)
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(ok("profile retrieved", user.summary()))
}

/// `PUT ?controller=users&action=profile`
///
/// Self-service: only email, full name and password can change. Role and
/// active flags are administrator-only and ignored here.
pub async fn update_profile(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.authenticate()?;
    let request: UpdateUserRequest = ctx.json()?;

    let password_hash = match request.password.as_deref() {
        Some(new_password) if !new_password.is_empty() => {
            if !validate::max_length(new_password, MAX_PROFILE_PASSWORD_LEN) {
                return Err(ApiError::bad_request(format!(
                    "password must be at most {MAX_PROFILE_PASSWORD_LEN} characters"
                )));
            }
            Some(password::hash(new_password).map_err(|_| ApiError::internal("update failed"))?)
        }
        _ => None,
    };

    let self_update = UpdateUserRequest {
        email: request.email,
        full_name: request.full_name,
        role: None,
        active: None,
        password: None,
    };

    let mut store = ctx.state.store.write().await;
    store.update_user(principal.user_id, self_update, password_hash)?;
    Ok(ok_message("profile updated"))
}

/// `GET ?controller=users&action=<id>`
pub async fn get(ctx: RequestCtx) -> HandlerResult {
    ctx.require_role(&Role::JefeArea)?;
    let id = ctx.require_id()?;
    let store = ctx.state.store.read().await;
    let user = store
        .user_by_id(id)
        .ok_or_else(|| ApiError::not_found("user not found"))?;
    Ok(ok("user retrieved", user.summary()))
}

/// `PUT ?controller=users&action=<id>`
pub async fn update(ctx: RequestCtx) -> HandlerResult {
    ctx.require_role(&Role::JefeArea)?;
    let id = ctx.require_id()?;
    let request: UpdateUserRequest = ctx.json()?;

    if let Some(email) = request.email.as_deref() {
        if !validate::email(email) {
            return Err(ApiError::bad_request("invalid email format"));
        }
    }
    let password_hash = match request.password.as_deref() {
        Some(new_password) if !new_password.is_empty() => {
            if !validate::max_length(new_password, MAX_ADMIN_PASSWORD_LEN) {
                return Err(ApiError::bad_request(format!(
                    "password must be at most {MAX_ADMIN_PASSWORD_LEN} characters"
                )));
            }
            Some(password::hash(new_password).map_err(|_| ApiError::internal("update failed"))?)
        }
        _ => None,
    };

    let mut store = ctx.state.store.write().await;
    let user = store.update_user(id, request, password_hash)?;
    Ok(ok("user updated", user.summary()))
}

/// `DELETE ?controller=users&action=<id>`
pub async fn delete(ctx: RequestCtx) -> HandlerResult {
    ctx.require_role(&Role::JefeArea)?;
    let id = ctx.require_id()?;
    ctx.state.store.write().await.delete_user(id)?;
    Ok(ok_message("user deleted"))
}
