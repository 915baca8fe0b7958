// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login and registration handlers.

use chrono::Utc;
use serde_json::json;

use crate::audit::{AuditEvent, AuditEventType};
use crate::auth::Role;
use crate::dispatch::{HandlerResult, RequestCtx};
use crate::error::ApiError;
use crate::models::{LoginRequest, RegisterUserRequest};
use crate::password;
use crate::response::ok;
use crate::validate;

/// Longest password accepted at login.
const MAX_LOGIN_PASSWORD_LEN: usize = 32;
/// Longest password accepted when an administrator creates an account.
const MAX_REGISTER_PASSWORD_LEN: usize = 14;

/// `POST ?controller=auth&action=login`
///
/// The only unauthenticated route besides the API index. Verifies
/// credentials and returns a fresh token plus a user summary.
pub async fn login(ctx: RequestCtx) -> HandlerResult {
    let request: LoginRequest = ctx.json()?;

    let missing = validate::missing_fields(&[
        ("username", Some(request.username.as_str())),
        ("password", Some(request.password.as_str())),
    ]);
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }
    if !validate::max_length(&request.password, MAX_LOGIN_PASSWORD_LEN) {
        return Err(ApiError::bad_request("password exceeds the allowed length"));
    }

    let user = {
        let store = ctx.state.store.read().await;
        store.user_by_username(&request.username)
    };

    let Some(user) = user.filter(|user| user.active) else {
        AuditEvent::new(AuditEventType::LoginFailed)
            .with_meta(&ctx.meta)
            .with_detail(format!("unknown or inactive user {}", request.username))
            .failed()
            .record();
        return Err(ApiError::unauthorized("invalid credentials"));
    };

    if !password::verify(&request.password, &user.password_hash) {
        AuditEvent::new(AuditEventType::LoginFailed)
            .with_user(user.id)
            .with_meta(&ctx.meta)
            .failed()
            .record();
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    ctx.state.store.write().await.record_login(user.id, Utc::now());

    let token = ctx
        .state
        .gate
        .codec()
        .issue(user.id, &user.username, &user.role);

    AuditEvent::new(AuditEventType::Login)
        .with_user(user.id)
        .with_meta(&ctx.meta)
        .record();

    Ok(ok(
        "login successful",
        json!({
            "token": token,
            "user": {
                "id": user.id,
                "username": user.username,
                "role": user.role,
                "full_name": user.full_name,
            },
        }),
    ))
}

/// `POST ?controller=auth&action=register` — privileged-role only.
pub async fn register(ctx: RequestCtx) -> HandlerResult {
    let principal = ctx.require_role(&Role::JefeArea)?;
    let request: RegisterUserRequest = ctx.json()?;

    let mut missing = validate::missing_fields(&[
        ("username", Some(request.username.as_str())),
        ("password", Some(request.password.as_str())),
    ]);
    if request.role.is_none() {
        missing.push("role");
    }
    let (true, Some(role)) = (missing.is_empty(), request.role.clone()) else {
        return Err(ApiError::bad_request(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    };

    if !validate::max_length(&request.password, MAX_REGISTER_PASSWORD_LEN) {
        return Err(ApiError::bad_request(format!(
            "password must be at most {MAX_REGISTER_PASSWORD_LEN} characters"
        )));
    }
    if let Some(email) = request.email.as_deref() {
        if !validate::email(email) {
            return Err(ApiError::bad_request("invalid email format"));
        }
    }

    let password_hash =
        password::hash(&request.password).map_err(|_| ApiError::internal("could not create user"))?;

    let user = ctx.state.store.write().await.insert_user(
        request.username,
        password_hash,
        request.email,
        request.full_name,
        role,
        request.active.unwrap_or(true),
    )?;

    AuditEvent::new(AuditEventType::UserRegistered)
        .with_user(principal.user_id)
        .with_meta(&ctx.meta)
        .with_detail(format!("created user {}", user.username))
        .record();

    Ok(ok(
        "user created",
        json!({ "id": user.id, "username": user.username }),
    ))
}
