// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fieldreport Server - Grid Incident Report API
//!
//! Stateless bearer-token API for utility field operations: incident
//! reports, catalog lookups, crew chat, map export and user administration.
//!
//! ## Modules
//!
//! - `auth` - Token codec and authorization gate (HMAC-SHA256)
//! - `dispatch` - Query-selector request dispatcher and route table
//! - `api` - Resource handlers (Axum)
//! - `store` - In-memory store backing the handlers

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod models;
pub mod password;
pub mod response;
pub mod state;
pub mod store;
pub mod upload;
pub mod validate;
