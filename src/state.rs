// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::AuthGate;
use crate::config::Config;
use crate::dispatch::RouteTable;
use crate::store::InMemoryStore;
use crate::upload::UploadManager;

/// Shared application state.
///
/// Everything here is either read-only after startup (config, gate, route
/// table, upload manager) or behind a lock (the store). Handlers receive a
/// clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<AuthGate>,
    pub uploads: Arc<UploadManager>,
    pub routes: Arc<RouteTable>,
    pub store: Arc<RwLock<InMemoryStore>>,
}

impl AppState {
    pub fn new(config: Config, store: InMemoryStore) -> Self {
        let gate = AuthGate::new(&config);
        let uploads = UploadManager::new(&config);
        Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            uploads: Arc::new(uploads),
            routes: Arc::new(crate::api::route_table()),
            store: Arc::new(RwLock::new(store)),
        }
    }
}
