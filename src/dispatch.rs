// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request dispatcher.
//!
//! Routes are selected by the `controller` and `action` query parameters
//! plus the HTTP method, not by path segments — every API request hits the
//! single dispatch endpoint. The table is built once at startup and only
//! read afterwards.
//!
//! Resolution, per request: look up the resource; unknown → 404. Within the
//! resource, look up the action (empty string is the default action); if the
//! action is absent but numeric, it is treated as an id and dispatched
//! through the resource's by-id routes. A resolved action without a handler
//! for the method → 405. CORS preflights are terminated by the CORS layer
//! and never reach this module.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::audit::RequestMeta;
use crate::auth::{AuthError, Principal, Role};
use crate::error::ApiError;
use crate::response::failure;
use crate::state::AppState;

/// Upper bound on a request body. Large enough for a base64-encoded image
/// at the upload cap.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Routing failures, surfaced directly as envelope responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
}

impl RouteError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RouteError::NotFound => StatusCode::NOT_FOUND,
            RouteError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        failure(self.status_code(), self.to_string())
    }
}

/// Everything a handler gets: shared state, the request surface, and the
/// selectors the dispatcher already resolved.
pub struct RequestCtx {
    pub state: AppState,
    pub method: Method,
    pub headers: HeaderMap,
    pub params: HashMap<String, String>,
    /// Numeric id, from the `id` parameter or a numeric action.
    pub id: Option<i64>,
    pub body: Bytes,
    pub meta: RequestMeta,
}

impl RequestCtx {
    /// Pass the auth gate. Handlers call this before touching any
    /// collaborator.
    pub fn authenticate(&self) -> Result<Principal, AuthError> {
        self.state.gate.validate(&self.headers, &self.meta)
    }

    /// Pass the auth gate and require a role.
    pub fn require_role(&self, required: &Role) -> Result<Principal, AuthError> {
        self.state.gate.require_role(&self.headers, &self.meta, required)
    }

    /// Deserialize the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|_| ApiError::bad_request("invalid JSON body"))
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The id selector, required.
    pub fn require_id(&self) -> Result<i64, ApiError> {
        self.id
            .ok_or_else(|| ApiError::bad_request("id parameter required"))
    }
}

pub type HandlerResult = Result<Response, ApiError>;
type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;
type Handler = Arc<dyn Fn(RequestCtx) -> HandlerFuture + Send + Sync>;

#[derive(Default)]
struct MethodMap {
    handlers: HashMap<Method, Handler>,
}

/// Routes of one resource: named actions plus optional by-id routes.
#[derive(Default)]
pub struct ResourceRoutes {
    actions: HashMap<&'static str, MethodMap>,
    by_id: MethodMap,
}

impl ResourceRoutes {
    /// Register a handler for a named action. The empty string is the
    /// resource's default action.
    pub fn action<F, Fut>(&mut self, name: &'static str, method: Method, f: F) -> &mut Self
    where
        F: Fn(RequestCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.actions
            .entry(name)
            .or_default()
            .handlers
            .insert(method, boxed(f));
        self
    }

    /// Register a handler reached by a numeric action (`?controller=x&action=7`).
    pub fn by_id<F, Fut>(&mut self, method: Method, f: F) -> &mut Self
    where
        F: Fn(RequestCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.by_id.handlers.insert(method, boxed(f));
        self
    }
}

fn boxed<F, Fut>(f: F) -> Handler
where
    F: Fn(RequestCtx) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// The static route table. Built once by [`crate::api::route_table`].
#[derive(Default)]
pub struct RouteTable {
    resources: HashMap<&'static str, ResourceRoutes>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(&mut self, name: &'static str) -> &mut ResourceRoutes {
        self.resources.entry(name).or_default()
    }

    /// Resolve a (resource, action, method) triple to a handler.
    ///
    /// Returns the handler and, when the action string was numeric, the id
    /// it encodes.
    fn resolve(
        &self,
        resource: &str,
        action: &str,
        method: &Method,
    ) -> Result<(Handler, Option<i64>), RouteError> {
        let routes = self.resources.get(resource).ok_or(RouteError::NotFound)?;

        if let Some(methods) = routes.actions.get(action) {
            return match methods.handlers.get(method) {
                Some(handler) => Ok((handler.clone(), None)),
                None => Err(RouteError::MethodNotAllowed),
            };
        }

        if let Ok(id) = action.parse::<i64>() {
            if routes.by_id.handlers.is_empty() {
                return Err(RouteError::NotFound);
            }
            return match routes.by_id.handlers.get(method) {
                Some(handler) => Ok((handler.clone(), Some(id))),
                None => Err(RouteError::MethodNotAllowed),
            };
        }

        Err(RouteError::NotFound)
    }
}

/// The single dispatch endpoint.
pub async fn dispatch(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request<Body>,
) -> Response {
    let method = request.method().clone();
    let headers = request.headers().clone();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let resource = params.get("controller").map(String::as_str).unwrap_or("");
    let action = params.get("action").map(String::as_str).unwrap_or("");
    let meta = RequestMeta {
        ip,
        endpoint: format!("{resource}/{action}"),
    };

    tracing::debug!(
        controller = resource,
        action,
        method = %method,
        "dispatching request"
    );

    let (handler, action_id) = match state.routes.resolve(resource, action, &method) {
        Ok(resolved) => resolved,
        Err(err) => return err.into_response(),
    };

    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return ApiError::bad_request("unable to read request body").into_response(),
    };

    let id = action_id.or_else(|| {
        params
            .get("id")
            .and_then(|raw| raw.parse::<i64>().ok())
    });

    let ctx = RequestCtx {
        state,
        method,
        headers,
        params,
        id,
        body,
        meta,
    };

    match handler(ctx).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Fallback for paths outside the dispatch endpoint.
pub async fn unknown_route() -> Response {
    RouteError::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ok_message;

    async fn stub(_ctx: RequestCtx) -> HandlerResult {
        Ok(ok_message("stub"))
    }

    fn table() -> RouteTable {
        let mut table = RouteTable::new();
        table
            .resource("reports")
            .action("", Method::GET, stub)
            .action("", Method::POST, stub)
            .action("my", Method::GET, stub)
            .by_id(Method::GET, stub)
            .by_id(Method::DELETE, stub);
        table.resource("catalog").action("groups", Method::GET, stub);
        table
    }

    #[test]
    fn default_action_dispatches_per_method() {
        let table = table();
        assert!(table.resolve("reports", "", &Method::GET).is_ok());
        assert!(table.resolve("reports", "", &Method::POST).is_ok());
        assert!(matches!(
            table.resolve("reports", "", &Method::DELETE),
            Err(RouteError::MethodNotAllowed)
        ));
    }

    #[test]
    fn unknown_resource_is_not_found() {
        assert!(matches!(
            table().resolve("nothing", "", &Method::GET),
            Err(RouteError::NotFound)
        ));
    }

    #[test]
    fn unknown_action_is_not_found() {
        assert!(matches!(
            table().resolve("reports", "everything", &Method::GET),
            Err(RouteError::NotFound)
        ));
    }

    #[test]
    fn numeric_action_resolves_through_by_id_routes() {
        let table = table();
        let resolved = table.resolve("reports", "42", &Method::GET);
        assert!(matches!(resolved, Ok((_, Some(42)))));

        assert!(matches!(
            table.resolve("reports", "42", &Method::PUT),
            Err(RouteError::MethodNotAllowed)
        ));
    }

    #[test]
    fn numeric_action_without_by_id_routes_is_not_found() {
        assert!(matches!(
            table().resolve("catalog", "42", &Method::GET),
            Err(RouteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn route_errors_render_the_envelope() {
        let response = RouteError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "route not found");

        let response = RouteError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
