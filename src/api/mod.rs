// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface: the router, the CORS policy and the route table.
//!
//! All API traffic goes through the single dispatch endpoint at `/`; the
//! route table maps the `controller`/`action` selectors and HTTP method to
//! a handler. CORS preflights are answered by the layer and never reach
//! dispatch.

use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::any,
    Router,
};
use serde_json::json;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::dispatch::{self, HandlerResult, RequestCtx, RouteTable};
use crate::response::ok;
use crate::state::AppState;

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod export;
pub mod map;
pub mod reports;
pub mod users;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    Router::new()
        .route("/", any(dispatch::dispatch))
        .fallback(dispatch::unknown_route)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// CORS policy per environment: development allows any origin, production
/// only the configured allow-list (with credentials).
fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [
        CONTENT_TYPE,
        AUTHORIZATION,
        HeaderName::from_static("x-requested-with"),
        HeaderName::from_static("x-csrf-token"),
    ];

    if config.environment.is_production() {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600))
    }
}

/// The static route table. Built once at startup; the dispatcher only reads
/// it afterwards.
pub fn route_table() -> RouteTable {
    let mut table = RouteTable::new();

    table.resource("").action("", Method::GET, index);

    table
        .resource("auth")
        .action("login", Method::POST, auth::login)
        .action("register", Method::POST, auth::register);

    table
        .resource("users")
        .action("", Method::GET, users::list)
        .action("profile", Method::GET, users::profile)
        .action("profile", Method::PUT, users::update_profile)
        .by_id(Method::GET, users::get)
        .by_id(Method::PUT, users::update)
        .by_id(Method::DELETE, users::delete);

    table
        .resource("reports")
        .action("", Method::GET, reports::list)
        .action("", Method::POST, reports::create)
        .action("my", Method::GET, reports::my)
        .action("images", Method::POST, reports::upload_image)
        .by_id(Method::GET, reports::get)
        .by_id(Method::PUT, reports::update)
        .by_id(Method::DELETE, reports::delete);

    table
        .resource("catalog")
        .action("groups", Method::GET, catalog::groups)
        .action("anomalies", Method::GET, catalog::anomalies)
        .action("materials", Method::GET, catalog::materials);

    table
        .resource("chat")
        .action("", Method::GET, chat::list)
        .action("", Method::POST, chat::send)
        .action("global", Method::GET, chat::global)
        .action("read", Method::PUT, chat::mark_read)
        .by_id(Method::GET, chat::thread)
        .by_id(Method::DELETE, chat::delete);

    table
        .resource("map")
        .action("", Method::GET, map::locations)
        .action("locations", Method::GET, map::locations)
        .action("filter", Method::GET, map::filtered);

    table
        .resource("export")
        .action("reports", Method::GET, export::reports_csv)
        .action("csv", Method::GET, export::reports_csv);

    table
}

/// Default route: a short index of the available resources.
async fn index(_ctx: RequestCtx) -> HandlerResult {
    Ok(ok(
        "field report API",
        json!({
            "endpoints": {
                "auth": "/?controller=auth&action=login",
                "users": "/?controller=users",
                "reports": "/?controller=reports",
                "catalog": "/?controller=catalog&action=groups",
                "chat": "/?controller=chat",
                "map": "/?controller=map&action=locations",
                "export": "/?controller=export&action=reports",
            },
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::auth::Role;
    use crate::config::Config;
    use crate::password;
    use crate::store::InMemoryStore;

    fn seeded_state() -> AppState {
        let mut store = InMemoryStore::new();
        store
            .insert_user(
                "jefa",
                password::hash("mando123").unwrap(),
                None,
                Some("Lucía R".to_string()),
                Role::JefeArea,
                true,
            )
            .unwrap();
        store
            .insert_user(
                "ana",
                password::hash("cuadrilla").unwrap(),
                None,
                None,
                Role::Sobrestante,
                true,
            )
            .unwrap();
        let group = store.insert_group("Distribución");
        store.insert_anomaly(group.id, "Poste dañado");
        AppState::new(Config::for_tests("router-test-secret"), store)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/?controller=auth&action=login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn preflight_is_answered_without_auth() {
        let app = router(seeded_state());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/?controller=reports")
            .header(header::ORIGIN, "https://example.test")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn unknown_controller_is_route_not_found() {
        let app = router(seeded_state());
        let request = Request::builder()
            .uri("/?controller=widgets")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "route not found");
    }

    #[tokio::test]
    async fn wrong_method_is_method_not_allowed() {
        let app = router(seeded_state());
        let request = Request::builder()
            .method("DELETE")
            .uri("/?controller=reports")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "method not allowed");
    }

    #[tokio::test]
    async fn paths_outside_dispatch_fall_back_to_404() {
        let app = router(seeded_state());
        let request = Request::builder()
            .uri("/v1/reports")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_route_requires_a_token() {
        let app = router(seeded_state());
        let request = Request::builder()
            .uri("/?controller=reports")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "token not provided");
    }

    #[tokio::test]
    async fn login_then_create_and_fetch_report() {
        let app = router(seeded_state());
        let token = login(&app, "ana", "cuadrilla").await;

        let request = Request::builder()
            .method("POST")
            .uri("/?controller=reports")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::from(
                json!({
                    "matricula": "TX-1042",
                    "grupo_id": 3,
                    "anomalia_id": 4,
                    "descripcion": "poste inclinado",
                    "latitude": 19.43,
                    "longitude": -99.13,
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let report_id = body["data"]["id"].as_i64().unwrap();

        // Numeric action resolves through the by-id routes.
        let request = Request::builder()
            .uri(format!("/?controller=reports&action={report_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["matricula"], "TX-1042");
        assert_eq!(body["data"]["username"], "ana");
    }

    #[tokio::test]
    async fn user_listing_requires_the_privileged_role() {
        let app = router(seeded_state());

        let ana = login(&app, "ana", "cuadrilla").await;
        let request = Request::builder()
            .uri("/?controller=users")
            .header(header::AUTHORIZATION, format!("Bearer {ana}"))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["message"], "insufficient role");

        let jefa = login(&app, "jefa", "mando123").await;
        let request = Request::builder()
            .uri("/?controller=users")
            .header(header::AUTHORIZATION, format!("Bearer {jefa}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let app = router(seeded_state());
        let request = Request::builder()
            .method("POST")
            .uri("/?controller=auth&action=login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": "ana", "password": "wrong" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "invalid credentials");
    }

    #[tokio::test]
    async fn catalog_lookup_with_token() {
        let app = router(seeded_state());
        let token = login(&app, "ana", "cuadrilla").await;

        let request = Request::builder()
            .uri("/?controller=catalog&action=groups")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"][0]["name"], "Distribución");
    }

    #[tokio::test]
    async fn index_lists_endpoints_without_auth() {
        let app = router(seeded_state());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["data"]["endpoints"]["reports"].is_string());
    }
}
