// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Standard response envelope.
//!
//! Every response body, success or failure, is
//! `{"success": <bool>, "message": <string>}` with an optional `data`
//! member. Handlers never emit bare payloads.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 200 with a message and a data payload.
pub fn ok<T: Serialize>(message: impl Into<String>, data: T) -> Response {
    (
        StatusCode::OK,
        Json(Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
        .into_response()
}

/// 200 with a message only.
pub fn ok_message(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(Envelope::<()> {
            success: true,
            message: message.into(),
            data: None,
        }),
    )
        .into_response()
}

/// A failure envelope with an explicit status.
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Envelope::<()> {
            success: false,
            message: message.into(),
            data: None,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn ok_wraps_data() {
        let response = ok("found", vec![1, 2, 3]);
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "found");
        assert_eq!(body["data"], serde_json::json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn ok_message_omits_data() {
        let response = ok_message("done");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn failure_sets_status_and_flag() {
        let response = failure(StatusCode::NOT_FOUND, "route not found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "route not found");
    }
}
