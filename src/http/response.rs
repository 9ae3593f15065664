//! JSON message responses.
//!
//! Every response the gateway produces itself (as opposed to relaying a
//! backend) has the body `{"message": "<text>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub message: &'a str,
}

/// Build a `{"message": text}` response with `status`.
pub fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(Message { message: text })).into_response()
}

pub fn ok() -> Response {
    message(StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_body_is_exact() {
        let response = message(StatusCode::NOT_FOUND, "Not Found");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"message":"Not Found"}"#);
    }
}
