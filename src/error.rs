//! Gateway-level errors and their HTTP representation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::message;
use crate::session::{IdentityError, SessionError};

/// Errors a request handler turns into a JSON `{"message": ...}` response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("bad gateway: {0}")]
    BadGateway(String),

    /// Identity provider failure under the coalesced mapping.
    #[error("identity provider failure: {0}")]
    IdentityFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            GatewayError::IdentityFailure(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Map an identity provider error.
    ///
    /// By default every failure is a `500` whose body reads "Unauthorized",
    /// which is what existing clients of the session endpoint expect.
    /// With `distinguish` set, refused credentials become `401` and provider
    /// outages become `502`.
    pub fn from_identity(err: IdentityError, distinguish: bool) -> Self {
        match err {
            IdentityError::Rejected(_) if distinguish => GatewayError::Unauthorized,
            other if distinguish => GatewayError::BadGateway(other.to_string()),
            other => GatewayError::IdentityFailure(other.to_string()),
        }
    }

    fn text(&self) -> &'static str {
        match self {
            GatewayError::IdentityFailure(_) => "Unauthorized",
            other => other.status().canonical_reason().unwrap_or("Error"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Details stay in the logs; clients only see the status phrase.
        message(self.status(), self.text())
    }
}

impl From<SessionError> for GatewayError {
    fn from(err: SessionError) -> Self {
        GatewayError::Internal(err.to_string())
    }
}
