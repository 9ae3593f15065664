//! `POST /api/session` handler.
//!
//! # Responsibilities
//! - Validate the submitted credentials before any downstream call
//! - Exchange them for a token at the identity provider
//! - Store the token in the caller's session and set the cookie

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::http::response;
use crate::http::server::AppState;
use crate::session::Credentials;

pub const TOKEN_KEY: &str = "token";

pub async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match establish(&state, &headers, &body).await {
        Ok(set_cookie) => {
            let mut response = response::ok();
            response.headers_mut().insert(SET_COOKIE, set_cookie);
            response
        }
        Err(err) => err.into_response(),
    }
}

async fn establish(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<axum::http::HeaderValue, GatewayError> {
    // A body that is not a JSON object counts as missing credentials.
    let credentials: Credentials = serde_json::from_slice(body).unwrap_or_default();
    if !credentials.is_complete() {
        return Err(GatewayError::Unauthorized);
    }

    let token = state.identity.issue_token(&credentials).await.map_err(|err| {
        tracing::warn!(error = %err, "Identity provider did not issue a token");
        GatewayError::from_identity(err, state.distinguish_identity_errors)
    })?;

    let mut session = state.sessions.get(headers).await.map_err(|err| {
        tracing::error!(error = %err, "Failed to load session");
        GatewayError::from(err)
    })?;
    session.insert(TOKEN_KEY, token);

    let set_cookie = state.sessions.save(&session).await.map_err(|err| {
        tracing::error!(error = %err, session_id = %session.id(), "Failed to save session");
        GatewayError::from(err)
    })?;

    tracing::info!(session_id = %session.id(), new = session.is_new(), "Session established");
    Ok(set_cookie)
}
