//! Identity provider client.
//!
//! # Responsibilities
//! - Exchange an email/password pair for a token (`POST {base}/token`)
//! - Tell a credential rejection apart from a provider failure

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credentials posted to `/api/session`. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Provider answered with a client error: the credentials were refused.
    #[error("identity provider rejected the credentials with status {0}")]
    Rejected(u16),

    /// Provider answered with a server error.
    #[error("identity provider failed with status {0}")]
    Upstream(u16),

    /// Provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    /// Provider answered 2xx with an unusable body.
    #[error("identity provider returned a malformed token response: {0}")]
    Malformed(String),
}

pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a token.
    fn issue_token<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<String, IdentityError>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    token_url: String,
}

impl HttpIdentityProvider {
    /// `base_url` must be normalized (no trailing slash).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token_url: format!("{}/token", base_url),
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    fn issue_token<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<String, IdentityError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(&self.token_url)
                .json(credentials)
                .send()
                .await
                .map_err(|e| IdentityError::Unreachable(e.to_string()))?;

            let status = response.status();
            if status.is_client_error() {
                return Err(IdentityError::Rejected(status.as_u16()));
            }
            if !status.is_success() {
                return Err(IdentityError::Upstream(status.as_u16()));
            }

            let body: TokenResponse = response
                .json()
                .await
                .map_err(|e| IdentityError::Malformed(e.to_string()))?;

            if body.token.is_empty() {
                return Err(IdentityError::Malformed("empty token".into()));
            }
            Ok(body.token)
        })
    }
}
