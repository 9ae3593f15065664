//! Server-side session persistence.
//!
//! # Responsibilities
//! - Load a session by id, or start a fresh one
//! - Persist session values
//!
//! # Design Decisions
//! - Session ids are random UUIDs; the cookie only carries the signed id
//! - An unknown id is not an error, it yields a new empty session
//! - Storage failures surface as `SessionError::Storage` (HTTP 500)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(String),

    #[error("session storage returned status {0}")]
    Status(u16),

    #[error("session cookie could not be encoded")]
    Cookie,
}

/// One server-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    values: HashMap<String, String>,
    is_new: bool,
}

impl Session {
    /// A fresh session with a random id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            values: HashMap::new(),
            is_new: true,
        }
    }

    fn restored(id: String, values: HashMap<String, String>) -> Self {
        Self { id, values, is_new: false }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence backend for sessions.
pub trait SessionStore: Send + Sync {
    /// Load `id`, or `None` when the store does not know it.
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Session>, SessionError>>;

    fn save<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<(), SessionError>>;
}

/// Process-local store, used for tests and single-instance deployments.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Session>, SessionError>> {
        let found = self
            .sessions
            .get(id)
            .map(|values| Session::restored(id.to_string(), values.value().clone()));
        Box::pin(async move { Ok(found) })
    }

    fn save<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<(), SessionError>> {
        self.sessions.insert(session.id.clone(), session.values.clone());
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    values: HashMap<String, String>,
}

/// Store backed by an HTTP storage service: `GET`/`PUT {base_url}/{id}`.
#[derive(Clone)]
pub struct HttpSessionStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

impl SessionStore for HttpSessionStore {
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<Session>, SessionError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url(id))
                .send()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;

            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let stored: StoredSession = response
                        .json()
                        .await
                        .map_err(|e| SessionError::Storage(e.to_string()))?;
                    Ok(Some(Session::restored(id.to_string(), stored.values)))
                }
                status => Err(SessionError::Status(status.as_u16())),
            }
        })
    }

    fn save<'a>(&'a self, session: &'a Session) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            let body = StoredSession {
                values: session.values.clone(),
            };
            let response = self
                .client
                .put(self.url(&session.id))
                .json(&body)
                .send()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(SessionError::Status(response.status().as_u16()))
            }
        })
    }
}
