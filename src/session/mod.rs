//! Session and authentication subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/session {email, password}
//!     → handler.rs (reject incomplete credentials with 401)
//!     → identity.rs (POST {identity_provider}/token)
//!     → SessionManager::get (cookie.rs verify → store.rs load)
//!     → session["token"] = token
//!     → SessionManager::save (store.rs save → cookie.rs Set-Cookie)
//! ```

pub mod cookie;
pub mod handler;
pub mod identity;
pub mod store;

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};

pub use cookie::{CookieOptions, CookieSigner};
pub use identity::{Credentials, HttpIdentityProvider, IdentityError, IdentityProvider};
pub use store::{HttpSessionStore, MemorySessionStore, Session, SessionError, SessionStore};

/// Reads and writes sessions through signed cookies.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    options: CookieOptions,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, signer: CookieSigner, options: CookieOptions) -> Self {
        Self { store, signer, options }
    }

    pub fn cookie_name(&self) -> &str {
        &self.options.name
    }

    /// Session referenced by the request cookie, or a new one when the cookie
    /// is missing, forged, or unknown to the store.
    pub async fn get(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let Some(id) = cookie::find_cookie(headers, &self.options.name)
            .and_then(|value| self.signer.verify(value))
        else {
            return Ok(Session::new());
        };

        match self.store.load(id).await? {
            Some(session) => Ok(session),
            None => {
                tracing::debug!(session_id = %id, "Unknown session id, starting a new session");
                Ok(Session::new())
            }
        }
    }

    /// Persist `session` and return the `Set-Cookie` header for it.
    pub async fn save(&self, session: &Session) -> Result<HeaderValue, SessionError> {
        self.store.save(session).await?;
        cookie::set_cookie_header(&self.options, &self.signer.sign(session.id()))
            .ok_or(SessionError::Cookie)
    }
}
