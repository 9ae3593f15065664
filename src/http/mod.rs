//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (add request ID)
//!     → POST /api/session → session handler
//!     → GET /help → route aggregator
//!     → anything else → routing engine decides target
//!     → proxy.rs (forward, relay response verbatim)
//!     → response.rs (gateway's own {"message": ...} bodies)
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use proxy::{Forwarder, ProxyError};
pub use request::X_REQUEST_ID;
pub use server::{build_router, gateway_routes, AppState, GatewayServer};
