//! Service gateway library.
//!
//! Public entry point of a container cluster: terminates client traffic,
//! keeps a live registry of exposed services discovered from the
//! orchestrator, routes `/api/{service}/...` to them, and bridges logins
//! to session cookies.

pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod session;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use lifecycle::{Gateway, Shutdown};
