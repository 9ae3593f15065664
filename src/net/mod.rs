//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind configured host:port)
//!     → tls.rs (load PEM certificate and key when TLS is on)
//!     → Hand off to HTTP layer (plain or rustls acceptor)
//! ```
//!
//! # Design Decisions
//! - TLS is terminated in-process; upstream traffic is plain HTTP
//! - Missing TLS material is a startup error, not a silent downgrade

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::load_tls_config;
