//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery poller (background)
//!     → builds Registry off to the side
//!     → store.rs replace() (single atomic swap)
//!
//! Request handlers
//!     → store.rs has() / snapshot() (atomic load, no locks)
//! ```
//!
//! # Design Decisions
//! - The store is the only shared mutable state in the gateway
//! - It is owned by the process and passed around as `Arc<RegistryStore>`
//! - Readers always observe exactly one complete generation

pub mod route;
pub mod store;

pub use route::{sort_routes, Route, RouteManifest};
pub use store::{Registry, RegistryStore};
