//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (poller.rs)
//!     → orchestrator.rs (list swarm services carrying the expose label,
//!                        collect their network aliases)
//!     → manifest.rs (GET http://{alias}/help per alias, concurrently)
//!     → new Registry generation
//!     → RegistryStore::replace (one atomic swap)
//! ```
//!
//! # Design Decisions
//! - An orchestrator failure skips the cycle; the last generation stays
//! - A manifest failure drops only that service from the new generation
//! - Collaborators sit behind traits so tests and other orchestrators plug in

pub mod manifest;
pub mod orchestrator;
pub mod poller;

use thiserror::Error;

pub use manifest::{HttpManifestSource, ManifestSource};
pub use orchestrator::{DockerOrchestrator, ExposedService, Orchestrator};
pub use poller::{CycleReport, DiscoveryPoller};

/// Errors raised while discovering services.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Orchestrator API call failed.
    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    /// Manifest request failed at the transport level.
    #[error("manifest request to {service} failed: {reason}")]
    Transport { service: String, reason: String },

    /// Backend answered with a non-success status.
    #[error("manifest request to {service} returned status {status}")]
    Status { service: String, status: u16 },

    /// Backend answered with a body that is not a route manifest.
    #[error("manifest from {service} is malformed: {reason}")]
    Malformed { service: String, reason: String },

    /// Manifest request exceeded its deadline.
    #[error("manifest request to {service} timed out after {secs}s")]
    Timeout { service: String, secs: u64 },
}

/// Result type for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
