//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (GATEWAY_CONFIG)
//!     → loader.rs (deserialize, apply environment overrides)
//!     → loader.rs (normalize URLs, generate cookie secret)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a restart picks up changes
//! - All fields have defaults so the gateway runs from environment alone
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DiscoveryConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ResolverConfig, ResolverStrategy, SessionConfig, TlsConfig, UpstreamConfig,
};
