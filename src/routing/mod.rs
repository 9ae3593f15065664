//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query)
//!     → router.rs (split /api/{service}/{rest})
//!     → resolver.rs (registry | static | suffix)
//!     → Return: RouteDecision
//!
//! GET /help
//!     → aggregator.rs (static routes + prefixed manifests, sorted)
//! ```
//!
//! # Design Decisions
//! - Resolver chosen once at startup, shared behind `Arc<dyn ServiceResolver>`
//! - Deterministic: same input and registry generation, same decision
//! - Explicit NotFound rather than silent default for API paths

pub mod aggregator;
pub mod resolver;
pub mod router;

pub use aggregator::Aggregator;
pub use resolver::{RegistryResolver, ServiceResolver, StaticResolver, SuffixResolver};
pub use router::{RouteDecision, Router, API_PREFIX};
