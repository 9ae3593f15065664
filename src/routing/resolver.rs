//! Service resolution strategies.
//!
//! # Design Decisions
//! - One trait, chosen once at startup; the request router never branches
//!   on which policy is active
//! - A resolver answers with the upstream authority (host[:port]) or None
//! - Resolution is synchronous and allocation-light; it runs per request

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::{GatewayConfig, ResolverStrategy};
use crate::registry::RegistryStore;

/// Maps a candidate service name taken from the request path to the
/// authority the request should be forwarded to.
pub trait ServiceResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, service: &str) -> Option<String>;

    /// Strategy name for logs.
    fn name(&self) -> &'static str;

    /// Whether every name this resolver accepts comes from a fixed or
    /// discovered set, as opposed to whatever the client sent.
    fn bounded(&self) -> bool {
        true
    }
}

/// Live lookup in the discovered registry. The alias is the upstream host.
#[derive(Debug, Clone)]
pub struct RegistryResolver {
    store: Arc<RegistryStore>,
}

impl RegistryResolver {
    pub fn new(store: Arc<RegistryStore>) -> Self {
        Self { store }
    }
}

impl ServiceResolver for RegistryResolver {
    fn resolve(&self, service: &str) -> Option<String> {
        self.store.has(service).then(|| service.to_string())
    }

    fn name(&self) -> &'static str {
        "registry"
    }
}

/// Allowlist fixed at boot.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    allowed: HashSet<String>,
}

impl StaticResolver {
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: services.into_iter().map(Into::into).collect(),
        }
    }
}

impl ServiceResolver for StaticResolver {
    fn resolve(&self, service: &str) -> Option<String> {
        self.allowed.contains(service).then(|| service.to_string())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Rewrites any bare alias to `{alias}{suffix}`.
#[derive(Debug, Clone)]
pub struct SuffixResolver {
    suffix: String,
}

impl SuffixResolver {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self { suffix: suffix.into() }
    }
}

impl ServiceResolver for SuffixResolver {
    fn resolve(&self, service: &str) -> Option<String> {
        is_bare_alias(service).then(|| format!("{}{}", service, self.suffix))
    }

    fn name(&self) -> &'static str {
        "suffix"
    }

    fn bounded(&self) -> bool {
        false
    }
}

/// A single DNS label: letters, digits, '-' and '_', not starting with '-'.
fn is_bare_alias(service: &str) -> bool {
    !service.is_empty()
        && service.len() <= 63
        && !service.starts_with('-')
        && service
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Build the resolver selected by configuration.
pub fn from_config(config: &GatewayConfig, store: Arc<RegistryStore>) -> Arc<dyn ServiceResolver> {
    match config.resolver.strategy {
        ResolverStrategy::Registry => Arc::new(RegistryResolver::new(store)),
        ResolverStrategy::Static => {
            Arc::new(StaticResolver::new(config.resolver.static_services.iter().cloned()))
        }
        ResolverStrategy::Suffix => {
            Arc::new(SuffixResolver::new(config.upstreams.internal_domain_suffix.clone()))
        }
    }
}
