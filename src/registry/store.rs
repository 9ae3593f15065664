//! Generation-swapped service registry.
//!
//! # Responsibilities
//! - Hold the current service → manifest generation
//! - Serve lock-free reads to request handlers
//! - Install a fully built generation in one atomic step
//!
//! # Design Decisions
//! - A generation is immutable once built; writers never touch the live one
//! - `snapshot()` hands out an `Arc`, so a reader keeps its generation alive
//!   for as long as it iterates even if a newer one is installed meanwhile
//! - Generation numbers only grow and exist for logs and metrics

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::registry::route::RouteManifest;

/// One complete, point-in-time view of the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    generation: u64,
    services: BTreeMap<String, RouteManifest>,
}

impl Registry {
    /// Build a registry from discovered manifests. The generation number is
    /// assigned when the registry is installed into a [`RegistryStore`].
    pub fn new(services: BTreeMap<String, RouteManifest>) -> Self {
        Self {
            generation: 0,
            services,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn manifest(&self, name: &str) -> Option<&RouteManifest> {
        self.services.get(name)
    }

    /// Services in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouteManifest)> {
        self.services.iter().map(|(name, routes)| (name.as_str(), routes))
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl FromIterator<(String, RouteManifest)> for Registry {
    fn from_iter<I: IntoIterator<Item = (String, RouteManifest)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Concurrency-safe holder of the current [`Registry`] generation.
#[derive(Debug)]
pub struct RegistryStore {
    current: ArcSwap<Registry>,
    next_generation: AtomicU64,
}

impl RegistryStore {
    /// Create a store holding the empty generation 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Registry::default()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Whether `name` is part of the current generation.
    pub fn has(&self, name: &str) -> bool {
        self.current.load().has(name)
    }

    /// The current generation. Never blocks writers.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.load_full()
    }

    /// Atomically install `registry` as the new generation and return it.
    pub fn replace(&self, mut registry: Registry) -> Arc<Registry> {
        registry.generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let installed = Arc::new(registry);
        self.current.store(installed.clone());

        tracing::debug!(
            generation = installed.generation,
            services = installed.len(),
            "Registry generation installed"
        );
        installed
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}
