//! Published route listing (`GET /help`).

use std::sync::Arc;

use crate::registry::{sort_routes, Route, RegistryStore};

/// Merges the gateway's own routes with every registered manifest.
#[derive(Debug, Clone)]
pub struct Aggregator {
    static_routes: Vec<Route>,
    store: Arc<RegistryStore>,
}

impl Aggregator {
    /// `static_routes` must not contain catch-all patterns.
    pub fn new(static_routes: Vec<Route>, store: Arc<RegistryStore>) -> Self {
        Self { static_routes, store }
    }

    /// Build the listing against a single registry snapshot.
    pub fn routes(&self) -> Vec<Route> {
        let registry = self.store.snapshot();

        let mut routes = self.static_routes.clone();
        for (service, manifest) in registry.iter() {
            let prefix = format!("/api/{}", service);
            routes.extend(manifest.iter().map(|route| route.mounted_at(&prefix)));
        }

        sort_routes(&mut routes);
        routes
    }
}
