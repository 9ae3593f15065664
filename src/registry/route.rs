//! Route and manifest types shared by discovery, routing and the help listing.

use serde::{Deserialize, Serialize};

/// A single endpoint, as declared by a backend or by the gateway itself.
///
/// The derived ordering compares `path` first and `method` second, which is
/// the canonical order of every published route listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Route {
    pub path: String,
    pub method: String,
}

impl Route {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }

    /// Copy of this route with its path mounted under `prefix`.
    pub fn mounted_at(&self, prefix: &str) -> Self {
        Self {
            path: format!("{}{}", prefix, self.path),
            method: self.method.clone(),
        }
    }
}

/// Ordered routes reported by one backend.
pub type RouteManifest = Vec<Route>;

/// Sort routes into canonical order.
pub fn sort_routes(routes: &mut [Route]) {
    routes.sort();
}
