//! Per-request route decision.
//!
//! # Responsibilities
//! - Split `/api/{service}/{rest}` into a candidate service and sub-path
//! - Ask the active resolver whether the service exists
//! - Fall back to the default internal service for other GET traffic
//!
//! # Design Decisions
//! - Pure decision: no I/O, the HTTP layer performs the forwarding
//! - An unknown API service is a 404, never a fallback
//! - Non-API paths with methods other than GET/HEAD are answered with 405

use std::sync::Arc;

use axum::http::{Method, Uri};

use crate::routing::resolver::ServiceResolver;

/// Path prefix owned by backend services.
pub const API_PREFIX: &str = "/api/";

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Forward to a resolved backend service.
    Service { service: String, target: Uri },
    /// Forward to the default internal service.
    Default { target: Uri },
    /// API path naming a service that is not currently available.
    NotFound { service: String },
    /// Non-API path with a method the fallback does not serve.
    MethodNotAllowed,
}

#[derive(Debug, Clone)]
pub struct Router {
    resolver: Arc<dyn ServiceResolver>,
    default_url: String,
}

impl Router {
    /// `default_url` must be normalized (no trailing slash).
    pub fn new(resolver: Arc<dyn ServiceResolver>, default_url: impl Into<String>) -> Self {
        Self {
            resolver,
            default_url: default_url.into(),
        }
    }

    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    /// Metric label for a routed service. Names the client can choose
    /// freely collapse into the resolver name.
    pub fn metric_label<'a>(&self, service: &'a str) -> &'a str {
        if self.resolver.bounded() {
            service
        } else {
            self.resolver.name()
        }
    }

    /// Decide where a request goes.
    pub fn decide(&self, method: &Method, uri: &Uri) -> RouteDecision {
        let path = uri.path();
        let query = uri.query().map(|q| format!("?{}", q)).unwrap_or_default();

        if let Some(rest) = path.strip_prefix(API_PREFIX) {
            let (service, remainder) = rest.split_once('/').unwrap_or((rest, ""));

            let Some(authority) = self.resolver.resolve(service) else {
                return RouteDecision::NotFound { service: service.to_string() };
            };

            let target = format!("http://{}/{}{}", authority, remainder, query);
            return match target.parse::<Uri>() {
                Ok(target) => RouteDecision::Service {
                    service: service.to_string(),
                    target,
                },
                Err(e) => {
                    tracing::debug!(uri = %target, error = %e, "Resolved target is not a valid URI");
                    RouteDecision::NotFound { service: service.to_string() }
                }
            };
        }

        if method != Method::GET && method != Method::HEAD {
            return RouteDecision::MethodNotAllowed;
        }

        let target = format!("{}{}{}", self.default_url, path, query);
        match target.parse::<Uri>() {
            Ok(target) => RouteDecision::Default { target },
            Err(e) => {
                tracing::debug!(uri = %target, error = %e, "Default target is not a valid URI");
                RouteDecision::NotFound { service: String::new() }
            }
        }
    }
}
