//! Route manifest retrieval.
//!
//! # Responsibilities
//! - Ask one service for its self-declared routes (`GET http://{alias}/help`)
//! - Classify failures so the poller can log and skip that service

use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::discovery::{DiscoveryError, DiscoveryResult};
use crate::registry::RouteManifest;

/// Fetches the manifest of a single service.
pub trait ManifestSource: Send + Sync {
    fn fetch<'a>(&'a self, service: &'a str) -> BoxFuture<'a, DiscoveryResult<RouteManifest>>;
}

/// Manifest source speaking plain HTTP to `http://{service}/help`.
#[derive(Clone)]
pub struct HttpManifestSource {
    client: reqwest::Client,
}

impl HttpManifestSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// URL of the manifest endpoint for `service`.
    pub fn manifest_url(service: &str) -> String {
        format!("http://{}/help", service)
    }
}

impl ManifestSource for HttpManifestSource {
    fn fetch<'a>(&'a self, service: &'a str) -> BoxFuture<'a, DiscoveryResult<RouteManifest>> {
        Box::pin(async move {
            let response = self
                .client
                .get(Self::manifest_url(service))
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| DiscoveryError::Transport {
                    service: service.to_string(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(DiscoveryError::Status {
                    service: service.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(|e| DiscoveryError::Transport {
                service: service.to_string(),
                reason: e.to_string(),
            })?;

            serde_json::from_slice(&body).map_err(|e| DiscoveryError::Malformed {
                service: service.to_string(),
                reason: e.to_string(),
            })
        })
    }
}
