//! Background discovery loop.
//!
//! # Responsibilities
//! - Tick on a fixed interval, independent of request traffic
//! - Build each registry generation from scratch, off to the side
//! - Install it with one atomic swap once the whole cycle is done
//! - Stop promptly on shutdown, dropping any in-flight manifest fetches

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::DiscoveryConfig;
use crate::discovery::{DiscoveryError, DiscoveryResult, ManifestSource, Orchestrator};
use crate::observability::metrics;
use crate::registry::{Registry, RegistryStore, RouteManifest};

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub generation: u64,
    pub registered: usize,
    pub failed: Vec<String>,
}

pub struct DiscoveryPoller {
    orchestrator: Arc<dyn Orchestrator>,
    manifests: Arc<dyn ManifestSource>,
    store: Arc<RegistryStore>,
    interval: Duration,
    manifest_timeout: Duration,
}

impl DiscoveryPoller {
    pub fn new(
        orchestrator: Arc<dyn Orchestrator>,
        manifests: Arc<dyn ManifestSource>,
        store: Arc<RegistryStore>,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            orchestrator,
            manifests,
            store,
            interval: Duration::from_secs(config.interval_secs),
            manifest_timeout: Duration::from_secs(config.manifest_timeout_secs),
        }
    }

    /// Override the per-manifest deadline.
    pub fn with_manifest_timeout(mut self, timeout: Duration) -> Self {
        self.manifest_timeout = timeout;
        self
    }

    /// Override the tick interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until the shutdown signal fires. The first cycle starts immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            manifest_timeout_secs = self.manifest_timeout.as_secs_f64(),
            "Discovery poller starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                result = self.poll_once() => match result {
                    Ok(report) => {
                        metrics::record_discovery_cycle("success");
                        tracing::info!(
                            generation = report.generation,
                            services = report.registered,
                            failed = report.failed.len(),
                            "Discovery cycle complete"
                        );
                    }
                    Err(e) => {
                        metrics::record_discovery_cycle("error");
                        tracing::error!(
                            error = %e,
                            generation = self.store.generation(),
                            "Discovery cycle failed, keeping current registry"
                        );
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown during discovery cycle, abandoning it");
                    break;
                }
            }
        }

        tracing::info!("Discovery poller stopped");
    }

    /// Run one full cycle and install its generation.
    ///
    /// On an orchestrator error nothing is installed and the previous
    /// generation remains authoritative.
    pub async fn poll_once(&self) -> DiscoveryResult<CycleReport> {
        let services = self.orchestrator.list_exposed().await?;

        let aliases: BTreeSet<String> = services
            .into_iter()
            .flat_map(|service| {
                if service.aliases.is_empty() {
                    tracing::debug!(service = %service.name, "Exposed service has no network aliases");
                }
                service.aliases
            })
            .collect();

        let fetches = aliases.into_iter().map(|alias| async move {
            let result = self.fetch_manifest(&alias).await;
            (alias, result)
        });

        let mut services: BTreeMap<String, RouteManifest> = BTreeMap::new();
        let mut failed = Vec::new();
        for (alias, result) in join_all(fetches).await {
            match result {
                Ok(manifest) => {
                    tracing::debug!(service = %alias, routes = manifest.len(), "Manifest fetched");
                    services.insert(alias, manifest);
                }
                Err(e) => {
                    tracing::warn!(service = %alias, error = %e, "Excluding service from registry");
                    metrics::record_manifest_failure(&alias);
                    failed.push(alias);
                }
            }
        }

        let installed = self.store.replace(Registry::new(services));
        metrics::record_registry(installed.generation(), installed.len());

        Ok(CycleReport {
            generation: installed.generation(),
            registered: installed.len(),
            failed,
        })
    }

    async fn fetch_manifest(&self, alias: &str) -> DiscoveryResult<RouteManifest> {
        match time::timeout(self.manifest_timeout, self.manifests.fetch(alias)).await {
            Ok(result) => result,
            Err(_) => Err(DiscoveryError::Timeout {
                service: alias.to_string(),
                secs: self.manifest_timeout.as_secs(),
            }),
        }
    }
}
