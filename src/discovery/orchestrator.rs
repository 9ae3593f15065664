//! Orchestrator queries.
//!
//! # Responsibilities
//! - List services that carry the expose label
//! - Extract every network alias declared on their task templates

use std::collections::HashMap;

use bollard::models::Service;
use bollard::service::ListServicesOptions;
use bollard::Docker;
use futures_util::future::BoxFuture;

use crate::discovery::{DiscoveryError, DiscoveryResult};

/// A labeled service and the aliases it is reachable under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExposedService {
    /// Orchestrator-side service name, for logging only.
    pub name: String,
    pub aliases: Vec<String>,
}

/// Source of the services the gateway should expose.
pub trait Orchestrator: Send + Sync {
    fn list_exposed(&self) -> BoxFuture<'_, DiscoveryResult<Vec<ExposedService>>>;
}

/// Docker Swarm backed orchestrator.
#[derive(Clone)]
pub struct DockerOrchestrator {
    docker: Docker,
    label: String,
}

impl DockerOrchestrator {
    /// Connect using the usual `DOCKER_HOST` environment or the local socket,
    /// and verify the daemon answers.
    pub async fn connect(label: impl Into<String>) -> DiscoveryResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| DiscoveryError::Orchestrator(e.to_string()))?;

        docker
            .ping()
            .await
            .map_err(|e| DiscoveryError::Orchestrator(format!("ping failed: {}", e)))?;

        let label = label.into();
        tracing::info!(label = %label, "Connected to Docker daemon");
        Ok(Self { docker, label })
    }
}

impl Orchestrator for DockerOrchestrator {
    fn list_exposed(&self) -> BoxFuture<'_, DiscoveryResult<Vec<ExposedService>>> {
        Box::pin(async move {
            let mut filters = HashMap::new();
            filters.insert("label".to_string(), vec![self.label.clone()]);
            let options = ListServicesOptions::<String> {
                filters,
                ..Default::default()
            };

            let services = self
                .docker
                .list_services(Some(options))
                .await
                .map_err(|e| DiscoveryError::Orchestrator(e.to_string()))?;

            Ok(services.iter().map(exposed_service).collect())
        })
    }
}

/// Collect the name and every alias of every network attachment.
pub fn exposed_service(service: &Service) -> ExposedService {
    let spec = service.spec.as_ref();
    let name = spec
        .and_then(|spec| spec.name.clone())
        .or_else(|| service.id.clone())
        .unwrap_or_default();

    let aliases = spec
        .and_then(|spec| spec.task_template.as_ref())
        .and_then(|task| task.networks.as_ref())
        .into_iter()
        .flatten()
        .flat_map(|network| network.aliases.iter().flatten())
        .filter(|alias| !alias.is_empty())
        .cloned()
        .collect();

    ExposedService { name, aliases }
}
