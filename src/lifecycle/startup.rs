//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order from a validated config
//! - Start the discovery poller alongside the HTTP server
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::{loader::parse_byte_size, GatewayConfig};
use crate::discovery::{
    DiscoveryError, DiscoveryPoller, DockerOrchestrator, HttpManifestSource, ManifestSource,
    Orchestrator,
};
use crate::http::{build_router, gateway_routes, AppState, Forwarder, GatewayServer};
use crate::lifecycle::Shutdown;
use crate::net::{self, ListenerError};
use crate::registry::RegistryStore;
use crate::routing::{resolver, Aggregator, Router};
use crate::session::{
    CookieOptions, CookieSigner, HttpIdentityProvider, HttpSessionStore, IdentityProvider,
    SessionError, SessionManager, SessionStore,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot reach container orchestrator: {0}")]
    Orchestrator(#[from] DiscoveryError),

    #[error("cannot build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot build session store: {0}")]
    SessionStore(#[from] SessionError),

    #[error("invalid cookie secret")]
    CookieSecret,

    #[error("invalid body limit: {0}")]
    BodyLimit(String),

    #[error("cannot load TLS material: {0}")]
    Tls(std::io::Error),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Server(std::io::Error),
}

/// A fully wired gateway, ready to bind.
pub struct Gateway {
    config: GatewayConfig,
    store: Arc<RegistryStore>,
    poller: Option<DiscoveryPoller>,
    state: AppState,
}

impl Gateway {
    /// Wire subsystems around explicit collaborators.
    pub fn assemble(
        config: GatewayConfig,
        store: Arc<RegistryStore>,
        discovery: Option<(Arc<dyn Orchestrator>, Arc<dyn ManifestSource>)>,
        identity: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, StartupError> {
        let resolver = resolver::from_config(&config, store.clone());
        tracing::info!(resolver = resolver.name(), "Service resolver selected");

        let router = Arc::new(Router::new(resolver, config.upstreams.default_internal_url.clone()));
        let aggregator = Arc::new(Aggregator::new(gateway_routes(), store.clone()));

        let signer = CookieSigner::new(&config.session.cookie_secret)
            .map_err(|_| StartupError::CookieSecret)?;
        let options = CookieOptions {
            name: config.session.cookie_name.clone(),
            path: "/".to_string(),
            http_only: true,
            secure: config.listener.tls.enabled,
            max_age_secs: config.session.max_age_secs,
        };

        let poller = discovery.map(|(orchestrator, manifests)| {
            DiscoveryPoller::new(orchestrator, manifests, store.clone(), &config.discovery)
        });

        let state = AppState {
            router,
            aggregator,
            forwarder: Forwarder::new(config.listener.tls.enabled),
            identity,
            sessions: SessionManager::new(sessions, signer, options),
            distinguish_identity_errors: config.session.distinguish_identity_errors,
        };

        Ok(Self { config, store, poller, state })
    }

    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Bind, serve, and run discovery until `shutdown` fires.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let body_limit = parse_byte_size(&self.config.listener.body_limit)
            .ok_or_else(|| StartupError::BodyLimit(self.config.listener.body_limit.clone()))?;
        let request_timeout = Duration::from_secs(self.config.listener.request_timeout_secs);

        let tls = if self.config.listener.tls.enabled {
            Some(
                net::load_tls_config(&self.config.listener.tls)
                    .await
                    .map_err(StartupError::Tls)?,
            )
        } else {
            None
        };

        let app = build_router(self.state, body_limit, request_timeout);
        let listener = net::bind(&self.config.listener).await?;

        let poller = self.poller.map(|poller| tokio::spawn(poller.run(shutdown.subscribe())));

        let server = GatewayServer::new(app, tls, request_timeout);
        let result = server.run(listener, shutdown.subscribe()).await;

        // A failed server must not leave the poller running.
        shutdown.trigger();
        if let Some(handle) = poller {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Discovery poller task failed");
            }
        }

        result.map_err(StartupError::Server)
    }
}

/// Build the production gateway: Docker discovery, HTTP session store,
/// HTTP identity provider.
pub async fn bootstrap(config: GatewayConfig) -> Result<Gateway, StartupError> {
    let store = Arc::new(RegistryStore::new());
    let upstream_timeout = Duration::from_secs(config.upstreams.timeout_secs);

    let discovery = if config.discovery.enabled {
        let orchestrator = DockerOrchestrator::connect(config.discovery.label.clone()).await?;
        let manifests =
            HttpManifestSource::new(Duration::from_secs(config.discovery.manifest_timeout_secs))?;
        tracing::info!(label = %config.discovery.label, "Connected to container orchestrator");
        Some((
            Arc::new(orchestrator) as Arc<dyn Orchestrator>,
            Arc::new(manifests) as Arc<dyn ManifestSource>,
        ))
    } else {
        tracing::warn!("Service discovery disabled, registry stays empty");
        None
    };

    let identity = HttpIdentityProvider::new(&config.upstreams.identity_provider_url, upstream_timeout)?;
    let sessions = HttpSessionStore::new(config.upstreams.session_storage_url.clone(), upstream_timeout)?;

    Gateway::assemble(config, store, discovery, Arc::new(identity), Arc::new(sessions))
}
