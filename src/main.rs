//! Service Gateway
//!
//! Public entry point of a container cluster, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   SERVICE GATEWAY                     │
//!                      │                                                       │
//!   Client Request     │  ┌─────────┐    ┌─────────┐    ┌──────────────┐       │
//!   ───────────────────┼─▶│   net   │───▶│  http   │───▶│   routing    │       │
//!                      │  │listener │    │ server  │    │ router +     │       │
//!                      │  │  + tls  │    │         │    │ resolver     │       │
//!                      │  └─────────┘    └────┬────┘    └──────┬───────┘       │
//!                      │                      │                │               │
//!                      │          /api/session│                ▼               │
//!                      │               ┌──────▼─────┐   ┌──────────────┐       │
//!                      │               │  session   │   │    proxy     │───────┼──▶ services
//!                      │               │ + identity │   │  forwarder   │       │
//!                      │               └────────────┘   └──────────────┘       │
//!                      │                                       ▲               │
//!                      │  ┌───────────┐   ┌──────────┐   ┌─────┴────────┐      │
//!   Docker Swarm  ◀────┼──│ discovery │──▶│ registry │──▶│ aggregator   │      │
//!                      │  │  poller   │   │  store   │   │ (GET /help)  │      │
//!                      │  └───────────┘   └──────────┘   └──────────────┘      │
//!                      │                                                       │
//!                      │   config · observability · lifecycle                 │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use service_gateway::config::load_config;
use service_gateway::lifecycle::{bootstrap, signals, Shutdown};
use service_gateway::observability::{init_logging, init_metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var_os("GATEWAY_CONFIG").map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    init_logging(&config.observability)?;
    if config.session.secret_generated {
        tracing::warn!("COOKIE_SECRET not set, generated an ephemeral secret");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        tls = config.listener.tls.enabled,
        resolver = %config.resolver.strategy,
        default_url = %config.upstreams.default_internal_url,
        "service-gateway starting"
    );

    if let Some(address) = &config.observability.metrics_address {
        init_metrics(address.parse()?)?;
    }

    let gateway = bootstrap(config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    gateway.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
