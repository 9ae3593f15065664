//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the gateway's own endpoints
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Dispatch every other request through the routing engine
//! - Forward routed requests to upstream services
//! - Serve plain HTTP or TLS until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::error::GatewayError;
use crate::http::proxy::Forwarder;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::registry::Route;
use crate::routing::{Aggregator, RouteDecision, Router as ServiceRouter};
use crate::session::handler::create_session;
use crate::session::{IdentityProvider, SessionManager};

pub const SESSION_PATH: &str = "/api/session";
pub const HELP_PATH: &str = "/help";

/// Routes the gateway answers itself, listed first in `/help`.
pub fn gateway_routes() -> Vec<Route> {
    vec![Route::new("POST", SESSION_PATH), Route::new("GET", HELP_PATH)]
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ServiceRouter>,
    pub aggregator: Arc<Aggregator>,
    pub forwarder: Forwarder,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: SessionManager,
    /// Report refused credentials as 401 and provider outages as 502.
    pub distinguish_identity_errors: bool,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, body_limit: usize, request_timeout: Duration) -> Router {
    Router::new()
        .route(SESSION_PATH, post(create_session).fallback(dispatch))
        .route(HELP_PATH, get(help).fallback(dispatch))
        .fallback(dispatch)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn help(State(state): State<AppState>) -> Json<Vec<Route>> {
    Json(state.aggregator.routes())
}

/// Route and forward a request that no gateway endpoint claimed.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let method_str = method.to_string();
    let request_id = request_id(request.headers()).to_string();
    let path = request.uri().path().to_string();

    let (service, target) = match state.router.decide(&method, request.uri()) {
        RouteDecision::Service { service, target } => (Some(service), target),
        RouteDecision::Default { target } => (None, target),
        RouteDecision::NotFound { service } => {
            tracing::debug!(
                request_id = %request_id,
                service = %service,
                resolver = state.router.resolver_name(),
                "Unknown service"
            );
            let response = GatewayError::NotFound.into_response();
            metrics::record_request(&method_str, response.status().as_u16(), "none", start);
            return response;
        }
        RouteDecision::MethodNotAllowed => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "Method not allowed");
            let response = GatewayError::MethodNotAllowed.into_response();
            metrics::record_request(&method_str, response.status().as_u16(), "none", start);
            return response;
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        upstream = %target,
        "Forwarding request"
    );

    let label = match &service {
        Some(service) => state.router.metric_label(service),
        None => "default",
    };

    match state.forwarder.forward(request, target).await {
        Ok(response) => {
            metrics::record_request(&method_str, response.status().as_u16(), label, start);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                service = service.as_deref().unwrap_or("default"),
                error = %e,
                "Upstream error"
            );
            let response = GatewayError::BadGateway(e.to_string()).into_response();
            metrics::record_request(&method_str, response.status().as_u16(), label, start);
            response
        }
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    app: Router,
    tls: Option<RustlsConfig>,
    drain_timeout: Duration,
}

impl GatewayServer {
    /// `tls` set means the listener terminates TLS.
    pub fn new(app: Router, tls: Option<RustlsConfig>, drain_timeout: Duration) -> Self {
        Self { app, tls, drain_timeout }
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        match self.tls {
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, self.app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                    })
                    .await?;
            }
            Some(tls) => {
                tracing::info!(address = %addr, "HTTPS server starting");
                let handle = axum_server::Handle::new();
                let signal = handle.clone();
                let drain_timeout = self.drain_timeout;
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    signal.graceful_shutdown(Some(drain_timeout));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, tls)
                    .handle(handle)
                    .serve(self.app.into_make_service())
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
