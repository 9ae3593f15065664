//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use service_gateway::http::{build_router, gateway_routes, AppState, Forwarder};
use service_gateway::registry::RegistryStore;
use service_gateway::routing::resolver::RegistryResolver;
use service_gateway::routing::{Aggregator, Router};
use service_gateway::session::{
    CookieOptions, CookieSigner, Credentials, IdentityError, IdentityProvider, MemorySessionStore,
    Session, SessionError, SessionManager, SessionStore,
};

/// What a mock backend saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

/// Start a programmable mock backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Recorded)
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen = recorded.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        seen.lock().unwrap().push(request.clone());

                        let (status, body) = f(request).await;
                        let reason = StatusCode::from_u16(status)
                            .ok()
                            .and_then(|s| s.canonical_reason())
                            .unwrap_or("OK");
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorded)
}

/// Start a simple mock backend that returns a fixed 200 response.
pub async fn start_mock_backend(response: &'static str) -> (SocketAddr, Recorded) {
    start_programmable_backend(move |_| async move { (200, response.to_string()) }).await
}

/// Start a mock backend that answers with the request target it saw.
pub async fn start_echo_backend() -> (SocketAddr, Recorded) {
    start_programmable_backend(|req| async move {
        (200, format!(r#"{{"method":"{}","target":"{}"}}"#, req.method, req.target))
    })
    .await
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    Some(RecordedRequest { method, target, headers, body })
}

/// Identity provider double with a fixed answer.
pub struct StubIdentity {
    answer: Result<String, fn() -> IdentityError>,
    calls: AtomicUsize,
}

impl StubIdentity {
    pub fn issuing(token: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(token.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(err: fn() -> IdentityError) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(err),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for StubIdentity {
    fn issue_token<'a>(&'a self, _credentials: &'a Credentials) -> BoxFuture<'a, Result<String, IdentityError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = match &self.answer {
            Ok(token) => Ok(token.clone()),
            Err(make) => Err(make()),
        };
        Box::pin(async move { answer })
    }
}

/// Session store whose every operation fails.
pub struct BrokenSessionStore;

impl SessionStore for BrokenSessionStore {
    fn load<'a>(&'a self, _id: &'a str) -> BoxFuture<'a, Result<Option<Session>, SessionError>> {
        Box::pin(async { Err(SessionError::Storage("storage offline".into())) })
    }

    fn save<'a>(&'a self, _session: &'a Session) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async { Err(SessionError::Storage("storage offline".into())) })
    }
}

pub fn cookie_options() -> CookieOptions {
    CookieOptions {
        name: "session".into(),
        path: "/".into(),
        http_only: true,
        secure: true,
        max_age_secs: 3600,
    }
}

/// Gateway state wired to a registry resolver and the given collaborators.
pub fn app_state(
    store: Arc<RegistryStore>,
    default_url: &str,
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionStore>,
) -> AppState {
    let resolver = Arc::new(RegistryResolver::new(store.clone()));
    AppState {
        router: Arc::new(Router::new(resolver, default_url)),
        aggregator: Arc::new(Aggregator::new(gateway_routes(), store)),
        forwarder: Forwarder::new(false),
        identity,
        sessions: SessionManager::new(sessions, CookieSigner::new("test-secret").unwrap(), cookie_options()),
        distinguish_identity_errors: false,
    }
}

/// Default state: empty collaborators that are never expected to be hit.
pub fn routing_state(store: Arc<RegistryStore>, default_url: &str) -> AppState {
    app_state(
        store,
        default_url,
        StubIdentity::issuing("unused"),
        Arc::new(MemorySessionStore::new()),
    )
}

/// Serve `state` on an ephemeral port. Returns the gateway base URL.
pub async fn spawn_gateway(state: AppState) -> String {
    let app = build_router(state, 5 * 1024 * 1024, Duration::from_secs(5));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Client that never uses a proxy from the environment.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
