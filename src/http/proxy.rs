//! Request forwarding to upstream services.
//!
//! # Responsibilities
//! - Rewrite the request URI to the routed target
//! - Strip hop-by-hop headers, add X-Forwarded-* headers
//! - Stream the request body up and the response back unchanged
//!
//! # Design Decisions
//! - Response status, headers and body are relayed verbatim
//! - Host is derived from the target URI by the client
//! - Connection failures become 502 Bad Gateway at the handler

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Request, Uri};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Reverse-proxy client shared by all handlers.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    forwarded_proto: HeaderValue,
}

impl Forwarder {
    /// `tls` tells upstreams which scheme the client used.
    pub fn new(tls: bool) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let forwarded_proto = HeaderValue::from_static(if tls { "https" } else { "http" });
        Self { client, forwarded_proto }
    }

    /// Send `request` to `target` and return the upstream response as is.
    pub async fn forward(&self, request: Request<Body>, target: Uri) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();

        let mut upstream = Request::builder()
            .method(parts.method)
            .uri(target)
            .version(axum::http::Version::HTTP_11);

        if let Some(headers) = upstream.headers_mut() {
            copy_headers(&parts.headers, headers);
            if let Some(host) = parts.headers.get(header::HOST) {
                headers.insert(X_FORWARDED_HOST, host.clone());
            }
            headers.insert(X_FORWARDED_PROTO, self.forwarded_proto.clone());
        }

        let upstream = upstream.body(body)?;
        let response = self.client.request(upstream).await?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Copy end-to-end headers. Also drops headers named by `Connection`.
fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    let named_by_connection: Vec<String> = from
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    for (name, value) in from {
        if name == header::HOST
            || HOP_BY_HOP.contains(name)
            || name.as_str() == "keep-alive"
            || named_by_connection.iter().any(|n| n == name.as_str())
        {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}
