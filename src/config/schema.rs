//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so a TOML file can seed them before the
//! environment overrides are applied.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (port, TLS, body limit).
    pub listener: ListenerConfig,

    /// Internal services the gateway talks to directly.
    pub upstreams: UpstreamConfig,

    /// Service discovery settings.
    pub discovery: DiscoveryConfig,

    /// Service resolution policy.
    pub resolver: ResolverConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// TLS settings.
    pub tls: TlsConfig,

    /// Maximum request body size, e.g. "5M".
    pub body_limit: String,

    /// Total time allowed for one request/response in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 443,
            tls: TlsConfig::default(),
            body_limit: "5M".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ListenerConfig {
    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Terminate TLS on the listener.
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
        }
    }
}

/// Internal collaborators addressed by URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Service receiving GET traffic that no other route claims.
    pub default_internal_url: String,

    /// Session persistence backend.
    pub session_storage_url: String,

    /// Identity provider issuing tokens.
    pub identity_provider_url: String,

    /// Suffix appended to bare aliases by the suffix resolver.
    pub internal_domain_suffix: String,

    /// Timeout for calls to the identity provider and session storage.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            default_internal_url: "http://gui".to_string(),
            session_storage_url: "http://storage/sessions".to_string(),
            identity_provider_url: "http://identity-provider".to_string(),
            internal_domain_suffix: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Discovery poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Run the discovery poller at all.
    pub enabled: bool,

    /// Seconds between two poll cycles.
    pub interval_secs: u64,

    /// Label a swarm service must carry to be exposed.
    pub label: String,

    /// Timeout for a single manifest fetch in seconds.
    pub manifest_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            label: "gateway-expose".to_string(),
            manifest_timeout_secs: 5,
        }
    }
}

/// Which resolution policy maps a service name to an upstream host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverStrategy {
    /// Live lookup in the discovered registry.
    #[default]
    Registry,
    /// Fixed allowlist built at boot.
    Static,
    /// Append the internal domain suffix to any bare alias.
    Suffix,
}

impl std::str::FromStr for ResolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registry" => Ok(Self::Registry),
            "static" => Ok(Self::Static),
            "suffix" => Ok(Self::Suffix),
            other => Err(format!("unknown resolver strategy '{}'", other)),
        }
    }
}

impl std::fmt::Display for ResolverStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Registry => "registry",
            Self::Static => "static",
            Self::Suffix => "suffix",
        };
        f.write_str(name)
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResolverConfig {
    pub strategy: ResolverStrategy,

    /// Allowlist for the static strategy.
    pub static_services: Vec<String>,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Secret used to sign session cookies. Generated at startup when empty.
    pub cookie_secret: String,

    /// Cookie name carrying the session id.
    pub cookie_name: String,

    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,

    /// Answer refused credentials with 401 and identity provider outages
    /// with 502 instead of a uniform 500.
    pub distinguish_identity_errors: bool,

    /// Set when `cookie_secret` was generated at load time.
    #[serde(skip)]
    pub secret_generated: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_secret: String::new(),
            cookie_name: "session".to_string(),
            max_age_secs: 30 * 24 * 60 * 60,
            distinguish_identity_errors: false,
            secret_generated: false,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus listener address; metrics are off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}
