//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit parseable)
//! - Check that the selected resolver has what it needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::loader::parse_byte_size;
use crate::config::schema::{GatewayConfig, ResolverStrategy};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid http(s) URL: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("body_limit '{0}' is not a valid size")]
    InvalidBodyLimit(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("static resolver needs at least one entry in static_services")]
    EmptyAllowlist,

    #[error("suffix resolver needs internal_domain_suffix")]
    MissingDomainSuffix,

    #[error("TLS is enabled but {0} is empty")]
    MissingTlsMaterial(&'static str),

    #[error("cookie_secret must not be empty")]
    EmptyCookieSecret,

    #[error("discovery label must not be empty")]
    EmptyLabel,
}

/// Validate a fully loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let urls = [
        ("default_internal_url", &config.upstreams.default_internal_url),
        ("session_storage_url", &config.upstreams.session_storage_url),
        ("identity_provider_url", &config.upstreams.identity_provider_url),
    ];
    for (field, value) in urls {
        let valid = Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidUrl { field, value: value.clone() });
        }
    }

    if parse_byte_size(&config.listener.body_limit).filter(|n| *n > 0).is_none() {
        errors.push(ValidationError::InvalidBodyLimit(config.listener.body_limit.clone()));
    }

    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("request_timeout_secs"));
    }
    if config.upstreams.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("upstream timeout_secs"));
    }
    if config.discovery.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration("discovery interval_secs"));
    }
    if config.discovery.manifest_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("manifest_timeout_secs"));
    }
    if config.discovery.label.trim().is_empty() {
        errors.push(ValidationError::EmptyLabel);
    }

    match config.resolver.strategy {
        ResolverStrategy::Static if config.resolver.static_services.is_empty() => {
            errors.push(ValidationError::EmptyAllowlist);
        }
        ResolverStrategy::Suffix if config.upstreams.internal_domain_suffix.is_empty() => {
            errors.push(ValidationError::MissingDomainSuffix);
        }
        _ => {}
    }

    let tls = &config.listener.tls;
    if tls.enabled {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::MissingTlsMaterial("cert_path"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::MissingTlsMaterial("key_path"));
        }
    }

    if config.session.cookie_secret.is_empty() {
        errors.push(ValidationError::EmptyCookieSecret);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
