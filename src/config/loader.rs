//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use url::Url;
use uuid::Uuid;

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidValue { key: String, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: optional TOML file, then environment overrides,
/// then normalization and validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    finalize(config)
}

/// Normalize URLs, fill generated values and validate.
pub fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    let upstreams = &mut config.upstreams;
    upstreams.default_internal_url = normalize_url(&upstreams.default_internal_url);
    upstreams.session_storage_url = normalize_url(&upstreams.session_storage_url);
    upstreams.identity_provider_url = normalize_url(&upstreams.identity_provider_url);

    if config.session.cookie_secret.is_empty() {
        config.session.cookie_secret = Uuid::new_v4().simple().to_string();
        config.session.secret_generated = true;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment-style overrides using `lookup` to read variables.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(tls) = lookup("TLS") {
        config.listener.tls.enabled = tls.trim() != "disable";
    }
    if let Some(path) = lookup("TLS_CERT_PATH") {
        config.listener.tls.cert_path = path;
    }
    if let Some(path) = lookup("TLS_KEY_PATH") {
        config.listener.tls.key_path = path;
    }
    if let Some(limit) = lookup("BODY_LIMIT") {
        config.listener.body_limit = limit;
    }
    if let Some(port) = lookup("PORT") {
        config.listener.port = parse_value("PORT", &port)?;
    }
    if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
        config.listener.request_timeout_secs = parse_value("REQUEST_TIMEOUT_SECS", &secs)?;
    }

    if let Some(secret) = lookup("COOKIE_SECRET") {
        config.session.cookie_secret = secret;
    }
    if let Some(flag) = lookup("DISTINGUISH_IDENTITY_ERRORS") {
        config.session.distinguish_identity_errors = parse_value("DISTINGUISH_IDENTITY_ERRORS", &flag)?;
    }

    if let Some(url) = lookup("INTERNAL_DEFAULT_URL") {
        config.upstreams.default_internal_url = url;
    }
    if let Some(url) = lookup("SESSION_STORAGE_URL") {
        config.upstreams.session_storage_url = url;
    }
    if let Some(url) = lookup("IDENTITY_PROVIDER_URL") {
        config.upstreams.identity_provider_url = url;
    }
    if let Some(suffix) = lookup("INTERNAL_DOMAIN_SUFFIX") {
        config.upstreams.internal_domain_suffix = suffix;
    }

    if let Some(strategy) = lookup("RESOLVER") {
        config.resolver.strategy = parse_value("RESOLVER", &strategy)?;
    }
    if let Some(services) = lookup("STATIC_SERVICES") {
        config.resolver.static_services = services
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(secs) = lookup("DISCOVERY_INTERVAL_SECS") {
        config.discovery.interval_secs = parse_value("DISCOVERY_INTERVAL_SECS", &secs)?;
    }
    if let Some(label) = lookup("DISCOVERY_LABEL") {
        config.discovery.label = label;
    }
    if let Some(secs) = lookup("MANIFEST_TIMEOUT_SECS") {
        config.discovery.manifest_timeout_secs = parse_value("MANIFEST_TIMEOUT_SECS", &secs)?;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = match format.trim() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => return Err(ConfigError::InvalidValue { key: "LOG_FORMAT".into(), value: format }),
        };
    }
    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr).filter(|a| !a.is_empty());
    }

    Ok(())
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

/// Normalize an URL string: lowercase scheme and host, no trailing slash.
/// Unparseable input is returned trimmed so validation can report it.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => url.as_str().trim_end_matches('/').to_string(),
        Err(_) => raw.trim().trim_end_matches('/').to_string(),
    }
}

/// Parse a human readable size such as "5M" or "512K" into bytes.
/// Multiples are binary, plain digits are bytes.
pub fn parse_byte_size(raw: &str) -> Option<usize> {
    let s = raw.trim().to_ascii_uppercase();
    let s = s.strip_suffix('B').unwrap_or(&s);
    let (digits, multiplier) = match s.chars().last()? {
        'K' => (&s[..s.len() - 1], 1usize << 10),
        'M' => (&s[..s.len() - 1], 1usize << 20),
        'G' => (&s[..s.len() - 1], 1usize << 30),
        _ => (s, 1usize),
    };
    digits.trim().parse::<usize>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResolverStrategy;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, env(&[
            ("TLS", "disable"),
            ("PORT", "8080"),
            ("BODY_LIMIT", "1M"),
            ("INTERNAL_DEFAULT_URL", "http://ui/"),
            ("RESOLVER", "static"),
            ("STATIC_SERVICES", "users, billing,,"),
        ])).unwrap();

        assert!(!config.listener.tls.enabled);
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.body_limit, "1M");
        assert_eq!(config.upstreams.default_internal_url, "http://ui/");
        assert_eq!(config.resolver.strategy, ResolverStrategy::Static);
        assert_eq!(config.resolver.static_services, vec!["users", "billing"]);
    }

    #[test]
    fn test_tls_only_disabled_by_exact_value() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, env(&[("TLS", "off")])).unwrap();
        assert!(config.listener.tls.enabled);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = GatewayConfig::default();
        let err = apply_env(&mut config, env(&[("PORT", "https")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn test_finalize_normalizes_and_generates_secret() {
        let mut config = GatewayConfig::default();
        config.upstreams.default_internal_url = "HTTP://GUI/".into();
        let config = finalize(config).unwrap();

        assert_eq!(config.upstreams.default_internal_url, "http://gui");
        assert_eq!(config.upstreams.session_storage_url, "http://storage/sessions");
        assert_eq!(config.session.cookie_secret.len(), 32);
        assert!(!config.session.cookie_secret.contains('-'));
        assert!(config.session.secret_generated);
    }

    #[test]
    fn test_configured_secret_is_not_flagged_as_generated() {
        let mut config = GatewayConfig::default();
        apply_env(&mut config, env(&[("COOKIE_SECRET", "s3cret")])).unwrap();
        let config = finalize(config).unwrap();

        assert_eq!(config.session.cookie_secret, "s3cret");
        assert!(!config.session.secret_generated);
    }

    #[test]
    fn test_identity_error_mapping_is_opt_in() {
        let mut config = GatewayConfig::default();
        assert!(!config.session.distinguish_identity_errors);

        apply_env(&mut config, env(&[("DISTINGUISH_IDENTITY_ERRORS", "true")])).unwrap();
        assert!(config.session.distinguish_identity_errors);

        let err = apply_env(&mut config, env(&[("DISTINGUISH_IDENTITY_ERRORS", "yes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DISTINGUISH_IDENTITY_ERRORS"));
    }

    #[test]
    fn test_parse_byte_size() {
        assert_eq!(parse_byte_size("5M"), Some(5 * 1024 * 1024));
        assert_eq!(parse_byte_size("512k"), Some(512 * 1024));
        assert_eq!(parse_byte_size("2GB"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_byte_size("100"), Some(100));
        assert_eq!(parse_byte_size("lots"), None);
        assert_eq!(parse_byte_size(""), None);
    }
}
