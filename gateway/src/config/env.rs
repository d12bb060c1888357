use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Read a variable, treating empty values as unset
pub(super) fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable with `FromStr`, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::invalid_value(key, e.to_string())),
        None => Ok(default),
    }
}

/// Build TLS settings from a cert/key pair; one without the other is an error
pub(super) fn tls_pair(
    cert: Option<String>,
    key: Option<String>,
    source: &str,
) -> Result<Option<TlsConfig>, ConfigError> {
    match (cert, key) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::Invalid(format!(
            "{source}: TLS certificate and key paths must be set together"
        ))),
    }
}

/// Load configuration from environment variables, with defaults for anything unset
pub(super) fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let defaults = ServerConfig::default();

    let tls = tls_pair(
        env_var("TLS_CERT_PATH"),
        env_var("TLS_KEY_PATH"),
        "TLS_CERT_PATH/TLS_KEY_PATH",
    )?;

    let mut config = ServerConfig::default();
    config.host = env_var("HOST").unwrap_or_else(|| defaults.host.clone());
    config.port = parse_env("PORT", defaults.port)?;
    config.tls = tls;

    config.provider_api_key = env_var("RETELL_API_KEY");
    config.provider_agent_id = env_var("RETELL_AGENT_ID");
    config.provider_base_url =
        env_var("RETELL_BASE_URL").unwrap_or_else(|| defaults.provider_base_url.clone());
    config.provider_timeout_seconds =
        parse_env("RETELL_TIMEOUT_SECONDS", defaults.provider_timeout_seconds)?;

    config.response_mode = parse_env("FLOW_RESPONSE_MODE", defaults.response_mode)?;

    config.session_backend = parse_env("SESSION_BACKEND", defaults.session_backend)?;
    config.session_ttl_seconds = parse_env("SESSION_TTL_SECONDS", defaults.session_ttl_seconds)?;
    config.session_max_capacity =
        parse_env("SESSION_MAX_CAPACITY", defaults.session_max_capacity)?;
    config.redis_url = env_var("REDIS_URL");

    config.cors_allowed_origins = env_var("CORS_ALLOWED_ORIGINS");
    config.rate_limit_requests_per_second = parse_env(
        "RATE_LIMIT_REQUESTS_PER_SECOND",
        defaults.rate_limit_requests_per_second,
    )?;
    config.rate_limit_burst_size =
        parse_env("RATE_LIMIT_BURST_SIZE", defaults.rate_limit_burst_size)?;

    Ok(config)
}
