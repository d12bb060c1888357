use url::Url;

use super::{ConfigError, ServerConfig, SessionBackend};

/// Validate a fully merged configuration
pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    validate_provider_base_url(&config.provider_base_url)?;

    if config.provider_timeout_seconds == 0 {
        return Err(ConfigError::invalid_value(
            "provider timeout_seconds",
            "must be greater than 0",
        ));
    }
    if config.session_ttl_seconds == 0 {
        return Err(ConfigError::invalid_value(
            "session ttl_seconds",
            "must be greater than 0",
        ));
    }
    if config.session_max_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "session max_capacity",
            "must be greater than 0",
        ));
    }

    validate_session_backend(config.session_backend, config.redis_url.as_deref())?;

    if let Some(origins) = config.cors_allowed_origins.as_deref() {
        validate_cors_origins(origins)?;
    }

    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err(ConfigError::Invalid(
            "rate limit values must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_provider_base_url(base_url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(base_url)
        .map_err(|e| ConfigError::invalid_value("provider base_url", e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid_value(
            "provider base_url",
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// `*` must stand alone; CORS cannot mix a wildcard with explicit origins
fn validate_cors_origins(origins: &str) -> Result<(), ConfigError> {
    if origins.trim() == "*" {
        return Ok(());
    }

    if origins.split(',').any(|origin| origin.trim() == "*") {
        return Err(ConfigError::invalid_value(
            "CORS_ALLOWED_ORIGINS",
            "'*' cannot be combined with explicit origins",
        ));
    }

    Ok(())
}

fn validate_session_backend(
    backend: SessionBackend,
    redis_url: Option<&str>,
) -> Result<(), ConfigError> {
    if backend != SessionBackend::Redis {
        return Ok(());
    }

    let url = redis_url.ok_or_else(|| {
        ConfigError::Invalid("session backend 'redis' requires REDIS_URL".to_string())
    })?;

    let parsed =
        Url::parse(url).map_err(|e| ConfigError::invalid_value("REDIS_URL", e.to_string()))?;
    match parsed.scheme() {
        "redis" | "rediss" => Ok(()),
        other => Err(ConfigError::invalid_value(
            "REDIS_URL",
            format!("unsupported scheme '{other}'"),
        )),
    }
}
