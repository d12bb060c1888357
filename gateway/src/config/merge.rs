use super::env::{load_from_env, tls_pair};
use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig};

/// Load the environment configuration and apply YAML values on top
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            if tls.enabled == Some(false) {
                config.tls = None;
            } else if tls.cert_path.is_some() || tls.key_path.is_some() {
                config.tls = tls_pair(tls.cert_path, tls.key_path, "server.tls")?;
            }
        }
    }

    if let Some(provider) = yaml.provider {
        if provider.api_key.is_some() {
            config.provider_api_key = provider.api_key;
        }
        if provider.agent_id.is_some() {
            config.provider_agent_id = provider.agent_id;
        }
        if let Some(base_url) = provider.base_url {
            config.provider_base_url = base_url;
        }
        if let Some(timeout) = provider.timeout_seconds {
            config.provider_timeout_seconds = timeout;
        }
    }

    if let Some(mode) = yaml.flow.and_then(|flow| flow.response_mode) {
        config.response_mode = mode;
    }

    if let Some(session) = yaml.session {
        if let Some(backend) = session.backend {
            config.session_backend = backend;
        }
        if let Some(ttl) = session.ttl_seconds {
            config.session_ttl_seconds = ttl;
        }
        if let Some(capacity) = session.max_capacity {
            config.session_max_capacity = capacity;
        }
        if session.redis_url.is_some() {
            config.redis_url = session.redis_url;
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}
