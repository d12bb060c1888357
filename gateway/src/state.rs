use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::flow::FlowCompiler;
use crate::provider::{RetellClient, VoiceProvider};
use crate::session::{SessionRegistry, SessionResult, create_session_registry};

/// Version reported to the browser client
pub const API_VERSION: &str = "v2-dynamic";

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: Arc<dyn SessionRegistry>,
    /// `None` when no provider API key is configured
    pub provider: Option<Arc<dyn VoiceProvider>>,
    pub compiler: FlowCompiler,
}

impl AppState {
    /// Build state from configuration, connecting the session backend
    pub async fn new(config: ServerConfig) -> SessionResult<Arc<Self>> {
        let sessions = create_session_registry(&config).await?;
        info!(
            backend = sessions.backend_name(),
            ttl_secs = config.session_ttl_seconds,
            "Session registry ready"
        );

        let provider: Option<Arc<dyn VoiceProvider>> = match config.provider_api_key.as_deref() {
            Some(key) if !key.is_empty() => {
                let client = RetellClient::new(
                    key,
                    config.provider_base_url.clone(),
                    Duration::from_secs(config.provider_timeout_seconds),
                );
                info!(
                    provider = client.name(),
                    base_url = client.base_url(),
                    "Voice provider ready"
                );
                Some(Arc::new(client))
            }
            _ => {
                warn!("RETELL_API_KEY not set; call creation is disabled");
                None
            }
        };

        Ok(Self::with_components(config, sessions, provider))
    }

    /// Assemble state from already built parts
    pub fn with_components(
        config: ServerConfig,
        sessions: Arc<dyn SessionRegistry>,
        provider: Option<Arc<dyn VoiceProvider>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            sessions,
            provider,
            compiler: FlowCompiler::new(),
        })
    }
}
