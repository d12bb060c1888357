//! Session registry: call id → bound conversation flow
//!
//! Written once when a call is created and read on every webhook turn,
//! possibly from different server instances. Handlers only see the
//! [`SessionRegistry`] trait; the backing store is chosen from configuration.
//!
//! - `memory`: bounded in-process cache with per-entry TTL (single instance)
//! - `redis`: shared store for horizontally scaled deployments
//!   (requires the `redis-sessions` feature)

mod memory;
#[cfg(feature = "redis-sessions")]
mod redis_store;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ServerConfig, SessionBackend};
use crate::flow::CallSession;

pub use memory::MemorySessionRegistry;
#[cfg(feature = "redis-sessions")]
pub use redis_store::RedisSessionRegistry;

/// Errors from the session store
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store could not be reached or rejected the command
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be encoded or decoded
    #[error("Session serialization failed: {0}")]
    Serialization(String),

    /// The configured backend is not compiled into this binary
    #[error("Session backend '{0}' is not available in this build")]
    BackendNotAvailable(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Keyed store of live call sessions
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Bind or replace the session for `session.call_id`, with the default TTL
    async fn put(&self, session: CallSession) -> SessionResult<()>;

    /// Replace an existing session and restart its default TTL.
    ///
    /// Returns `false` and stores nothing when the session is gone, so an
    /// eviction racing with a webhook turn is never undone.
    async fn refresh(&self, session: CallSession) -> SessionResult<bool>;

    /// Look up the session for a call
    async fn get(&self, call_id: &str) -> SessionResult<Option<CallSession>>;

    /// Reset the time-to-live of an existing session.
    ///
    /// Returns `false` when no session exists for `call_id`.
    async fn expire(&self, call_id: &str, ttl: Duration) -> SessionResult<bool>;

    /// Drop the session, e.g. when the call ends
    async fn remove(&self, call_id: &str) -> SessionResult<()>;

    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}

/// Build the registry selected in configuration
pub async fn create_session_registry(
    config: &ServerConfig,
) -> SessionResult<Arc<dyn SessionRegistry>> {
    let ttl = Duration::from_secs(config.session_ttl_seconds);

    match config.session_backend {
        SessionBackend::Memory => Ok(Arc::new(MemorySessionRegistry::new(
            config.session_max_capacity,
            ttl,
        ))),
        #[cfg(feature = "redis-sessions")]
        SessionBackend::Redis => {
            let url = config.redis_url.as_deref().ok_or_else(|| {
                SessionError::Unavailable("REDIS_URL is required for the redis backend".to_string())
            })?;
            let registry = RedisSessionRegistry::connect(url, ttl).await?;
            Ok(Arc::new(registry))
        }
        #[cfg(not(feature = "redis-sessions"))]
        SessionBackend::Redis => Err(SessionError::BackendNotAvailable("redis".to_string())),
    }
}
