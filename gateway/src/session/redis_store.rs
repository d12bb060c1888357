//! Redis-backed session registry shared across gateway instances

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::{debug, info};

use super::{SessionError, SessionRegistry, SessionResult};
use crate::flow::CallSession;

const KEY_PREFIX: &str = "flowcall:session:";

fn session_key(call_id: &str) -> String {
    format!("{KEY_PREFIX}{call_id}")
}

impl From<redis::RedisError> for SessionError {
    fn from(e: redis::RedisError) -> Self {
        SessionError::Unavailable(e.to_string())
    }
}

/// Session registry storing JSON-encoded sessions with `SET EX`
#[derive(Clone)]
pub struct RedisSessionRegistry {
    conn: ConnectionManager,
    default_ttl: Duration,
}

impl RedisSessionRegistry {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/0`)
    pub async fn connect(url: &str, default_ttl: Duration) -> SessionResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!("Connected to redis session store");
        Ok(Self { conn, default_ttl })
    }
}

#[async_trait]
impl SessionRegistry for RedisSessionRegistry {
    async fn put(&self, session: CallSession) -> SessionResult<()> {
        let payload = serde_json::to_string(&session)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(session_key(&session.call_id), payload, self.default_ttl.as_secs().max(1))
            .await?;
        debug!(call_id = %session.call_id, "Stored call session in redis");
        Ok(())
    }

    async fn refresh(&self, session: CallSession) -> SessionResult<bool> {
        let payload = serde_json::to_string(&session)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        let mut conn = self.conn.clone();
        // XX: only overwrite a key that still exists
        let stored: Option<String> = redis::cmd("SET")
            .arg(session_key(&session.call_id))
            .arg(payload)
            .arg("XX")
            .arg("EX")
            .arg(self.default_ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(stored.is_some())
    }

    async fn get(&self, call_id: &str) -> SessionResult<Option<CallSession>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(session_key(call_id)).await?;
        payload
            .map(|p| {
                serde_json::from_str(&p).map_err(|e| SessionError::Serialization(e.to_string()))
            })
            .transpose()
    }

    async fn expire(&self, call_id: &str, ttl: Duration) -> SessionResult<bool> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1) as i64;
        let updated: bool = conn.expire(session_key(call_id), seconds).await?;
        Ok(updated)
    }

    async fn remove(&self, call_id: &str) -> SessionResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(session_key(call_id)).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
