//! In-process session registry backed by a moka cache
//!
//! Every entry carries its own time-to-live, so sessions of calls that never
//! report an end event are still evicted. Capacity is bounded as well.

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use std::future::ready;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{SessionRegistry, SessionResult};
use crate::flow::CallSession;

#[derive(Debug, Clone)]
struct SessionEntry {
    session: CallSession,
    ttl: Duration,
}

/// Expiry policy reading the TTL stored alongside each session
struct SessionExpiry;

impl Expiry<String, SessionEntry> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &SessionEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &SessionEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-memory session registry with per-entry TTL
#[derive(Clone)]
pub struct MemorySessionRegistry {
    cache: Cache<String, SessionEntry>,
    default_ttl: Duration,
}

impl MemorySessionRegistry {
    /// Create a registry holding at most `max_capacity` sessions
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(SessionExpiry)
            .build();

        Self { cache, default_ttl }
    }
}

#[async_trait]
impl SessionRegistry for MemorySessionRegistry {
    async fn put(&self, session: CallSession) -> SessionResult<()> {
        debug!(call_id = %session.call_id, ttl_secs = self.default_ttl.as_secs(), "Storing call session");
        let key = session.call_id.clone();
        self.cache
            .insert(
                key,
                SessionEntry {
                    session,
                    ttl: self.default_ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn refresh(&self, session: CallSession) -> SessionResult<bool> {
        let key = session.call_id.clone();
        let entry = SessionEntry {
            session,
            ttl: self.default_ttl,
        };
        let result = self
            .cache
            .entry_by_ref(key.as_str())
            .and_compute_with(|existing| {
                ready(match existing {
                    Some(_) => Op::Put(entry),
                    None => Op::Nop,
                })
            })
            .await;

        let refreshed = matches!(result, CompResult::ReplacedWith(_));
        debug!(call_id = %key, refreshed, "Refreshing call session");
        Ok(refreshed)
    }

    async fn get(&self, call_id: &str) -> SessionResult<Option<CallSession>> {
        Ok(self.cache.get(call_id).await.map(|entry| entry.session))
    }

    async fn expire(&self, call_id: &str, ttl: Duration) -> SessionResult<bool> {
        let result = self
            .cache
            .entry_by_ref(call_id)
            .and_compute_with(|existing| {
                ready(match existing {
                    Some(entry) => Op::Put(SessionEntry {
                        session: entry.into_value().session,
                        ttl,
                    }),
                    None => Op::Nop,
                })
            })
            .await;

        let updated = matches!(result, CompResult::ReplacedWith(_));
        if updated {
            debug!(call_id = %call_id, ttl_secs = ttl.as_secs(), "Resetting call session TTL");
        }
        Ok(updated)
    }

    async fn remove(&self, call_id: &str) -> SessionResult<()> {
        self.cache.invalidate(call_id).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
