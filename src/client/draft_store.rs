//! TTL-bound draft persistence
//!
//! Wraps payloads in a `{data, expires}` JSON envelope with an absolute
//! expiry computed at save time. Expiry is lazy: a record past its expiry
//! is deleted on the read that finds it, so no background sweep is needed
//! in a single browser context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::storage::{DraftStorage, StorageError};
use crate::infrastructure::clock::Clock;

/// Default draft lifetime
pub const DEFAULT_TTL_MINUTES: u64 = 60;

/// Errors surfaced when persisting a draft. Reads never error: an
/// unreadable or undecodable record is treated as absent and removed.
#[derive(Debug, Error)]
pub enum DraftStoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to encode draft envelope: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted envelope; field names are fixed by the client contract
#[derive(Debug, Serialize, Deserialize)]
struct DraftEnvelope {
    data: Value,
    /// Absolute expiry, Unix milliseconds
    expires: u64,
}

/// Namespaced, TTL-bound draft store over a storage backend
pub struct DraftStore {
    backend: Arc<dyn DraftStorage>,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl DraftStore {
    pub fn new(backend: Arc<dyn DraftStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_namespace(backend, clock, "draft")
    }

    pub fn with_namespace(
        backend: Arc<dyn DraftStorage>,
        clock: Arc<dyn Clock>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            clock,
            namespace: namespace.into(),
        }
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}_{}", self.namespace, key)
    }

    /// Persist a payload under `key` with an absolute expiry of
    /// `now + ttl_minutes`. A TTL of zero makes the record stale on the
    /// next millisecond.
    pub fn save(&self, key: &str, payload: &Value, ttl_minutes: u64) -> Result<(), DraftStoreError> {
        let envelope = DraftEnvelope {
            data: payload.clone(),
            expires: self
                .clock
                .now_ms()
                .saturating_add(ttl_minutes.saturating_mul(60_000)),
        };
        let encoded = serde_json::to_string(&envelope)?;
        self.backend.set(&self.physical_key(key), encoded)?;
        debug!(key, ttl_minutes, "Saved draft");
        Ok(())
    }

    /// Load the payload under `key`, or `None` when absent, expired, or
    /// undecodable. Expired and undecodable records are removed on the way
    /// out.
    pub fn load(&self, key: &str) -> Option<Value> {
        let physical = self.physical_key(key);
        let raw = self.backend.get(&physical).ok().flatten()?;

        let envelope: DraftEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(key, error = %e, "Removing undecodable draft envelope");
                let _ = self.backend.remove(&physical);
                return None;
            }
        };

        if self.clock.now_ms() > envelope.expires {
            debug!(key, "Removing expired draft");
            let _ = self.backend.remove(&physical);
            return None;
        }

        Some(envelope.data)
    }

    /// Remove the record under `key` unconditionally
    pub fn clear(&self, key: &str) {
        let _ = self.backend.remove(&self.physical_key(key));
    }
}
