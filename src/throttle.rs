// src/throttle.rs
//! Refresh throttle: gates outbound refresh attempts per data domain,
//! independent of cache staleness. The last-attempt timestamp lives in the
//! same persistent store as the cached data (key `throttle:<domain>`), so
//! many short-lived readers sharing one store cannot stampede the source.
//!
//! Access is read-modify-write without a lock, which is sound for a
//! single-threaded call site. A multi-process deployment must wrap the
//! timestamp write in a mutex or compare-and-swap.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cache::{AgePolicy, CacheStore};

#[derive(Clone)]
pub struct RefreshThrottle {
    store: Arc<dyn CacheStore>,
    policy: AgePolicy,
}

impl RefreshThrottle {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            policy: AgePolicy::refresh_throttle(),
        }
    }

    pub fn with_policy(store: Arc<dyn CacheStore>, policy: AgePolicy) -> Self {
        Self { store, policy }
    }

    fn key(domain: &str) -> String {
        format!("throttle:{domain}")
    }

    /// True when no attempt was recorded inside the current window; records
    /// the new attempt timestamp on success.
    pub async fn try_acquire(&self, domain: &str, now: DateTime<Utc>) -> bool {
        let key = Self::key(domain);
        if let Some(entry) = self.store.get(&key).await {
            if self.policy.is_within(entry.written_at, now) {
                return false;
            }
        }
        self.store.set(&key, Value::Null).await;
        true
    }

    /// Age of the last recorded attempt, for diagnostics.
    pub async fn last_attempt(&self, domain: &str) -> Option<DateTime<Utc>> {
        self.store
            .get(&Self::key(domain))
            .await
            .map(|e| e.written_at)
    }
}
