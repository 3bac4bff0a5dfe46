// src/cache.rs
//! Key → (timestamp, value) store behind the orchestrator, plus the
//! date-dependent age policy shared by the cache TTL and the refresh
//! throttle.
//!
//! The store is an injected trait so tests run against the in-memory
//! double and production gets the file-backed one. Values are opaque JSON;
//! an unparseable value is the caller's signal to treat the entry as
//! absent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// First and last competition days. Inside this window data moves fast and
/// both the TTL and the throttle tighten.
pub const GAMES_START: &str = "2026-02-04";
pub const GAMES_END: &str = "2026-02-22";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub written_at: DateTime<Utc>,
    pub value: Value,
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn set(&self, key: &str, value: Value);
}

/// Maximum age for a timestamp, split on the competition window. The limit
/// is a function of the query-time date, not of the write-time date.
#[derive(Debug, Clone, Copy)]
pub struct AgePolicy {
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub inside: Duration,
    pub outside: Duration,
}

impl AgePolicy {
    pub fn new(inside: Duration, outside: Duration) -> Self {
        let window_start = GAMES_START.parse().expect("games start date");
        let window_end = GAMES_END.parse().expect("games end date");
        Self {
            window_start,
            window_end,
            inside,
            outside,
        }
    }

    /// Cache TTL: 30 minutes during the games, a day otherwise.
    pub fn schedule_ttl() -> Self {
        Self::new(Duration::minutes(30), Duration::hours(24))
    }

    /// Throttle window: coarser than the TTL on both sides, so "data looks
    /// stale" and "we may hit the network" stay decoupled.
    pub fn refresh_throttle() -> Self {
        Self::new(Duration::minutes(10), Duration::hours(6))
    }

    pub fn limit_at(&self, now: DateTime<Utc>) -> Duration {
        let today = now.date_naive();
        if today >= self.window_start && today <= self.window_end {
            self.inside
        } else {
            self.outside
        }
    }

    /// True while `written_at` is younger than the limit in force at `now`.
    pub fn is_within(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(written_at) < self.limit_at(now)
    }
}

/// In-memory store for tests and single-process runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: plant an entry with a chosen timestamp.
    pub fn insert_entry(&self, key: &str, written_at: DateTime<Utc>, value: Value) {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .insert(key.to_string(), CacheEntry { written_at, value });
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .get(key)
            .cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        self.inner.lock().expect("cache mutex poisoned").insert(
            key.to_string(),
            CacheEntry {
                written_at: Utc::now(),
                value,
            },
        );
    }
}

/// One JSON file per key under a data directory; survives restarts.
/// Read or parse failures count as a missing entry.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed domain strings; sanitize anyway.
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(target: "cache", key, error = %e, "unparseable cache file, treating as absent");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            written_at: Utc::now(),
            value,
        };
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        match serde_json::to_vec(&entry) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&path, bytes).await {
                    tracing::warn!(target: "cache", key, error = %e, "cache write failed");
                }
            }
            Err(e) => tracing::warn!(target: "cache", key, error = %e, "cache serialize failed"),
        }
    }
}
