// src/orchestrator.rs
//! Composes the pipeline: cache-fresh / cache-stale / cache-absent
//! branching, fire-and-forget background refreshes gated by the throttle,
//! then broadcast enrichment and roster matching on whatever canonical
//! events the branch produced.
//!
//! Canonical events are what gets cached; enrichment and matching rebuild
//! a fresh object graph on every call, so a background refresh never
//! mutates data already handed to a caller.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

use crate::broadcast::{apply_rules, RuleSet};
use crate::cache::{AgePolicy, CacheStore};
use crate::matcher::{match_events, MatchedEvent};
use crate::schedule::{normalize::normalize, CanonicalEvent, RawEvent};
use crate::roster::RosterProvider;
use crate::source::EventSource;
use crate::throttle::RefreshThrottle;

pub const SCHEDULE_KEY: &str = "schedule";
pub const RULES_KEY: &str = "broadcast_rules";

/// What a background refresh ended up doing. Only observed by tests; the
/// production path drops the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { events: usize },
    Throttled,
    Failed,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("schedule_cache_fresh_total", "Calls served from a fresh cache.");
        describe_counter!(
            "schedule_cache_stale_total",
            "Calls served from a stale cache while a refresh was considered."
        );
        describe_counter!(
            "schedule_fallback_total",
            "Calls served from the static fallback dataset."
        );
        describe_counter!("schedule_bypass_total", "Cache-bypass live fetches.");
        describe_counter!("schedule_refresh_total", "Background refresh attempts.");
        describe_counter!(
            "schedule_refresh_throttled_total",
            "Background refreshes skipped by the throttle."
        );
        describe_counter!(
            "schedule_refresh_errors_total",
            "Background refreshes that failed (swallowed)."
        );
        describe_counter!(
            "normalize_dropped_total",
            "Raw records dropped by the medal/unknown-sport filter."
        );
    });
}

pub struct ScheduleOrchestrator {
    live: Arc<dyn EventSource>,
    fallback: Arc<dyn EventSource>,
    roster: Arc<dyn RosterProvider>,
    store: Arc<dyn CacheStore>,
    throttle: RefreshThrottle,
    ttl: AgePolicy,
    rules_path: PathBuf,
    refresh_tx: Option<UnboundedSender<RefreshOutcome>>,
}

enum CacheRead {
    Fresh(Vec<CanonicalEvent>),
    Stale(Vec<CanonicalEvent>),
    Absent,
}

impl ScheduleOrchestrator {
    pub fn new(
        live: Arc<dyn EventSource>,
        fallback: Arc<dyn EventSource>,
        roster: Arc<dyn RosterProvider>,
        store: Arc<dyn CacheStore>,
        rules_path: impl Into<PathBuf>,
    ) -> Self {
        ensure_metrics_described();
        Self {
            throttle: RefreshThrottle::new(store.clone()),
            live,
            fallback,
            roster,
            store,
            ttl: AgePolicy::schedule_ttl(),
            rules_path: rules_path.into(),
            refresh_tx: None,
        }
    }

    pub fn with_ttl(mut self, ttl: AgePolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_throttle_policy(mut self, policy: AgePolicy) -> Self {
        self.throttle = RefreshThrottle::with_policy(self.store.clone(), policy);
        self
    }

    /// Test observability only: every background refresh reports its
    /// outcome here.
    pub fn with_refresh_observer(mut self, tx: UnboundedSender<RefreshOutcome>) -> Self {
        self.refresh_tx = Some(tx);
        self
    }

    /// The pipeline entry point. `bypass` skips cache and throttle and
    /// forces a synchronous live fetch (write-through).
    pub async fn get_schedule(&self, bypass: bool) -> Result<Vec<MatchedEvent>> {
        let now = Utc::now();

        let canonical = if bypass {
            counter!("schedule_bypass_total").increment(1);
            self.fetch_live_write_through().await?
        } else {
            match self.read_cached(now).await {
                CacheRead::Fresh(events) => {
                    counter!("schedule_cache_fresh_total").increment(1);
                    events
                }
                CacheRead::Stale(events) => {
                    counter!("schedule_cache_stale_total").increment(1);
                    self.spawn_background_refresh();
                    events
                }
                CacheRead::Absent => {
                    counter!("schedule_fallback_total").increment(1);
                    self.spawn_background_refresh();
                    self.load_fallback_chain().await?
                }
            }
        };

        let rules = self.broadcast_rules(now).await;
        let roster = self.roster.roster().await.context("roster provider")?;

        let enriched = apply_rules(canonical, rules.as_ref());
        Ok(match_events(enriched, &roster))
    }

    /// Cache age and throttle timestamps, for the debug endpoint.
    pub async fn debug_snapshot(&self) -> DebugSnapshot {
        let now = Utc::now();
        let age = |written: Option<DateTime<Utc>>| {
            written.map(|w| now.signed_duration_since(w).num_seconds())
        };
        let schedule_written = self.store.get(SCHEDULE_KEY).await.map(|e| e.written_at);
        let rules_written = self.store.get(RULES_KEY).await.map(|e| e.written_at);
        DebugSnapshot {
            schedule_age_secs: age(schedule_written),
            rules_age_secs: age(rules_written),
            schedule_throttle_age_secs: age(self.throttle.last_attempt(SCHEDULE_KEY).await),
            rules_throttle_age_secs: age(self.throttle.last_attempt(RULES_KEY).await),
        }
    }

    async fn read_cached(&self, now: DateTime<Utc>) -> CacheRead {
        let Some(entry) = self.store.get(SCHEDULE_KEY).await else {
            return CacheRead::Absent;
        };
        let events: Vec<CanonicalEvent> = match serde_json::from_value(entry.value) {
            Ok(v) => v,
            Err(e) => {
                // Corruption counts as no cache at all.
                tracing::warn!(target: "schedule", error = %e, "corrupt schedule cache entry");
                return CacheRead::Absent;
            }
        };
        if self.ttl.is_within(entry.written_at, now) {
            CacheRead::Fresh(events)
        } else {
            CacheRead::Stale(events)
        }
    }

    async fn fetch_live_write_through(&self) -> Result<Vec<CanonicalEvent>> {
        match self.live.fetch_events().await {
            Ok(raw) => {
                let canonical = normalize_counted(&raw);
                self.write_schedule(&canonical).await;
                Ok(canonical)
            }
            Err(live_err) => {
                // Fixed fallback chain; hard failure only when both fail.
                tracing::warn!(target: "schedule", error = %live_err, "live fetch failed, trying fallback");
                let raw = self
                    .fallback
                    .fetch_events()
                    .await
                    .context("live and fallback sources both failed")?;
                Ok(normalize_counted(&raw))
            }
        }
    }

    async fn load_fallback_chain(&self) -> Result<Vec<CanonicalEvent>> {
        match self.fallback.fetch_events().await {
            Ok(raw) => Ok(normalize_counted(&raw)),
            Err(fb_err) => {
                tracing::warn!(target: "schedule", error = %fb_err, "fallback dataset unavailable, trying live");
                let raw = self
                    .live
                    .fetch_events()
                    .await
                    .context("live and fallback sources both failed")?;
                let canonical = normalize_counted(&raw);
                self.write_schedule(&canonical).await;
                Ok(canonical)
            }
        }
    }

    async fn write_schedule(&self, canonical: &[CanonicalEvent]) {
        match serde_json::to_value(canonical) {
            Ok(value) => self.store.set(SCHEDULE_KEY, value).await,
            Err(e) => tracing::warn!(target: "schedule", error = %e, "schedule cache serialize failed"),
        }
    }

    /// Fire-and-forget. The throttle check happens inside the task so the
    /// synchronous return path is never blocked; failures are logged and
    /// swallowed. The result only ever affects the *next* read.
    fn spawn_background_refresh(&self) {
        let live = self.live.clone();
        let store = self.store.clone();
        let throttle = self.throttle.clone();
        let rules_path = self.rules_path.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            let now = Utc::now();
            if !throttle.try_acquire(SCHEDULE_KEY, now).await {
                counter!("schedule_refresh_throttled_total").increment(1);
                notify(&tx, RefreshOutcome::Throttled);
            } else {
                counter!("schedule_refresh_total").increment(1);
                match live.fetch_events().await {
                    Ok(raw) => {
                        let canonical = normalize_counted(&raw);
                        match serde_json::to_value(&canonical) {
                            Ok(value) => {
                                store.set(SCHEDULE_KEY, value).await;
                                tracing::info!(
                                    target: "schedule",
                                    events = canonical.len(),
                                    "background refresh updated schedule cache"
                                );
                                notify(&tx, RefreshOutcome::Refreshed { events: canonical.len() });
                            }
                            Err(e) => {
                                tracing::warn!(target: "schedule", error = %e, "refresh serialize failed");
                                notify(&tx, RefreshOutcome::Failed);
                            }
                        }
                    }
                    Err(e) => {
                        counter!("schedule_refresh_errors_total").increment(1);
                        tracing::warn!(target: "schedule", error = %e, "background refresh failed");
                        notify(&tx, RefreshOutcome::Failed);
                    }
                }
            }

            // Broadcast rules refresh under its own throttle domain.
            if throttle.try_acquire(RULES_KEY, Utc::now()).await {
                match RuleSet::load(&rules_path) {
                    Ok(rules) => {
                        if let Ok(value) = serde_json::to_value(&rules) {
                            store.set(RULES_KEY, value).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(target: "schedule", error = %e, "broadcast rules refresh failed")
                    }
                }
            }
        });
    }

    /// Rules are an optional enrichment: any failure here degrades to
    /// `None` (empty broadcast lists), never an error.
    async fn broadcast_rules(&self, now: DateTime<Utc>) -> Option<RuleSet> {
        let cached = self.store.get(RULES_KEY).await;
        if let Some(entry) = &cached {
            if self.ttl.is_within(entry.written_at, now) {
                if let Ok(rules) = serde_json::from_value(entry.value.clone()) {
                    return Some(rules);
                }
            }
        }
        match RuleSet::load(&self.rules_path) {
            Ok(rules) => {
                if let Ok(value) = serde_json::to_value(&rules) {
                    self.store.set(RULES_KEY, value).await;
                }
                Some(rules)
            }
            Err(e) => {
                tracing::warn!(target: "schedule", error = %e, "broadcast rules unavailable");
                // Stale cached rules beat none at all.
                cached.and_then(|entry| serde_json::from_value(entry.value).ok())
            }
        }
    }
}

fn normalize_counted(raw: &[RawEvent]) -> Vec<CanonicalEvent> {
    let canonical = normalize(raw);
    let dropped = raw.len().saturating_sub(canonical.len());
    if dropped > 0 {
        counter!("normalize_dropped_total").increment(dropped as u64);
    }
    canonical
}

fn notify(tx: &Option<UnboundedSender<RefreshOutcome>>, outcome: RefreshOutcome) {
    if let Some(tx) = tx {
        let _ = tx.send(outcome);
    }
}

#[derive(Debug, Serialize)]
pub struct DebugSnapshot {
    pub schedule_age_secs: Option<i64>,
    pub rules_age_secs: Option<i64>,
    pub schedule_throttle_age_secs: Option<i64>,
    pub rules_throttle_age_secs: Option<i64>,
}
