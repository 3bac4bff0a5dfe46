//! Integration tests for the orchestrator's cache/refresh state machine.
//!
//! Covered:
//! - fresh cache serves with zero outbound calls
//! - stale cache serves immediately and refreshes in the background
//! - throttle gates a second background refresh
//! - absent cache serves the static fallback, never the live API
//! - corrupt cache entries count as absent
//! - bypass fetches live synchronously and writes through
//! - the live → fallback failure chain, and the hard error when both fail

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};

use games_schedule_tracker::cache::{AgePolicy, CacheStore, MemoryStore};
use games_schedule_tracker::orchestrator::{RefreshOutcome, ScheduleOrchestrator, SCHEDULE_KEY};
use games_schedule_tracker::roster::{RosterMember, RosterProvider};
use games_schedule_tracker::schedule::{normalize::normalize, Gender, RawEvent};
use games_schedule_tracker::source::EventSource;

struct StubSource {
    name: &'static str,
    events: Vec<RawEvent>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubSource {
    fn ok(name: &'static str, events: Vec<RawEvent>) -> Arc<Self> {
        Arc::new(Self {
            name,
            events,
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn down(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            events: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for StubSource {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("{} source down", self.name);
        }
        Ok(self.events.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

struct StubRoster(Vec<RosterMember>);

#[async_trait]
impl RosterProvider for StubRoster {
    async fn roster(&self) -> Result<Vec<RosterMember>> {
        Ok(self.0.clone())
    }
}

fn raw_downhill(id: &str) -> RawEvent {
    RawEvent {
        id: Some(id.to_string()),
        date: Some("2026-02-08".into()),
        time: Some("11:30".into()),
        sport: Some("ALP".into()),
        discipline: Some("Men's Downhill".into()),
        is_medal_event: Some(true),
        status: Some("scheduled".into()),
        ..RawEvent::default()
    }
}

fn alpine_fan() -> Arc<StubRoster> {
    Arc::new(StubRoster(vec![RosterMember {
        name: "Ryan Cochran-Siegle".into(),
        sport: "Alpine Skiing".into(),
        discipline: None,
        country: "USA".into(),
        gender: Gender::Men,
        events: vec!["Downhill".into()],
    }]))
}

/// Policies with no date split so tests are independent of today's date.
fn flat(minutes: i64) -> AgePolicy {
    AgePolicy::new(Duration::minutes(minutes), Duration::minutes(minutes))
}

fn orchestrator(
    live: Arc<StubSource>,
    fallback: Arc<StubSource>,
    store: Arc<MemoryStore>,
) -> ScheduleOrchestrator {
    ScheduleOrchestrator::new(
        live,
        fallback,
        alpine_fan(),
        store,
        "does/not/exist/broadcast_rules.json",
    )
    .with_ttl(flat(30))
    .with_throttle_policy(flat(10))
}

fn cached_downhill_value() -> serde_json::Value {
    serde_json::to_value(normalize(&[raw_downhill("cached-dh")])).unwrap()
}

#[tokio::test]
async fn fresh_cache_serves_with_zero_outbound_calls() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());
    store.insert_entry(SCHEDULE_KEY, Utc::now(), cached_downhill_value());

    let orch = orchestrator(live.clone(), fallback.clone(), store);
    let out = orch.get_schedule(false).await.unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].event.event.id, "cached-dh");
    assert_eq!(live.calls(), 0);
    assert_eq!(fallback.calls(), 0);
}

#[tokio::test]
async fn stale_cache_serves_now_and_refreshes_in_background() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());
    store.insert_entry(
        SCHEDULE_KEY,
        Utc::now() - Duration::hours(1),
        cached_downhill_value(),
    );

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orch = orchestrator(live.clone(), fallback, store.clone()).with_refresh_observer(tx);

    // The stale value is what the caller gets *now*.
    let out = orch.get_schedule(false).await.unwrap();
    assert_eq!(out[0].event.event.id, "cached-dh");

    // The background refresh only affects the next read.
    assert_eq!(rx.recv().await, Some(RefreshOutcome::Refreshed { events: 1 }));
    let entry = store.get(SCHEDULE_KEY).await.unwrap();
    let refreshed: Vec<games_schedule_tracker::CanonicalEvent> =
        serde_json::from_value(entry.value).unwrap();
    assert_eq!(refreshed[0].id, "live-dh");
    assert_eq!(live.calls(), 1);
}

#[tokio::test]
async fn throttle_gates_the_second_refresh() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    // Zero TTL: every read is stale, so every call considers a refresh.
    let orch = ScheduleOrchestrator::new(
        live.clone(),
        fallback,
        alpine_fan(),
        store.clone(),
        "does/not/exist/broadcast_rules.json",
    )
    .with_ttl(flat(0))
    .with_throttle_policy(flat(10))
    .with_refresh_observer(tx);

    let _ = orch.get_schedule(false).await.unwrap();
    assert_eq!(rx.recv().await, Some(RefreshOutcome::Refreshed { events: 1 }));

    let _ = orch.get_schedule(false).await.unwrap();
    assert_eq!(rx.recv().await, Some(RefreshOutcome::Throttled));
    assert_eq!(live.calls(), 1, "throttled call must not hit the live API");
}

#[tokio::test]
async fn absent_cache_serves_fallback_not_live() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orch = orchestrator(live.clone(), fallback.clone(), store).with_refresh_observer(tx);

    let out = orch.get_schedule(false).await.unwrap();
    assert_eq!(out[0].event.event.id, "fb-dh");
    assert_eq!(fallback.calls(), 1);

    // The synchronous path never touched the live API; the background
    // refresh is the only caller.
    assert_eq!(rx.recv().await, Some(RefreshOutcome::Refreshed { events: 1 }));
    assert_eq!(live.calls(), 1);
}

#[tokio::test]
async fn corrupt_cache_counts_as_absent() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());
    store.insert_entry(SCHEDULE_KEY, Utc::now(), serde_json::json!({"not": "events"}));

    let orch = orchestrator(live, fallback.clone(), store);
    let out = orch.get_schedule(false).await.unwrap();

    assert_eq!(out[0].event.event.id, "fb-dh");
    assert_eq!(fallback.calls(), 1);
}

#[tokio::test]
async fn bypass_fetches_live_and_writes_through() {
    let live = StubSource::ok("live", vec![raw_downhill("live-dh")]);
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());
    // Fresh cache present: bypass must ignore it.
    store.insert_entry(SCHEDULE_KEY, Utc::now(), cached_downhill_value());

    let orch = orchestrator(live.clone(), fallback.clone(), store.clone());
    let out = orch.get_schedule(true).await.unwrap();

    assert_eq!(out[0].event.event.id, "live-dh");
    assert_eq!(live.calls(), 1);
    assert_eq!(fallback.calls(), 0);

    let entry = store.get(SCHEDULE_KEY).await.unwrap();
    let cached: Vec<games_schedule_tracker::CanonicalEvent> =
        serde_json::from_value(entry.value).unwrap();
    assert_eq!(cached[0].id, "live-dh");
}

#[tokio::test]
async fn bypass_falls_back_when_live_is_down() {
    let live = StubSource::down("live");
    let fallback = StubSource::ok("fallback", vec![raw_downhill("fb-dh")]);
    let store = Arc::new(MemoryStore::new());

    let orch = orchestrator(live, fallback, store);
    let out = orch.get_schedule(true).await.unwrap();
    assert_eq!(out[0].event.event.id, "fb-dh");
}

#[tokio::test]
async fn hard_error_only_when_both_sources_fail() {
    let live = StubSource::down("live");
    let fallback = StubSource::down("fallback");
    let store = Arc::new(MemoryStore::new());

    let orch = orchestrator(live, fallback, store);
    let err = orch.get_schedule(false).await.unwrap_err();
    assert!(err.to_string().contains("both failed"));
}
