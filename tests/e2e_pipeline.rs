//! End-to-end pipeline scenario: three raw feed records and a one-member
//! roster driven through the full orchestrator, with broadcast rules
//! loaded from a real file.
//!
//! Records: an Alpine men's downhill medal event, an untagged
//! sliding-centre doubles record, and a non-medal qualifier. Exactly two
//! survive normalization; exactly one matches the roster.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use games_schedule_tracker::broadcast::BroadcastKind;
use games_schedule_tracker::cache::MemoryStore;
use games_schedule_tracker::orchestrator::ScheduleOrchestrator;
use games_schedule_tracker::roster::{RosterMember, RosterProvider};
use games_schedule_tracker::schedule::{normalize::normalize, Gender, RawEvent, RawVenue};
use games_schedule_tracker::source::EventSource;

struct FixtureSource(Vec<RawEvent>);

#[async_trait]
impl EventSource for FixtureSource {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

struct StubRoster(Vec<RosterMember>);

#[async_trait]
impl RosterProvider for StubRoster {
    async fn roster(&self) -> Result<Vec<RosterMember>> {
        Ok(self.0.clone())
    }
}

fn scenario_records() -> Vec<RawEvent> {
    vec![
        RawEvent {
            id: Some("alp-dh-m".into()),
            date: Some("2026-02-08".into()),
            time: Some("19:00".into()),
            sport: Some("ALP".into()),
            discipline: Some("Men's Downhill Medal Event".into()),
            is_medal_event: Some(true),
            status: Some("scheduled".into()),
            ..RawEvent::default()
        },
        RawEvent {
            id: Some("unk-doubles".into()),
            date: Some("2026-02-11".into()),
            time: Some("20:15".into()),
            sport: Some("unknown".into()),
            discipline: Some("Doubles Run 2".into()),
            venue: Some(RawVenue::Text("Sliding Centre, Cortina d'Ampezzo".into())),
            is_medal_event: Some(true),
            status: Some("scheduled".into()),
            ..RawEvent::default()
        },
        RawEvent {
            id: Some("alp-q".into()),
            date: Some("2026-02-10".into()),
            time: Some("09:30".into()),
            sport: Some("ALP".into()),
            discipline: Some("Men's Giant Slalom Run 1".into()),
            is_medal_event: Some(false),
            status: Some("scheduled".into()),
            ..RawEvent::default()
        },
    ]
}

fn downhill_fan() -> RosterMember {
    RosterMember {
        name: "Ryan Cochran-Siegle".into(),
        sport: "Alpine Skiing".into(),
        discipline: None,
        country: "USA".into(),
        gender: Gender::Men,
        events: vec!["Downhill".into()],
    }
}

#[test]
fn two_canonical_events_survive_the_medal_filter() {
    let canonical = normalize(&scenario_records());
    assert_eq!(canonical.len(), 2);

    let downhill = canonical.iter().find(|e| e.id == "alp-dh-m").unwrap();
    assert_eq!(downhill.sport, "Alpine Skiing");
    assert_eq!(downhill.discipline, "Men's Downhill");
    assert_eq!(downhill.gender, Gender::Men);

    let doubles = canonical.iter().find(|e| e.id == "unk-doubles").unwrap();
    assert_eq!(doubles.sport, "Luge");
    assert_eq!(doubles.venue, "Sliding Centre, Cortina d'Ampezzo");
}

#[tokio::test]
async fn one_matched_event_comes_out_of_the_full_pipeline() {
    let mut rules_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        rules_file,
        r#"{{
            "streaming": {{ "network": "Peacock" }},
            "sportNetworks": {{ "Alpine Skiing": "NBC" }},
            "medalPrimetime": {{ "network": "NBC", "time": "20:00" }}
        }}"#
    )
    .unwrap();

    let source = Arc::new(FixtureSource(scenario_records()));
    let orch = ScheduleOrchestrator::new(
        source.clone(),
        source,
        Arc::new(StubRoster(vec![downhill_fan()])),
        Arc::new(MemoryStore::new()),
        rules_file.path(),
    );

    // Cold start: absent cache, served from the (shared) fixture source.
    let matched = orch.get_schedule(false).await.unwrap();
    assert_eq!(matched.len(), 1);

    let m = &matched[0];
    assert_eq!(m.event.event.id, "alp-dh-m");
    assert_eq!(m.athletes.len(), 1);
    assert_eq!(m.athletes[0].name, "Ryan Cochran-Siegle");

    // Enrichment: live slot converted 19:00 → 11:00, primetime verbatim,
    // streaming with no time.
    let kinds: Vec<BroadcastKind> = m.event.broadcast.iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BroadcastKind::Live,
            BroadcastKind::Primetime,
            BroadcastKind::Streaming
        ]
    );
    assert_eq!(m.event.broadcast[0].time.as_deref(), Some("11:00"));
    assert_eq!(m.event.broadcast[1].time.as_deref(), Some("20:00"));
    assert_eq!(m.event.broadcast[2].time, None);
}
