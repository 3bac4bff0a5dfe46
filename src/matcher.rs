// src/matcher.rs
//! Roster matching: decides which enriched events are worth surfacing.
//!
//! Per event: look up roster members by canonicalized sport, filter by
//! gender, then narrow to members whose declared event labels appear in
//! the event text. Each step is a binary in/out filter; there is no
//! partial-match scoring. Gender runs before label narrowing so that
//! gender-excluded members never ride the "no labels, keep all" fallback.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::broadcast::EnrichedEvent;
use crate::roster::RosterMember;
use crate::schedule::Gender;

/// Spelling variants and roster-facing sport labels collapsed onto the
/// schedule-facing sport key.
const SPORT_ALIASES: &[(&str, &str)] = &[
    ("bobsled", "bobsleigh"),
    ("cross country skiing", "cross-country skiing"),
    ("figure-skating", "figure skating"),
    ("freestyle aerials", "freestyle skiing"),
    ("freestyle moguls", "freestyle skiing"),
    ("freeski", "freestyle skiing"),
    ("short track", "short track speed skating"),
    ("snowboarding", "snowboard"),
];

/// Declared-label spellings mapped onto the abbreviations the feed uses.
const EVENT_LABEL_ALIASES: &[(&str, &str)] = &[
    ("four-man", "4-man"),
    ("two-man", "2-man"),
    ("two-woman", "2-woman"),
    ("giant slalom", "gs"),
    ("parallel giant slalom", "pgs"),
    ("snowboard cross", "sbx"),
];

/// Enriched event plus the roster members it is relevant to. Only events
/// with at least one match leave the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEvent {
    #[serde(flatten)]
    pub event: EnrichedEvent,
    pub athletes: Vec<RosterMember>,
}

/// Lowercase, alias-collapsed sport key used on both sides of the lookup.
pub fn canonical_sport_key(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    SPORT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lower)
}

pub fn match_events(events: Vec<EnrichedEvent>, roster: &[RosterMember]) -> Vec<MatchedEvent> {
    let mut by_sport: HashMap<String, Vec<&RosterMember>> = HashMap::new();
    for member in roster {
        by_sport
            .entry(canonical_sport_key(&member.sport))
            .or_default()
            .push(member);
    }

    let mut out = Vec::new();
    for enriched in events {
        let key = canonical_sport_key(&enriched.event.sport);
        let Some(candidates) = by_sport.get(&key) else {
            continue;
        };

        let after_gender: Vec<&RosterMember> = candidates
            .iter()
            .copied()
            .filter(|m| gender_compatible(m.gender, enriched.event.gender))
            .collect();

        let haystack = event_haystack(&enriched);
        let athletes: Vec<RosterMember> = after_gender
            .into_iter()
            .filter(|m| labels_match(m, &haystack))
            .cloned()
            .collect();

        if athletes.is_empty() {
            continue;
        }
        out.push(MatchedEvent {
            event: enriched,
            athletes,
        });
    }
    out
}

/// Members with no declared gender are never excluded; open events match
/// everyone.
fn gender_compatible(member: Gender, event: Gender) -> bool {
    event == Gender::Open || member == Gender::Open || member == event
}

/// Padded lowercase haystack over the event's discipline and sport display
/// name. Padding makes " label " style probes cheap for callers that want
/// loose word edges.
fn event_haystack(enriched: &EnrichedEvent) -> String {
    format!(
        " {} {} ",
        enriched.event.discipline.to_ascii_lowercase(),
        enriched.event.sport.to_ascii_lowercase()
    )
}

/// No labels means "follows the entire sport". Otherwise at least one
/// label must hit, directly or through the abbreviation alias table.
fn labels_match(member: &RosterMember, haystack: &str) -> bool {
    if member.events.is_empty() {
        return true;
    }
    member.events.iter().any(|label| {
        let needle = label.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return false;
        }
        if haystack.contains(&needle) {
            return true;
        }
        EVENT_LABEL_ALIASES
            .iter()
            .any(|(alias, abbrev)| *alias == needle && haystack.contains(abbrev))
    })
}
