// src/broadcast.rs
//! Broadcast enrichment from a declarative rules document
//! (`config/broadcast_rules.json`). Enrichment is optional: with no rules
//! available every event gets an empty broadcast list, never an error.
//!
//! Precedence per event, short-circuiting:
//! 1. an `eventOverrides` list keyed by event id is taken verbatim;
//! 2. otherwise live (sport network, converted time) + primetime (medal
//!    events, fixed time) + streaming (no time), in that order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::schedule::CanonicalEvent;

/// Flat hour shift from the source timezone to the broadcast timezone.
/// Integer arithmetic, no DST handling: the competition window sits inside
/// a period where neither zone transitions. Hour underflow wraps modulo 24
/// with the date left untouched.
pub const BROADCAST_TZ_SHIFT_HOURS: i32 = -8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEntry {
    pub network: String,
    #[serde(rename = "type")]
    pub kind: BroadcastKind,
    /// `HH:MM` in the broadcast timezone. Streaming entries carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastKind {
    Live,
    Primetime,
    Streaming,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub streaming: Option<StreamingRule>,
    #[serde(default, rename = "sportNetworks")]
    pub sport_networks: HashMap<String, String>,
    #[serde(default, rename = "medalPrimetime")]
    pub medal_primetime: Option<PrimetimeRule>,
    #[serde(default, rename = "eventOverrides")]
    pub event_overrides: HashMap<String, Vec<BroadcastEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingRule {
    pub network: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimetimeRule {
    pub network: String,
    /// Already expressed in the broadcast timezone; applied verbatim.
    pub time: String,
}

impl RuleSet {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading broadcast rules from {}", path.display()))?;
        serde_json::from_slice(&bytes).context("parsing broadcast rules json")
    }
}

/// Canonical event plus its viewing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    #[serde(flatten)]
    pub event: CanonicalEvent,
    pub broadcast: Vec<BroadcastEntry>,
}

pub fn apply_rules(events: Vec<CanonicalEvent>, rules: Option<&RuleSet>) -> Vec<EnrichedEvent> {
    events
        .into_iter()
        .map(|event| {
            let broadcast = rules.map(|r| entries_for(&event, r)).unwrap_or_default();
            EnrichedEvent { event, broadcast }
        })
        .collect()
}

fn entries_for(event: &CanonicalEvent, rules: &RuleSet) -> Vec<BroadcastEntry> {
    if let Some(list) = rules.event_overrides.get(&event.id) {
        return list.clone();
    }

    let mut out = Vec::new();
    if let Some(network) = rules.sport_networks.get(&event.sport) {
        out.push(BroadcastEntry {
            network: network.clone(),
            kind: BroadcastKind::Live,
            time: Some(shift_to_broadcast_tz(&event.time)),
        });
    }
    if event.is_medal_event {
        if let Some(pt) = &rules.medal_primetime {
            out.push(BroadcastEntry {
                network: pt.network.clone(),
                kind: BroadcastKind::Primetime,
                time: Some(pt.time.clone()),
            });
        }
    }
    if let Some(st) = &rules.streaming {
        out.push(BroadcastEntry {
            network: st.network.clone(),
            kind: BroadcastKind::Streaming,
            time: None,
        });
    }
    out
}

/// Shift an `HH:MM` source-timezone string into the broadcast timezone.
/// Unparseable input passes through unchanged.
pub fn shift_to_broadcast_tz(time: &str) -> String {
    let Some((h, m)) = time.split_once(':') else {
        return time.to_string();
    };
    let (Ok(hour), Ok(minute)) = (h.trim().parse::<i32>(), m.trim().parse::<i32>()) else {
        return time.to_string();
    };
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return time.to_string();
    }
    let shifted = (hour + BROADCAST_TZ_SHIFT_HOURS).rem_euclid(24);
    format!("{shifted:02}:{minute:02}")
}
