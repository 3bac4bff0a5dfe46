// src/schedule/normalize.rs
//! Turns raw feed records into canonical events. Pure and deterministic:
//! no I/O, no clock. Malformed records fall out at the medal filter and
//! are not reported individually.

use once_cell::sync::Lazy;
use regex::Regex;

use super::classify::{self, ClassifyInput};
use super::{remove_ci, tidy_text, CanonicalEvent, Gender, RawEvent, UNKNOWN_SPORT};

/// Venue fragments the feed embeds into discipline text, with the
/// "Name, City" string each one stands for. A closed lookup table, not
/// inference.
pub const VENUE_FRAGMENTS: &[(&str, &str)] = &[
    ("stelvio", "Stelvio, Bormio"),
    ("sliding centre", "Sliding Centre, Cortina d'Ampezzo"),
    ("snow park", "Snow Park, Livigno"),
    ("santagiulia", "Santagiulia Arena, Milan"),
    ("anterselva", "Biathlon Arena, Anterselva"),
];

/// Marker token the feed appends to medal-round discipline text.
pub const MEDAL_MARKER: &str = "medal event";

/// Abbreviations the feed uses for snowboard disciplines it mislabels as
/// Freestyle Skiing.
pub const SNOWBOARD_MARKERS: &[&str] = &["sbx", "pgs", "sbd"];

static RE_MEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmen(?:'s)?\b").expect("men regex"));

pub fn normalize(raw: &[RawEvent]) -> Vec<CanonicalEvent> {
    raw.iter().filter_map(normalize_one).collect()
}

fn normalize_one(raw: &RawEvent) -> Option<CanonicalEvent> {
    let raw_discipline = raw.discipline.clone().unwrap_or_default();

    // 1. Sport resolution: tagged code through the table, otherwise the
    //    fingerprint rules.
    let mut sport = resolve_sport(raw, &raw_discipline);

    // 2. Venue synthesis.
    let venue = synthesize_venue(raw, &raw_discipline);

    // 3. Discipline cleaning.
    let discipline = clean_discipline(&raw_discipline);

    // 4. Snowboard override. Keys on the *raw* discipline text and
    //    corrects a different upstream mislabeling than the unknown case.
    if sport == "Freestyle Skiing" && has_snowboard_marker(&raw_discipline) {
        sport = "Snowboard".to_string();
    }

    // 5. Gender inference over the pre-clean text fields.
    let gender = infer_gender(&raw.search_text());

    // 6. Medal filter: unclassifiable or non-medal records drop here.
    let is_medal = raw.is_medal_event.unwrap_or(false);
    if sport == UNKNOWN_SPORT || !is_medal {
        return None;
    }

    Some(CanonicalEvent {
        id: raw.id.clone().unwrap_or_default(),
        date: raw.date.clone().unwrap_or_default(),
        time: raw.time.clone().unwrap_or_default(),
        sport,
        discipline,
        venue,
        is_medal_event: is_medal,
        gender,
        status: raw.status.clone().unwrap_or_default(),
    })
}

fn resolve_sport(raw: &RawEvent, raw_discipline: &str) -> String {
    if let Some(code) = raw.sport.as_deref() {
        let trimmed = code.trim();
        if !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case(UNKNOWN_SPORT) {
            return classify::sport_from_code(trimmed);
        }
    }
    let venue = raw.venue_text().to_ascii_lowercase();
    let discipline = raw_discipline.to_ascii_lowercase();
    let text = raw.search_text();
    classify::classify(&ClassifyInput {
        venue: &venue,
        discipline: &discipline,
        text: &text,
    })
    .map(str::to_string)
    .unwrap_or_else(|| UNKNOWN_SPORT.to_string())
}

/// Prefer the structured venue field; otherwise scan the raw discipline
/// text for a known fragment and substitute its fixed "Name, City".
fn synthesize_venue(raw: &RawEvent, raw_discipline: &str) -> String {
    let structured = raw.venue_text();
    if !structured.is_empty() {
        return structured;
    }
    let haystack = raw_discipline.to_ascii_lowercase();
    VENUE_FRAGMENTS
        .iter()
        .find(|(frag, _)| haystack.contains(frag))
        .map(|(_, venue)| venue.to_string())
        .unwrap_or_default()
}

/// Strip the medal marker and venue fragments from discipline text.
pub fn clean_discipline(raw: &str) -> String {
    let mut out = remove_ci(raw, MEDAL_MARKER);
    for (frag, _) in VENUE_FRAGMENTS {
        out = remove_ci(&out, frag);
    }
    tidy_text(&out)
}

fn has_snowboard_marker(raw_discipline: &str) -> bool {
    let lower = raw_discipline.to_ascii_lowercase();
    SNOWBOARD_MARKERS.iter().any(|m| lower.contains(m))
}

/// Fixed precedence: mixed beats everything (mixed-event names routinely
/// contain "men"), then women/ladies, then a word-boundary "men".
pub fn infer_gender(search_text: &str) -> Gender {
    if search_text.contains("mixed") {
        Gender::Open
    } else if search_text.contains("women") || search_text.contains("ladies") {
        Gender::Women
    } else if RE_MEN.is_match(search_text) {
        Gender::Men
    } else {
        Gender::Open
    }
}
