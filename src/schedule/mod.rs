// src/schedule/mod.rs
//! Schedule domain types: the raw feed record as the source API ships it,
//! the canonical event the pipeline produces, and the shared text helpers
//! used by normalization and matching.

pub mod classify;
pub mod normalize;

use serde::{Deserialize, Serialize};

/// Sentinel the source API uses when it could not tag a record with a sport.
pub const UNKNOWN_SPORT: &str = "unknown";

/// One record exactly as the event feed ships it. Nothing here is
/// guaranteed; every field may be missing, empty, or mislabeled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub venue: Option<RawVenue>,
    #[serde(default)]
    pub is_medal_event: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default, rename = "eventName")]
    pub event_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// The feed is inconsistent about venues: sometimes a structured object,
/// sometimes a bare string, sometimes null.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawVenue {
    Structured {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        city: Option<String>,
    },
    Text(String),
}

/// Competition gender bucket. `Open` matches everything (mixed events and
/// records with no gender signal).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Men,
    #[serde(rename = "F")]
    Women,
    #[default]
    #[serde(rename = "")]
    Open,
}

/// One normalized event. After `normalize::normalize` the sport is never
/// the unknown sentinel and the discipline carries no venue fragments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub id: String,
    /// `YYYY-MM-DD` as shipped by the feed.
    pub date: String,
    /// `HH:MM` in the source timezone.
    pub time: String,
    pub sport: String,
    pub discipline: String,
    /// "Name, City" or empty when nothing could be synthesized.
    pub venue: String,
    pub is_medal_event: bool,
    pub gender: Gender,
    pub status: String,
}

impl RawEvent {
    /// Combined lowercase text of every free-text field, pre-cleaning.
    /// Classification and gender inference both search this.
    pub fn search_text(&self) -> String {
        let mut s = String::new();
        for part in [
            self.discipline.as_deref(),
            self.event.as_deref(),
            self.event_name.as_deref(),
            self.gender.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !s.is_empty() {
                s.push(' ');
            }
            s.push_str(part);
        }
        s.to_ascii_lowercase()
    }

    pub fn venue_text(&self) -> String {
        match &self.venue {
            Some(RawVenue::Structured { name, city }) => {
                let mut s = name.clone().unwrap_or_default();
                if let Some(c) = city {
                    if !s.is_empty() {
                        s.push_str(", ");
                    }
                    s.push_str(c);
                }
                s
            }
            Some(RawVenue::Text(t)) => t.clone(),
            None => String::new(),
        }
    }
}

/// Case-insensitive substring removal. ASCII patterns only, so byte
/// offsets of the lowered haystack line up with the original.
pub(crate) fn remove_ci(text: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return text.to_string();
    }
    let lower = text.to_ascii_lowercase();
    let pat = pattern.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(pos) = lower[cursor..].find(&pat) {
        out.push_str(&text[cursor..cursor + pos]);
        cursor += pos + pat.len();
    }
    out.push_str(&text[cursor..]);
    out
}

/// Collapse runs of whitespace and trim. Also tidies separator debris
/// (" - ", ", ") left behind by artifact removal.
pub(crate) fn tidy_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim()
        .trim_matches(|c: char| c == '-' || c == ',' || c.is_whitespace())
        .to_string()
}
