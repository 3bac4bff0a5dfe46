// src/schedule/classify.rs
//! Sport resolution for feed records: the fixed code table for tagged
//! records, and the ordered fingerprint rules for records the source left
//! as "unknown".
//!
//! The heuristic is data-driven: an ordered slice of named rules, each a
//! predicate over the record's venue/discipline text. First rule that
//! returns a sport wins; none firing leaves the record unclassified and it
//! is dropped later by the medal filter.

/// Code → display name for the full winter program (16 sports).
pub const SPORT_CODES: &[(&str, &str)] = &[
    ("ALP", "Alpine Skiing"),
    ("BTH", "Biathlon"),
    ("BOB", "Bobsleigh"),
    ("CCS", "Cross-Country Skiing"),
    ("CUR", "Curling"),
    ("FSK", "Figure Skating"),
    ("FRS", "Freestyle Skiing"),
    ("IHO", "Ice Hockey"),
    ("LUG", "Luge"),
    ("NCB", "Nordic Combined"),
    ("SBD", "Snowboard"),
    ("SJP", "Ski Jumping"),
    ("SKN", "Skeleton"),
    ("SMT", "Ski Mountaineering"),
    ("SSK", "Speed Skating"),
    ("STK", "Short Track Speed Skating"),
];

/// Map a tagged sport code through the fixed table. Unrecognized codes
/// pass through unchanged (the feed occasionally ships display names in
/// the code slot).
pub fn sport_from_code(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    SPORT_CODES
        .iter()
        .find(|(c, _)| *c == upper)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.trim().to_string())
}

/// Lowercased views of the raw record fed to the classification rules.
pub struct ClassifyInput<'a> {
    /// Venue text, lowercased. May be empty.
    pub venue: &'a str,
    /// Raw discipline text, lowercased, pre-cleaning.
    pub discipline: &'a str,
    /// Every free-text field concatenated, lowercased.
    pub text: &'a str,
}

/// One fingerprint rule. Returns the display name when it fires.
pub struct ClassifyRule {
    pub name: &'static str,
    pub apply: fn(&ClassifyInput<'_>) -> Option<&'static str>,
}

/// Ordered rule table. Order is load-bearing: the sliding-centre and
/// ice-rink rules must run before the keyword rules because their
/// discipline texts often contain the broader keywords too.
pub fn rules() -> &'static [ClassifyRule] {
    &[
        ClassifyRule {
            name: "sliding_centre",
            apply: |c| {
                if !c.venue.contains("sliding centre") && !c.venue.contains("sliding center") {
                    return None;
                }
                // Luge runs singles/doubles; skeleton records arrive as
                // bare "heat" rounds with neither keyword.
                if c.discipline.contains("heat")
                    && !c.discipline.contains("singles")
                    && !c.discipline.contains("doubles")
                {
                    Some("Skeleton")
                } else {
                    Some("Luge")
                }
            },
        },
        ClassifyRule {
            name: "ice_rink",
            apply: |c| {
                let rink = c.venue.contains("ice")
                    && (c.venue.contains("arena") || c.venue.contains("rink"));
                if !rink {
                    return None;
                }
                let program = ["program", "dance", "pairs"]
                    .iter()
                    .any(|kw| c.discipline.contains(kw));
                if program {
                    Some("Figure Skating")
                } else {
                    Some("Short Track Speed Skating")
                }
            },
        },
        ClassifyRule {
            name: "freestyle_keywords",
            apply: |c| {
                if !c.venue.is_empty() {
                    return None;
                }
                let hit = ["aerials", "moguls", "freeski", "ski cross"]
                    .iter()
                    .any(|kw| c.discipline.contains(kw));
                hit.then_some("Freestyle Skiing")
            },
        },
        ClassifyRule {
            name: "alpine_keywords",
            apply: |c| {
                let hit = c.text.contains("stelvio") || c.text.contains("combined");
                hit.then_some("Alpine Skiing")
            },
        },
        ClassifyRule {
            name: "hockey_keywords",
            apply: |c| {
                let hit = c.text.contains("medal game") || c.text.contains("semi-final");
                hit.then_some("Ice Hockey")
            },
        },
    ]
}

/// Run the ordered rules; `None` means unclassifiable.
pub fn classify(input: &ClassifyInput<'_>) -> Option<&'static str> {
    rules().iter().find_map(|r| (r.apply)(input))
}
