// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod broadcast;
pub mod cache;
pub mod matcher;
pub mod metrics;
pub mod orchestrator;
pub mod roster;
pub mod schedule;
pub mod source;
pub mod throttle;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::broadcast::{BroadcastEntry, BroadcastKind, EnrichedEvent, RuleSet};
pub use crate::matcher::MatchedEvent;
pub use crate::orchestrator::{RefreshOutcome, ScheduleOrchestrator};
pub use crate::roster::{RosterMember, RosterProvider};
pub use crate::schedule::{CanonicalEvent, Gender, RawEvent};
