// src/source/mod.rs
//! Event feed providers and the tolerant payload parser they share.
//! The feed ships either a bare array or an object wrapping the array
//! under `events` or `schedule`; individual malformed elements are skipped,
//! not fatal.

pub mod fallback;
pub mod live;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::schedule::RawEvent;

pub use fallback::FallbackEventSource;
pub use live::LiveEventSource;

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>>;
    fn name(&self) -> &'static str;
}

pub fn parse_raw_payload(payload: Value) -> Result<Vec<RawEvent>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            let nested = obj.remove("events").or_else(|| obj.remove("schedule"));
            match nested {
                Some(Value::Array(items)) => items,
                _ => bail!("payload object carries no events/schedule array"),
            }
        }
        _ => bail!("payload is neither an array nor an object"),
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<RawEvent>(item) {
            Ok(ev) => out.push(ev),
            Err(e) => {
                tracing::debug!(target: "source", error = %e, "skipping malformed feed record");
            }
        }
    }
    Ok(out)
}
