// src/source/fallback.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use super::{parse_raw_payload, EventSource};
use crate::schedule::RawEvent;

/// Static dataset shipped alongside the service. Serves the no-cache path
/// so a cold start never blocks on the external API.
pub struct FallbackEventSource {
    path: PathBuf,
}

impl FallbackEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSource for FallbackEventSource {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("reading fallback schedule from {}", self.path.display()))?;
        let payload: Value =
            serde_json::from_slice(&bytes).context("parsing fallback schedule json")?;
        let events = parse_raw_payload(payload)?;
        counter!("source_events_total", "source" => "fallback").increment(events.len() as u64);
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
