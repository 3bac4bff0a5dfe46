// src/source/live.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use super::{parse_raw_payload, EventSource};
use crate::schedule::RawEvent;

/// The live event API. One GET per fetch; no retries, the refresh throttle
/// is the only rate limiter.
pub struct LiveEventSource {
    url: String,
    client: reqwest::Client,
}

impl LiveEventSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EventSource for LiveEventSource {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                counter!("source_errors_total", "source" => "live").increment(1);
                e
            })
            .context("event api get")?;
        let resp = resp.error_for_status().inspect_err(|_| {
            counter!("source_errors_total", "source" => "live").increment(1);
        })?;
        let payload: Value = resp.json().await.context("event api body")?;
        let events = parse_raw_payload(payload)?;
        counter!("source_events_total", "source" => "live").increment(events.len() as u64);
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "live"
    }
}
