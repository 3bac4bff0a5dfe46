// src/roster.rs
//! Tracked participants. The roster arrives already parsed (the CSV /
//! spreadsheet plumbing lives with the collaborator that owns it); this
//! crate only consumes the normalized shape and validates the one
//! invariant it relies on: a non-empty name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::schedule::Gender;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub name: String,
    pub sport: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discipline: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub gender: Gender,
    /// Declared event labels, matched against event text. Empty means the
    /// member follows their entire sport.
    #[serde(default)]
    pub events: Vec<String>,
}

#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn roster(&self) -> Result<Vec<RosterMember>>;
}

/// Reads a JSON array of members from disk.
pub struct RosterFileProvider {
    path: PathBuf,
}

impl RosterFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterProvider for RosterFileProvider {
    async fn roster(&self) -> Result<Vec<RosterMember>> {
        load_roster_file(&self.path).await
    }
}

pub async fn load_roster_file(path: &Path) -> Result<Vec<RosterMember>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading roster from {}", path.display()))?;
    let members: Vec<RosterMember> =
        serde_json::from_slice(&bytes).context("parsing roster json")?;
    Ok(sanitize(members))
}

fn sanitize(members: Vec<RosterMember>) -> Vec<RosterMember> {
    let mut out = Vec::with_capacity(members.len());
    for m in members {
        if m.name.trim().is_empty() {
            tracing::warn!(target: "roster", sport = %m.sport, "dropping roster entry without a name");
            continue;
        }
        out.push(m);
    }
    out
}
