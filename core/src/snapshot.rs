//! Snapshot serialization: full ledger state to/from JSON.
//!
//! The same shape is written to the local key/value store, pushed to the
//! remote document, and produced by export. Loading it replaces the whole
//! in-memory state; there is no partial merge.

use crate::{
    error::{LedgerError, LedgerResult},
    player::PlayerRecord,
    types::{EntityId, SNAPSHOT_VERSION},
    week::WeekLedger,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    pub weeks: Vec<WeekLedger>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(rename = "activeWeekId", default)]
    pub active_week_id: Option<EntityId>,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl LedgerSnapshot {
    pub fn empty() -> Self {
        Self {
            weeks: Vec::new(),
            players: Vec::new(),
            active_week_id: None,
            version: SNAPSHOT_VERSION,
        }
    }

    /// Parse and validate. Nothing is applied anywhere until this succeeds.
    pub fn from_json(raw: &str) -> LedgerResult<Self> {
        let snapshot: LedgerSnapshot = serde_json::from_str(raw)?;
        snapshot.validated()
    }

    pub fn from_value(value: serde_json::Value) -> LedgerResult<Self> {
        let snapshot: LedgerSnapshot = serde_json::from_value(value)?;
        snapshot.validated()
    }

    pub fn to_json(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> LedgerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_value(&self) -> LedgerResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn validated(mut self) -> LedgerResult<Self> {
        if self.version > SNAPSHOT_VERSION {
            return Err(LedgerError::UnsupportedVersion(self.version));
        }
        // A dangling pointer is dropped rather than rejected.
        if let Some(active) = &self.active_week_id {
            if !self.weeks.iter().any(|w| &w.id == active) {
                log::warn!("Snapshot active week {active} not found; clearing pointer");
                self.active_week_id = None;
            }
        }
        for player in &mut self.players {
            player.clamp_balance();
        }
        self.version = SNAPSHOT_VERSION;
        Ok(self)
    }
}
