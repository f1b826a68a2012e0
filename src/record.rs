//! The append-only duel log.
//!
//! Every settled duel leaves one immutable [`DuelRecord`]. The log
//! exposes no update or delete; it serves audit and statistics and is
//! never consulted for gating (quota and cooldown keep their own
//! stores). Records carry the full delta sets, so replaying one against
//! reset accounts reproduces the same resulting attribute values.

use crate::account::{AccountId, AttributeDelta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Unique identifier for duel records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write-once record of one settled duel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelRecord {
    pub id: RecordId,
    pub challenger: AccountId,
    pub target: AccountId,
    pub winner: AccountId,
    pub loser: AccountId,
    pub xp_transferred: i64,
    pub item_dropped: Option<String>,
    pub ability_learned: Option<String>,
    pub events_triggered: Vec<String>,
    /// Full delta sets as applied, for audit and replay.
    pub winner_deltas: Vec<AttributeDelta>,
    pub loser_deltas: Vec<AttributeDelta>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate duel statistics for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelStats {
    pub wins: u32,
    pub losses: u32,
    pub xp_won: i64,
    pub xp_lost: i64,
}

/// Errors from log persistence.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current log file format version.
const LOG_VERSION: u32 = 1;

/// Serializable log envelope.
#[derive(Debug, Serialize, Deserialize)]
struct SavedLog {
    version: u32,
    saved_at: DateTime<Utc>,
    records: Vec<DuelRecord>,
}

/// Append-only, in-memory duel log with JSON file persistence.
#[derive(Debug, Default)]
pub struct DuelLog {
    records: Mutex<Vec<DuelRecord>>,
}

impl DuelLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a settled duel. There is no update or delete.
    pub fn append(&self, record: DuelRecord) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record);
    }

    pub fn len(&self) -> usize {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all records in append order.
    pub fn records(&self) -> Vec<DuelRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.clone()
    }

    /// Records involving the account, as either side.
    pub fn for_account(&self, account: AccountId) -> Vec<DuelRecord> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .filter(|r| r.challenger == account || r.target == account)
            .cloned()
            .collect()
    }

    /// Win/loss and xp totals for the account.
    pub fn stats_for(&self, account: AccountId) -> DuelStats {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stats = DuelStats::default();
        for record in records.iter() {
            if record.winner == account {
                stats.wins += 1;
                stats.xp_won += record.xp_transferred;
            } else if record.loser == account {
                stats.losses += 1;
                stats.xp_lost += record.xp_transferred;
            }
        }
        stats
    }

    /// Save all records to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), LogError> {
        let saved = SavedLog {
            version: LOG_VERSION,
            saved_at: Utc::now(),
            records: self.records(),
        };
        let content = serde_json::to_string_pretty(&saved)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load a log from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let content = fs::read_to_string(path).await?;
        let saved: SavedLog = serde_json::from_str(&content)?;

        if saved.version != LOG_VERSION {
            return Err(LogError::VersionMismatch {
                expected: LOG_VERSION,
                found: saved.version,
            });
        }

        Ok(Self {
            records: Mutex::new(saved.records),
        })
    }
}
