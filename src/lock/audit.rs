//! Durable unlock audit log.
//!
//! Unlocks are the one escape hatch in the lock state machine, so they get
//! a second, append-only record distinct from the in-record history. The
//! log is JSON lines: one entry per unlock, never rewritten, which makes
//! after-the-fact tampering with the in-record history visible.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CanonryResult, StoreError};

use super::ChapterState;

/// One durable unlock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockAuditEntry {
    /// Stable identity of this entry.
    pub entry_id: Uuid,
    /// Chapter that was unlocked.
    pub chapter_id: String,
    /// State the chapter left (always `canon_locked` today).
    pub from_state: ChapterState,
    /// State the chapter landed in (always `revised` today).
    pub to_state: ChapterState,
    /// The reason given for the unlock, verbatim.
    pub reason: String,
    /// Who unlocked.
    pub unlocked_by: String,
    /// When the unlock happened.
    pub unlocked_at: DateTime<Utc>,
    /// When the chapter had been locked, if recorded.
    pub previous_lock_date: Option<DateTime<Utc>>,
}

/// Append-only unlock log backed by a JSON-lines file.
#[derive(Debug, Clone)]
pub struct UnlockAudit {
    path: PathBuf,
}

impl UnlockAudit {
    /// Creates an audit log at the given path. The file is created on
    /// first append.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Appends one entry. Never rewrites existing lines.
    pub fn append(&self, entry: &UnlockAuditEntry) -> CanonryResult<()> {
        let line = serde_json::to_string(entry).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, &e))?;
        writeln!(file, "{line}").map_err(|e| StoreError::io(&self.path, &e))?;
        Ok(())
    }

    /// Reads every entry in append order.
    ///
    /// # Errors
    ///
    /// Fails loudly on a malformed line; a corrupt audit log is a finding,
    /// not something to skip past.
    pub fn read_all(&self) -> CanonryResult<Vec<UnlockAuditEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.path).map_err(|e| StoreError::io(&self.path, &e))?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(|e| StoreError::io(&self.path, &e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|e| StoreError::Serialization {
                message: format!("{}: {e}", self.path.display()),
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
