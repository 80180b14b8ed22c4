//! Chapter lock state machine.
//!
//! Chapters move through four states that gate editing:
//!
//! - `draft`: free editing
//! - `revised`: after a revision pass, still editable
//! - `canon_locked`: protected; leaving requires an explicit, audited unlock
//! - `published`: final; no transition leaves this state, ever
//!
//! Transitions are validated against a fixed edge table. Locking stamps a
//! reason; unlocking demands a meaningful reason (10+ characters) and lands
//! in `revised`, never `draft`, so prior revision work is not discarded.

mod audit;

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ProjectLayout;
use crate::error::{CanonryResult, GovernanceError, StoreError, ValidationError};

pub use audit::{UnlockAudit, UnlockAuditEntry};

/// Minimum trimmed length of an unlock reason.
pub const MIN_UNLOCK_REASON_LEN: usize = 10;

/// Chapter lock states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChapterState {
    /// Initial writing, free editing.
    Draft,
    /// After a revision pass.
    Revised,
    /// Protected; requires explicit unlock with a reason.
    CanonLocked,
    /// Final version, read-only forever.
    Published,
}

impl ChapterState {
    /// The snake_case string form used in persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Revised => "revised",
            Self::CanonLocked => "canon_locked",
            Self::Published => "published",
        }
    }

    /// States reachable from this one via [`ChapterLocks::set_state`].
    ///
    /// `canon_locked` has no outbound edges here; its only exit is
    /// [`ChapterLocks::unlock`]. `published` has none at all.
    #[must_use]
    pub const fn allowed_targets(&self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Revised, Self::CanonLocked],
            Self::Revised => &[Self::Draft, Self::CanonLocked, Self::Published],
            Self::CanonLocked | Self::Published => &[],
        }
    }

    /// Whether entering this state stamps lock metadata and needs a reason.
    #[must_use]
    pub const fn is_locking(&self) -> bool {
        matches!(self, Self::CanonLocked | Self::Published)
    }

    /// Whether a chapter in this state may be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Revised)
    }
}

impl fmt::Display for ChapterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ChapterState {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "revised" => Ok(Self::Revised),
            "canon_locked" => Ok(Self::CanonLocked),
            "published" => Ok(Self::Published),
            _ => Err(ValidationError::UnknownState { value }),
        }
    }
}

impl From<ChapterState> for String {
    fn from(s: ChapterState) -> Self {
        s.as_str().to_string()
    }
}

/// One entry in a record's unlock history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockEntry {
    /// State the chapter left.
    pub from_state: ChapterState,
    /// State the chapter entered.
    pub to_state: ChapterState,
    /// Reason given, verbatim.
    pub reason: String,
    /// When the unlock happened.
    pub timestamp: DateTime<Utc>,
}

/// Lock status for a chapter.
///
/// Created lazily on first state query and never deleted; the audit trail
/// is permanent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Stable chapter identifier.
    pub chapter_id: String,
    /// Current lock state.
    pub state: ChapterState,
    /// When the chapter entered its current locked state, if locked.
    pub locked_at: Option<DateTime<Utc>>,
    /// Who locked it, if locked.
    pub locked_by: Option<String>,
    /// Why it was locked, if locked.
    pub lock_reason: Option<String>,
    /// Last state-machine mutation.
    pub last_modified: DateTime<Utc>,
    /// Most recently recorded word count.
    pub word_count: usize,
    /// Number of times the chapter entered `revised`.
    pub revision_count: u32,
    /// Unlock history, oldest first.
    #[serde(default)]
    pub unlock_history: Vec<UnlockEntry>,
}

impl LockRecord {
    fn new(chapter_id: &str) -> Self {
        Self {
            chapter_id: chapter_id.to_string(),
            state: ChapterState::Draft,
            locked_at: None,
            locked_by: None,
            lock_reason: None,
            last_modified: Utc::now(),
            word_count: 0,
            revision_count: 0,
            unlock_history: Vec::new(),
        }
    }
}

/// Per-chapter lock manager with audited transitions.
///
/// # Usage
///
/// ```no_run
/// use canonry::config::ProjectLayout;
/// use canonry::lock::{ChapterLocks, ChapterState};
///
/// # fn main() -> canonry::CanonryResult<()> {
/// let layout = ProjectLayout::new("/path/to/project");
/// let mut locks = ChapterLocks::open(&layout)?;
///
/// locks.set_state("ch5", ChapterState::CanonLocked, Some("finalized for beta readers"), "author")?;
/// assert!(!locks.is_editable("ch5"));
///
/// locks.unlock("ch5", "fixing typo now", "author")?;
/// assert_eq!(locks.get_state("ch5").state, ChapterState::Revised);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChapterLocks {
    locks_file: PathBuf,
    audit: UnlockAudit,
    records: BTreeMap<String, LockRecord>,
}

impl ChapterLocks {
    /// Opens the lock manager, loading any persisted state.
    ///
    /// # Errors
    ///
    /// Fails if the lock file exists but cannot be read or contains
    /// unknown state strings.
    pub fn open(layout: &ProjectLayout) -> CanonryResult<Self> {
        let locks_file = layout.locks_file();
        let records = if locks_file.exists() {
            let raw = fs::read_to_string(&locks_file).map_err(|e| StoreError::io(&locks_file, &e))?;
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
                message: format!("{}: {e}", locks_file.display()),
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            locks_file,
            audit: UnlockAudit::new(layout.unlock_audit_file()),
            records,
        })
    }

    fn save(&self) -> CanonryResult<()> {
        let json = serde_json::to_string_pretty(&self.records).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        fs::write(&self.locks_file, json).map_err(|e| StoreError::io(&self.locks_file, &e))?;
        Ok(())
    }

    /// Current lock record for a chapter.
    ///
    /// Chapters never explicitly locked report a fresh `draft` record;
    /// nothing is persisted by a read.
    #[must_use]
    pub fn get_state(&self, chapter_id: &str) -> LockRecord {
        self.records
            .get(chapter_id)
            .cloned()
            .unwrap_or_else(|| LockRecord::new(chapter_id))
    }

    /// True iff the chapter is in `draft` or `revised`.
    #[must_use]
    pub fn is_editable(&self, chapter_id: &str) -> bool {
        self.get_state(chapter_id).state.is_editable()
    }

    /// All persisted lock records.
    #[must_use]
    pub const fn all_states(&self) -> &BTreeMap<String, LockRecord> {
        &self.records
    }

    /// The durable unlock audit log.
    #[must_use]
    pub const fn audit(&self) -> &UnlockAudit {
        &self.audit
    }

    /// Transitions a chapter to a new state.
    ///
    /// Validates the edge against the transition table. Entering
    /// `canon_locked` or `published` requires a non-empty reason and stamps
    /// the lock metadata; entering `revised` increments the revision count.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::LockedRequiresUnlock`] when the chapter is
    ///   `canon_locked` (use [`unlock`](Self::unlock) first).
    /// - [`GovernanceError::PublishedIsFinal`] when the chapter is
    ///   `published`; there is no override, publishing is final.
    /// - [`GovernanceError::InvalidTransition`] for any other missing edge.
    /// - [`ValidationError::MissingLockReason`] when locking without a
    ///   reason.
    pub fn set_state(
        &mut self,
        chapter_id: &str,
        new_state: ChapterState,
        reason: Option<&str>,
        by: &str,
    ) -> CanonryResult<LockRecord> {
        let mut record = self.get_state(chapter_id);
        let current = record.state;

        if !current.allowed_targets().contains(&new_state) {
            warn!(chapter_id, %current, target = %new_state, "rejected lock transition");
            let err = match current {
                ChapterState::CanonLocked => GovernanceError::LockedRequiresUnlock {
                    chapter: chapter_id.to_string(),
                },
                ChapterState::Published => GovernanceError::PublishedIsFinal {
                    chapter: chapter_id.to_string(),
                },
                _ => GovernanceError::InvalidTransition {
                    chapter: chapter_id.to_string(),
                    from: current,
                    to: new_state,
                },
            };
            return Err(err.into());
        }

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        if new_state.is_locking() && reason.is_none() {
            return Err(ValidationError::MissingLockReason { state: new_state }.into());
        }

        record.state = new_state;
        record.last_modified = Utc::now();
        if new_state.is_locking() {
            record.locked_at = Some(Utc::now());
            record.locked_by = Some(by.to_string());
            record.lock_reason = reason.map(ToString::to_string);
        } else {
            record.locked_at = None;
            record.locked_by = None;
            record.lock_reason = None;
        }
        if new_state == ChapterState::Revised {
            record.revision_count += 1;
        }

        self.records.insert(chapter_id.to_string(), record.clone());
        self.save()?;
        info!(chapter_id, from = %current, to = %new_state, "chapter state changed");
        Ok(record)
    }

    /// Unlocks a `canon_locked` chapter back to `revised`.
    ///
    /// The reason is mandatory and meaningful (10+ characters after
    /// trimming). The unlock is recorded twice: in the record's own
    /// history and in the durable append-only audit log. The chapter
    /// always lands in `revised`, never `draft`.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::NotLocked`] unless the current state is
    ///   exactly `canon_locked`.
    /// - [`ValidationError::ReasonTooShort`] for an empty or short reason.
    pub fn unlock(
        &mut self,
        chapter_id: &str,
        reason: &str,
        by: &str,
    ) -> CanonryResult<LockRecord> {
        let mut record = self.get_state(chapter_id);

        if record.state != ChapterState::CanonLocked {
            return Err(GovernanceError::NotLocked {
                chapter: chapter_id.to_string(),
                state: record.state,
            }
            .into());
        }

        let trimmed = reason.trim();
        if trimmed.len() < MIN_UNLOCK_REASON_LEN {
            return Err(ValidationError::ReasonTooShort {
                min: MIN_UNLOCK_REASON_LEN,
                actual: trimmed.len(),
            }
            .into());
        }

        let now = Utc::now();
        self.audit.append(&UnlockAuditEntry {
            entry_id: Uuid::new_v4(),
            chapter_id: chapter_id.to_string(),
            from_state: ChapterState::CanonLocked,
            to_state: ChapterState::Revised,
            reason: trimmed.to_string(),
            unlocked_by: by.to_string(),
            unlocked_at: now,
            previous_lock_date: record.locked_at,
        })?;

        record.unlock_history.push(UnlockEntry {
            from_state: ChapterState::CanonLocked,
            to_state: ChapterState::Revised,
            reason: trimmed.to_string(),
            timestamp: now,
        });
        record.state = ChapterState::Revised;
        record.revision_count += 1;
        record.locked_at = None;
        record.locked_by = None;
        record.lock_reason = None;
        record.last_modified = now;

        self.records.insert(chapter_id.to_string(), record.clone());
        self.save()?;
        info!(chapter_id, by, "chapter unlocked to revised");
        Ok(record)
    }

    /// Records the latest observed word count for a chapter.
    ///
    /// Bookkeeping only; does not touch governance state. The caller
    /// (editor, batch tooling) counts words because chapter content lives
    /// with the chapter storage collaborator, not here.
    pub fn record_word_count(&mut self, chapter_id: &str, words: usize) -> CanonryResult<LockRecord> {
        let mut record = self.get_state(chapter_id);
        record.word_count = words;
        record.last_modified = Utc::now();
        self.records.insert(chapter_id.to_string(), record.clone());
        self.save()?;
        Ok(record)
    }
}
