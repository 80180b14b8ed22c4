//! Error types for canonry.
//!
//! All errors are strongly typed using thiserror. The taxonomy is closed:
//! governance violations are always surfaced to the caller, while external
//! collaborator failures are recovered locally where a safe fallback exists
//! (see the distillation path in [`crate::research`]).

use thiserror::Error;

use crate::canon::FactCategory;
use crate::lock::ChapterState;

/// Validation errors that occur during input validation or when parsing
/// persisted state back into closed enumerations.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Fact key cannot be empty")]
    EmptyFactKey,

    #[error("A reason is required to enter {state}")]
    MissingLockReason {
        state: ChapterState,
    },

    #[error("Reason must be at least {min} characters (got {actual} after trimming)")]
    ReasonTooShort {
        min: usize,
        actual: usize,
    },

    #[error("Unknown fact category: '{value}'")]
    UnknownCategory {
        value: String,
    },

    #[error("Unknown chapter state: '{value}'")]
    UnknownState {
        value: String,
    },

    #[error("Unknown research class: '{value}'")]
    UnknownClass {
        value: String,
    },

    #[error("Unknown research status: '{value}'")]
    UnknownStatus {
        value: String,
    },

    #[error("Unknown loading context: '{value}'")]
    UnknownContext {
        value: String,
    },

    #[error("Invalid canon version string: '{value}'")]
    InvalidVersion {
        value: String,
    },
}

/// Governance rule violations: state-machine edges that are not permitted
/// and preconditions that do not hold. Never swallowed.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Invalid transition for chapter '{chapter}': {from} → {to}")]
    InvalidTransition {
        chapter: String,
        from: ChapterState,
        to: ChapterState,
    },

    #[error("Chapter '{chapter}' is canon_locked; use unlock() first")]
    LockedRequiresUnlock {
        chapter: String,
    },

    #[error("Chapter '{chapter}' is published and can never change")]
    PublishedIsFinal {
        chapter: String,
    },

    #[error("Chapter '{chapter}' is not canon_locked (state: {state}); nothing to unlock")]
    NotLocked {
        chapter: String,
        state: ChapterState,
    },

    #[error("Document '{id}' cannot {operation} while {status}")]
    LifecycleOrder {
        id: String,
        operation: &'static str,
        status: String,
    },
}

/// Store-level failures: missing records, duplicate content, and backend
/// (filesystem / serialization) errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Fact not found: {category}/{key}")]
    FactNotFound {
        category: FactCategory,
        key: String,
    },

    #[error("Fact already exists: {category}/{key}; use update_fact to change it")]
    DuplicateFact {
        category: FactCategory,
        key: String,
    },

    #[error("Research document not found: {id}")]
    DocumentNotFound {
        id: String,
    },

    #[error("Duplicate document content (hash {hash}); already ingested as '{existing}'")]
    DuplicateDocument {
        hash: String,
        existing: String,
    },

    #[error("Source file not found: {path}")]
    SourceFileMissing {
        path: String,
    },

    #[error("Storage backend error: {message}")]
    Backend {
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl StoreError {
    /// Wraps an I/O failure with the path it occurred on.
    #[must_use]
    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::Backend {
            message: format!("{}: {err}", path.display()),
        }
    }
}

/// Failures at the AI text-generation boundary.
///
/// `Unparseable` is recoverable in distillation (the raw response is kept
/// under a fallback capture); `Generation` has no safe fallback and is
/// surfaced.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Text generation failed: {message}")]
    Generation {
        message: String,
    },

    #[error("Collaborator response could not be parsed: {snippet}")]
    Unparseable {
        snippet: String,
    },
}

/// Top-level error type for canonry.
#[derive(Debug, Error)]
pub enum CanonryError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CanonryError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a governance violation.
    #[must_use]
    pub const fn is_governance(&self) -> bool {
        matches!(self, Self::Governance(_))
    }

    /// Returns true if this is a store error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if the record named in the operation was not found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::FactNotFound { .. } | StoreError::DocumentNotFound { .. })
        )
    }

    /// Returns true if this is a duplicate-content rejection.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::DuplicateFact { .. } | StoreError::DuplicateDocument { .. })
        )
    }

    /// Returns true if this error came from the AI collaborator boundary.
    #[must_use]
    pub const fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }
}

/// Result type alias for canonry operations.
pub type CanonryResult<T> = Result<T, CanonryError>;
