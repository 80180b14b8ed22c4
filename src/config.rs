//! Project layout configuration.
//!
//! All components receive an explicit [`ProjectLayout`] at construction.
//! There is no ambient configuration: every path the engine touches is
//! derived from the single root handed in by the caller.

use std::path::{Path, PathBuf};

use crate::error::{CanonryResult, StoreError};
use crate::research::ResearchClass;

/// Filesystem layout for one writing project.
///
/// The layout mirrors the on-disk convention the governance engine assumes:
///
/// ```text
/// <root>/
///   reference/                canon class storage, canon document, changelog
///   research/intake/          ingested documents awaiting classification
///   research/context/         promoted CONTEXT material
///   research/artifacts/       promoted ARTIFACT material
///   research/craft/           promoted CRAFT material
///   research/digests/         distilled digests (pre-promotion)
///   research/rejected/        rejected documents
///   chapters/                 chapter text files
/// ```
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Creates a layout rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canon class storage (also holds the canon document and changelog).
    #[must_use]
    pub fn reference_dir(&self) -> PathBuf {
        self.root.join("reference")
    }

    /// Research tree root.
    #[must_use]
    pub fn research_dir(&self) -> PathBuf {
        self.root.join("research")
    }

    /// Intake area for freshly ingested documents.
    #[must_use]
    pub fn intake_dir(&self) -> PathBuf {
        self.research_dir().join("intake")
    }

    /// Rejected-document area.
    #[must_use]
    pub fn rejected_dir(&self) -> PathBuf {
        self.research_dir().join("rejected")
    }

    /// Distilled digests awaiting promotion.
    #[must_use]
    pub fn digests_dir(&self) -> PathBuf {
        self.research_dir().join("digests")
    }

    /// Chapter text files.
    #[must_use]
    pub fn chapters_dir(&self) -> PathBuf {
        self.root.join("chapters")
    }

    /// Final storage area for a research class.
    #[must_use]
    pub fn class_dir(&self, class: ResearchClass) -> PathBuf {
        match class {
            ResearchClass::Canon => self.reference_dir(),
            ResearchClass::Context => self.research_dir().join("context"),
            ResearchClass::Artifact => self.research_dir().join("artifacts"),
            ResearchClass::Craft => self.research_dir().join("craft"),
        }
    }

    /// The canon document (version + categorized fact map).
    #[must_use]
    pub fn canon_file(&self) -> PathBuf {
        self.reference_dir().join("canon_version.json")
    }

    /// Append-only canon changelog.
    #[must_use]
    pub fn changelog_file(&self) -> PathBuf {
        self.reference_dir().join("canon_changelog.md")
    }

    /// Chapter lock state document.
    #[must_use]
    pub fn locks_file(&self) -> PathBuf {
        self.root.join("chapter_locks.json")
    }

    /// Append-only unlock audit log (JSON lines).
    #[must_use]
    pub fn unlock_audit_file(&self) -> PathBuf {
        self.root.join("unlock_audit.jsonl")
    }

    /// Research document registry.
    #[must_use]
    pub fn registry_file(&self) -> PathBuf {
        self.research_dir().join("registry.json")
    }

    /// Creates every directory the engine writes into.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if any directory cannot be created.
    pub fn ensure_directories(&self) -> CanonryResult<()> {
        let dirs = [
            self.reference_dir(),
            self.intake_dir(),
            self.rejected_dir(),
            self.digests_dir(),
            self.chapters_dir(),
            self.class_dir(ResearchClass::Context),
            self.class_dir(ResearchClass::Artifact),
            self.class_dir(ResearchClass::Craft),
        ];
        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, &e))?;
        }
        Ok(())
    }
}
