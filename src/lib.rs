//! # Canonry - Research Governance & Canon Consistency Engine
//!
//! Canonry is the governance core of a long-form fiction workflow. It
//! tracks what is *true* (canon facts), what is *frozen* (chapter locks),
//! what the AI may *see* (four-class research governance), and what looks
//! *inconsistent* (advisory regression checks).
//!
//! ## Core Concepts
//!
//! - **Fact**: a human-approved unit of narrative truth with full change
//!   history, stored under a semantic canon version
//! - **Chapter lock**: a per-chapter state machine (`draft → revised →
//!   canon_locked → published`) with audited unlock reasons
//! - **Research class**: CANON / CONTEXT / ARTIFACT / CRAFT, each with
//!   distinct rules for how the AI may use the material
//! - **Governed bundle**: the context-dependent slice of reference
//!   material assembled for an AI call, truncated canon-last
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canonry::canon::{CanonStore, FactCategory};
//! use canonry::config::ProjectLayout;
//! use canonry::lock::{ChapterLocks, ChapterState};
//!
//! let layout = ProjectLayout::new("/path/to/project");
//! let mut canon = CanonStore::open(&layout)?;
//! let mut locks = ChapterLocks::open(&layout)?;
//!
//! canon.add_fact("tommy_age", "19", "Chapter 1", FactCategory::Characters)?;
//! locks.set_state("ch5", ChapterState::CanonLocked, Some("finalized for beta"), "author")?;
//!
//! let findings = canon.validate_against_canon("Tommy, who was 17, walked in.");
//! assert_eq!(findings.len(), 1);
//! ```
//!
//! The engine is single-process and single-writer: state is flat JSON
//! reloaded at construction and rewritten in full on every mutation, plus
//! append-only changelog/audit files. GUI, exporters, and AI provider
//! wrappers are external collaborators behind the traits in
//! [`collaborator`] and [`chapters`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod canon;
pub mod chapters;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod lock;
pub mod reference;
pub mod regression;
pub mod research;
pub mod severity;

// Re-export primary types at crate root for convenience
pub use canon::{CanonFinding, CanonStore, CanonVersion, Fact, FactCategory};
pub use chapters::{ChapterProvider, ChapterText, DirectoryChapters};
pub use collaborator::TextGenerator;
pub use config::ProjectLayout;
pub use error::{CanonryError, CanonryResult};
pub use lock::{ChapterLocks, ChapterState, LockRecord};
pub use reference::{LoadContext, ReferenceBundle, ReferenceLoader};
pub use regression::{RegressionChecker, RegressionReport};
pub use research::{DocumentId, ResearchClass, ResearchPipeline, ResearchStatus};
pub use severity::Severity;
