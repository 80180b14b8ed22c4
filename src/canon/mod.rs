//! Canon fact governance.
//!
//! The canon is the set of facts established on the page. This module owns
//! them: categorized storage, semantic versioning, append-only change
//! history, and the coarse text-vs-canon validation heuristic.

mod fact;
mod store;
mod version;

pub use fact::{normalize_key, Fact, FactCategory, FactChange};
pub use store::{CanonFinding, CanonStore};
pub use version::CanonVersion;
