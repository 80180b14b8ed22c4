//! Research governance: the four-class document lifecycle.
//!
//! The AI classifies and distills. The AI does not decide what is true:
//! promotion into a class area is always a human decision, and promoted
//! canon documents are candidate fact sources, never facts themselves.

mod classify;
mod distill;
mod document;
mod lifecycle;

pub use classify::{suggest_subtype, ClassificationResult, ResearchClassifier};
pub use distill::{distillation_prompt, parse_digest, Digest, DISTILL_MAX_TOKENS};
pub use document::{DocumentId, ResearchClass, ResearchDocument, ResearchStatus};
pub use lifecycle::{ResearchPipeline, ResearchStatistics};
