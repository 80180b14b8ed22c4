//! Research document records.
//!
//! Every ingested document is tracked by a registry record carrying its
//! class, lifecycle status, and per-stage timestamps. The AI classifies
//! and distills; it never decides what is true. Promotion is a human
//! decision.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The four research classes with distinct usage rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResearchClass {
    /// Novel-bound facts: always loaded, never contradicted.
    Canon,
    /// Background material: informs, never narrated directly.
    Context,
    /// In-world documents: scene triggers, never summarized generically.
    Artifact,
    /// Writing guidance: editorial scaffolding, never in narrative.
    Craft,
}

impl ResearchClass {
    /// All classes, in governance-priority order.
    pub const ALL: [Self; 4] = [Self::Canon, Self::Context, Self::Artifact, Self::Craft];

    /// The snake_case string form used in persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Canon => "canon",
            Self::Context => "context",
            Self::Artifact => "artifact",
            Self::Craft => "craft",
        }
    }

    /// Suggested subtypes within this class, most common first.
    #[must_use]
    pub const fn subtypes(&self) -> &'static [&'static str] {
        match self {
            Self::Canon => &["characters", "timeline", "locations", "terminology", "rules"],
            Self::Context => &["historical", "social", "operational", "geographic"],
            Self::Artifact => &["letters", "postcards", "programs", "photographs", "documents"],
            Self::Craft => &["style", "structure", "process", "influences"],
        }
    }
}

impl fmt::Display for ResearchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ResearchClass {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "canon" => Ok(Self::Canon),
            "context" => Ok(Self::Context),
            "artifact" => Ok(Self::Artifact),
            "craft" => Ok(Self::Craft),
            _ => Err(ValidationError::UnknownClass { value }),
        }
    }
}

impl From<ResearchClass> for String {
    fn from(c: ResearchClass) -> Self {
        c.as_str().to_string()
    }
}

/// Lifecycle status of a research document.
///
/// Status only advances forward: `intake → classified → distilled →
/// promoted`, with `rejected` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResearchStatus {
    /// Ingested, awaiting classification.
    Intake,
    /// Class assigned; distillation may proceed.
    Classified,
    /// Digest extracted; awaiting human approval.
    Distilled,
    /// Approved and placed in its class area. Terminal.
    Promoted,
    /// Refused; backing file moved to the rejected area. Terminal.
    Rejected,
}

impl ResearchStatus {
    /// The snake_case string form used in persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Classified => "classified",
            Self::Distilled => "distilled",
            Self::Promoted => "promoted",
            Self::Rejected => "rejected",
        }
    }

    /// True for statuses with no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Promoted | Self::Rejected)
    }
}

impl fmt::Display for ResearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ResearchStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "intake" => Ok(Self::Intake),
            "classified" => Ok(Self::Classified),
            "distilled" => Ok(Self::Distilled),
            "promoted" => Ok(Self::Promoted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ValidationError::UnknownStatus { value }),
        }
    }
}

impl From<ResearchStatus> for String {
    fn from(s: ResearchStatus) -> Self {
        s.as_str().to_string()
    }
}

/// Stable research document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialization of the unclassified/classified distinction: the registry
/// stores `"unclassified"` rather than null so the file reads naturally.
mod class_or_unclassified {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ResearchClass;

    pub fn serialize<S: Serializer>(
        value: &Option<ResearchClass>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(class) => serializer.serialize_str(class.as_str()),
            None => serializer.serialize_str("unclassified"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ResearchClass>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "unclassified" {
            return Ok(None);
        }
        ResearchClass::try_from(raw)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// Registry record for an ingested research document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchDocument {
    /// Stable identifier.
    pub id: DocumentId,
    /// Filename the document arrived under.
    pub original_name: String,
    /// Assigned class; `None` until classification.
    #[serde(with = "class_or_unclassified")]
    pub research_class: Option<ResearchClass>,
    /// Subtype within the class, if assigned.
    pub subtype: Option<String>,
    /// Lifecycle status.
    pub status: ResearchStatus,
    /// Classification confidence in `[0.0, 1.0]`, if classified.
    pub confidence: Option<f32>,
    /// Content hash used for deduplication.
    pub file_hash: String,
    /// Where the raw file currently lives.
    pub raw_path: PathBuf,
    /// Digest file, once distilled.
    pub digest_path: Option<PathBuf>,
    /// Final class-area location, once promoted.
    pub final_path: Option<PathBuf>,
    /// Curator notes, free-form.
    pub notes: String,
    /// Rejection reason, verbatim, if rejected.
    pub rejection_reason: Option<String>,
    /// When the document was ingested.
    pub ingested_at: DateTime<Utc>,
    /// When it was classified, if ever.
    pub classified_at: Option<DateTime<Utc>>,
    /// When it was distilled, if ever.
    pub distilled_at: Option<DateTime<Utc>>,
    /// When it was promoted, if ever.
    pub promoted_at: Option<DateTime<Utc>>,
    /// When it was rejected, if ever.
    pub rejected_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_and_status_reject_unknown_strings() {
        assert!(serde_json::from_str::<ResearchClass>("\"canon\"").is_ok());
        assert!(serde_json::from_str::<ResearchClass>("\"folklore\"").is_err());
        assert!(serde_json::from_str::<ResearchStatus>("\"distilled\"").is_ok());
        assert!(serde_json::from_str::<ResearchStatus>("\"pending\"").is_err());
    }

    #[test]
    fn unclassified_round_trips_as_a_string() {
        let doc = ResearchDocument {
            id: DocumentId::new("doc_letter_1"),
            original_name: "letter.md".to_string(),
            research_class: None,
            subtype: None,
            status: ResearchStatus::Intake,
            confidence: None,
            file_hash: "abc123".to_string(),
            raw_path: PathBuf::from("/tmp/doc"),
            digest_path: None,
            final_path: None,
            notes: String::new(),
            rejection_reason: None,
            ingested_at: Utc::now(),
            classified_at: None,
            distilled_at: None,
            promoted_at: None,
            rejected_at: None,
        };

        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"unclassified\""));

        let back: ResearchDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.research_class, None);
    }

    #[test]
    fn every_class_has_subtypes() {
        for class in ResearchClass::ALL {
            assert!(!class.subtypes().is_empty());
        }
    }
}
