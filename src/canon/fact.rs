//! Canon fact records.
//!
//! A fact is a human-approved unit of narrative truth: a key, a value, and
//! the chapter it is sourced from. Facts never change silently; every value
//! change appends to the fact's history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The five canon fact categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FactCategory {
    /// Character details: ages, injuries, relationships.
    Characters,
    /// Dates, events, and their ordering.
    Timeline,
    /// Places as depicted in chapters.
    Locations,
    /// In-world objects whose continuity matters.
    Objects,
    /// Everything else the narrative must not contradict.
    Facts,
}

impl FactCategory {
    /// All categories, in the order the canon document lists them.
    pub const ALL: [Self; 5] = [
        Self::Characters,
        Self::Timeline,
        Self::Locations,
        Self::Objects,
        Self::Facts,
    ];

    /// The snake_case string form used in persistence.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Characters => "characters",
            Self::Timeline => "timeline",
            Self::Locations => "locations",
            Self::Objects => "objects",
            Self::Facts => "facts",
        }
    }
}

impl Default for FactCategory {
    fn default() -> Self {
        Self::Facts
    }
}

impl fmt::Display for FactCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FactCategory {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "characters" => Ok(Self::Characters),
            "timeline" => Ok(Self::Timeline),
            "locations" => Ok(Self::Locations),
            "objects" => Ok(Self::Objects),
            "facts" => Ok(Self::Facts),
            _ => Err(ValidationError::UnknownCategory { value }),
        }
    }
}

impl From<FactCategory> for String {
    fn from(c: FactCategory) -> Self {
        c.as_str().to_string()
    }
}

/// One entry in a fact's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactChange {
    /// The value before this change.
    pub old_value: String,
    /// When the change was recorded.
    pub changed_at: DateTime<Utc>,
    /// Why the value changed.
    pub reason: String,
}

/// A single canon fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Unique key within its category.
    pub key: String,
    /// The current factual value.
    pub value: String,
    /// Chapter where this fact appears on the page.
    ///
    /// Soft reference: a chapter id with no lock record is tolerated and
    /// left for external review.
    pub source_chapter: String,
    /// When the fact was created.
    pub created_at: DateTime<Utc>,
    /// When the fact last changed.
    pub updated_at: DateTime<Utc>,
    /// Prior values, oldest first.
    #[serde(default)]
    pub history: Vec<FactChange>,
}

impl Fact {
    /// Creates a new fact with an empty history.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        source_chapter: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            value: value.into(),
            source_chapter: source_chapter.into(),
            created_at: now,
            updated_at: now,
            history: Vec::new(),
        }
    }

    /// The fact key with underscores replaced by spaces, lower-cased.
    ///
    /// This is the form matched against chapter text.
    #[must_use]
    pub fn normalized_key(&self) -> String {
        normalize_key(&self.key)
    }
}

/// Normalizes a fact key for text matching: underscores become spaces,
/// everything is lower-cased.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.replace('_', " ").to_lowercase()
}
