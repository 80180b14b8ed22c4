//! The canon fact store.
//!
//! A fact enters canon only when it appears on the page; research digests
//! never override canon. The store owns the canon document (version +
//! categorized fact map), rewrites it in full on every mutation, and
//! appends a human-readable changelog entry alongside.

use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProjectLayout;
use crate::error::{CanonryResult, StoreError, ValidationError};
use crate::severity::Severity;

use super::fact::{normalize_key, Fact, FactCategory, FactChange};
use super::version::CanonVersion;

/// The persisted canon document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CanonDocument {
    version: CanonVersion,
    last_update: chrono::DateTime<Utc>,
    #[serde(default)]
    categories: BTreeMap<FactCategory, BTreeMap<String, Fact>>,
}

impl CanonDocument {
    fn new() -> Self {
        Self {
            version: CanonVersion::initial(),
            last_update: Utc::now(),
            categories: BTreeMap::new(),
        }
    }
}

/// A potential inconsistency between chapter text and a canon fact.
///
/// Emitted by [`CanonStore::validate_against_canon`]. Always advisory;
/// the check over-flags when phrasing differs and under-flags when an
/// unrelated key substring collides, which is why severity never exceeds
/// [`Severity::Warning`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonFinding {
    /// Category of the fact that triggered the finding.
    pub category: FactCategory,
    /// Key of the fact that triggered the finding.
    pub fact_key: String,
    /// The canonical value the text did not echo.
    pub canon_value: String,
    /// Always [`Severity::Warning`] for this heuristic.
    pub severity: Severity,
    /// Human-readable description naming fact and value.
    pub message: String,
}

/// Versioned, change-logged fact store.
///
/// # Usage
///
/// ```no_run
/// use canonry::config::ProjectLayout;
/// use canonry::canon::{CanonStore, FactCategory};
///
/// # fn main() -> canonry::CanonryResult<()> {
/// let layout = ProjectLayout::new("/path/to/project");
/// let mut canon = CanonStore::open(&layout)?;
///
/// canon.add_fact("tommy_age", "19", "Chapter 1", FactCategory::Characters)?;
/// let findings = canon.validate_against_canon("Tommy, who was 17, walked in.");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CanonStore {
    canon_file: PathBuf,
    changelog_file: PathBuf,
    document: CanonDocument,
}

impl CanonStore {
    /// Opens the canon store, creating a default document if none exists.
    ///
    /// # Errors
    ///
    /// Fails if the reference directory cannot be created, the document
    /// cannot be read, or the persisted document contains values outside
    /// the closed enumerations (unknown category, malformed version).
    pub fn open(layout: &ProjectLayout) -> CanonryResult<Self> {
        let reference_dir = layout.reference_dir();
        fs::create_dir_all(&reference_dir).map_err(|e| StoreError::io(&reference_dir, &e))?;

        let canon_file = layout.canon_file();
        let changelog_file = layout.changelog_file();

        let document = if canon_file.exists() {
            let raw = fs::read_to_string(&canon_file).map_err(|e| StoreError::io(&canon_file, &e))?;
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
                message: format!("{}: {e}", canon_file.display()),
            })?
        } else {
            CanonDocument::new()
        };

        let mut store = Self {
            canon_file,
            changelog_file,
            document,
        };
        store.save()?;
        debug!(version = %store.document.version, "canon store opened");
        Ok(store)
    }

    /// Current canon schema version.
    #[must_use]
    pub const fn version(&self) -> CanonVersion {
        self.document.version
    }

    fn save(&mut self) -> CanonryResult<()> {
        self.document.last_update = Utc::now();
        let json = serde_json::to_string_pretty(&self.document).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        fs::write(&self.canon_file, json).map_err(|e| StoreError::io(&self.canon_file, &e))?;
        Ok(())
    }

    fn log_changelog(
        &self,
        action: &str,
        details: &str,
        affected_chapters: &[String],
    ) -> CanonryResult<()> {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
        let mut entry = format!("\n## {timestamp}\n\n**Action:** {action}\n\n**Details:** {details}\n\n");
        if !affected_chapters.is_empty() {
            entry.push_str(&format!(
                "**Affected Chapters:** {}\n\n",
                affected_chapters.join(", ")
            ));
        }
        entry.push_str("---\n");

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.changelog_file)
            .map_err(|e| StoreError::io(&self.changelog_file, &e))?;
        file.write_all(entry.as_bytes())
            .map_err(|e| StoreError::io(&self.changelog_file, &e))?;
        Ok(())
    }

    /// Adds a new canon fact.
    ///
    /// The store rejects an existing key in the same category: silently
    /// overwriting a fact would bypass the history invariant. Use
    /// [`update_fact`](Self::update_fact) to change a value.
    ///
    /// Bumps the patch version and appends a changelog entry.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyFactKey`] if the key is blank.
    /// - [`StoreError::DuplicateFact`] if the key already exists.
    pub fn add_fact(
        &mut self,
        key: &str,
        value: &str,
        source_chapter: &str,
        category: FactCategory,
    ) -> CanonryResult<Fact> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::EmptyFactKey.into());
        }

        let facts = self.document.categories.entry(category).or_default();
        if facts.contains_key(key) {
            return Err(StoreError::DuplicateFact {
                category,
                key: key.to_string(),
            }
            .into());
        }

        let fact = Fact::new(key, value, source_chapter);
        facts.insert(key.to_string(), fact.clone());
        self.document.version = self.document.version.bump_patch();
        self.save()?;
        self.log_changelog(
            "ADD_FACT",
            &format!("Added {category}/{key}: {value}"),
            &[source_chapter.to_string()],
        )?;

        info!(%category, key, version = %self.document.version, "canon fact added");
        Ok(fact)
    }

    /// Updates an existing canon fact, appending the old value to history.
    ///
    /// Bumps the minor version (patch resets) and writes a changelog
    /// entry naming every affected chapter.
    ///
    /// # Errors
    ///
    /// [`StoreError::FactNotFound`] if the key is absent from the category.
    pub fn update_fact(
        &mut self,
        key: &str,
        new_value: &str,
        reason: &str,
        affected_chapters: &[String],
        category: FactCategory,
    ) -> CanonryResult<Fact> {
        let fact = self
            .document
            .categories
            .get_mut(&category)
            .and_then(|facts| facts.get_mut(key))
            .ok_or_else(|| StoreError::FactNotFound {
                category,
                key: key.to_string(),
            })?;

        let old_value = fact.value.clone();
        fact.history.push(FactChange {
            old_value: old_value.clone(),
            changed_at: Utc::now(),
            reason: reason.to_string(),
        });
        fact.value = new_value.to_string();
        fact.updated_at = Utc::now();
        let updated = fact.clone();

        self.document.version = self.document.version.bump_minor();
        self.save()?;
        self.log_changelog(
            "UPDATE_FACT",
            &format!("Changed {category}/{key}: '{old_value}' -> '{new_value}'\nReason: {reason}"),
            affected_chapters,
        )?;

        info!(%category, key, version = %self.document.version, "canon fact updated");
        Ok(updated)
    }

    /// Looks up a fact by key and category.
    #[must_use]
    pub fn get_fact(&self, key: &str, category: FactCategory) -> Option<&Fact> {
        self.document.categories.get(&category)?.get(key)
    }

    /// All facts in one category, keyed by fact key.
    ///
    /// Returns an empty map for categories with no facts yet.
    #[must_use]
    pub fn facts_in(&self, category: FactCategory) -> BTreeMap<&str, &Fact> {
        self.document
            .categories
            .get(&category)
            .map(|facts| facts.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }

    /// All facts across every category.
    #[must_use]
    pub fn all_facts(&self) -> BTreeMap<FactCategory, BTreeMap<&str, &Fact>> {
        FactCategory::ALL
            .into_iter()
            .map(|cat| (cat, self.facts_in(cat)))
            .collect()
    }

    /// Checks chapter text against every canon fact.
    ///
    /// A fact counts as referenced when its normalized key appears as a
    /// substring of the lower-cased text, or when any word of the key
    /// appears as a whole word (so `tommy_age` is referenced by a
    /// sentence that names Tommy). A referenced fact whose value is
    /// absent is flagged. The check never mutates anything and never
    /// auto-corrects; it over-flags when phrasing differs, which is the
    /// accepted cost of never missing a canon mention outright.
    #[must_use]
    pub fn validate_against_canon(&self, chapter_text: &str) -> Vec<CanonFinding> {
        let text_lower = chapter_text.to_lowercase();
        let words: std::collections::BTreeSet<&str> = text_lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let referenced = |normalized: &str| {
            text_lower.contains(normalized)
                || normalized.split(' ').any(|token| words.contains(token))
        };

        let mut findings = Vec::new();

        for category in FactCategory::ALL {
            let Some(facts) = self.document.categories.get(&category) else {
                continue;
            };
            for (key, fact) in facts {
                if !referenced(&normalize_key(key)) {
                    continue;
                }
                if text_lower.contains(&fact.value.to_lowercase()) {
                    continue;
                }
                findings.push(CanonFinding {
                    category,
                    fact_key: key.clone(),
                    canon_value: fact.value.clone(),
                    severity: Severity::Warning,
                    message: format!(
                        "Canon fact '{key}' referenced but value '{}' not found",
                        fact.value
                    ),
                });
            }
        }

        findings
    }

    /// Renders the full canon as a markdown summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("# Canon Summary v{}", self.document.version),
            format!("Last Updated: {}", self.document.last_update.to_rfc3339()),
            String::new(),
        ];

        for category in FactCategory::ALL {
            let facts = self.facts_in(category);
            if facts.is_empty() {
                continue;
            }
            lines.push(format!("## {}", capitalize(category.as_str())));
            for (key, fact) in facts {
                lines.push(format!(
                    "- **{key}**: {} (from {})",
                    fact.value, fact.source_chapter
                ));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
