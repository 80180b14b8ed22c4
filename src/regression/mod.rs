//! Consistency regression checks.
//!
//! Five independent scans over chapter text against the canon fact store.
//! Every check flags for human review; nothing here ever mutates a
//! chapter or a fact. Expect both false positives (phrasing differs) and
//! false negatives (key substring collisions); the reports are a review
//! queue, not a verdict.

mod era;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::canon::{normalize_key, CanonStore, FactCategory};
use crate::chapters::ChapterText;
use crate::severity::Severity;

pub use era::{EraCategory, EraFinding, EraLinter};

/// Attribution verbs that mark dialogue as attributed.
const ATTRIBUTION_VERBS: [&str; 11] = [
    "said", "asked", "replied", "answered", "whispered", "shouted", "muttered", "called",
    "yelled", "told", "spoke",
];

/// How many consecutive unattributed dialogue lines trigger a finding.
const UNATTRIBUTED_RUN: usize = 5;

/// One located mention of a tracked name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Chapter the mention is in.
    pub chapter: String,
    /// 1-based line number.
    pub line: usize,
    /// The trimmed line text.
    pub text: String,
}

/// A finding produced by one of the regression checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RegressionFinding {
    /// A mentioned age conflicts with a canon character age.
    AgeInconsistency {
        /// Chapter the mention is in.
        chapter: String,
        /// Age found in the text.
        found_age: u32,
        /// Age canon records.
        canon_age: u32,
        /// Fact key of the character.
        character: String,
        /// Surrounding text.
        context: String,
    },
    /// A canon location appears in several places; verify by hand.
    LocationReviewNeeded {
        /// Normalized location name.
        location: String,
        /// Every occurrence found.
        mentions: Vec<Mention>,
    },
    /// A date reference matches a canon timeline event.
    TimelineReference {
        /// Chapter the reference is in.
        chapter: String,
        /// The matched date text.
        date_found: String,
        /// Fact key of the timeline event.
        canon_event: String,
    },
    /// Where a canon object first appears, in chapter order.
    ObjectTracking {
        /// Normalized object name.
        object: String,
        /// First chapter mentioning it.
        first_appearance: String,
    },
    /// A run of dialogue lines with no attribution verb.
    UnattributedDialogue {
        /// Chapter the run is in.
        chapter: String,
        /// 1-based line the run starts on.
        line: usize,
        /// Length of the run.
        count: usize,
    },
}

impl RegressionFinding {
    /// Severity of this finding.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::AgeInconsistency { .. } => Severity::High,
            Self::UnattributedDialogue { .. } => Severity::Warning,
            Self::LocationReviewNeeded { .. }
            | Self::TimelineReference { .. }
            | Self::ObjectTracking { .. } => Severity::Info,
        }
    }

    /// Chapter the finding points at, where one applies.
    #[must_use]
    pub fn chapter(&self) -> Option<&str> {
        match self {
            Self::AgeInconsistency { chapter, .. }
            | Self::TimelineReference { chapter, .. }
            | Self::UnattributedDialogue { chapter, .. } => Some(chapter),
            Self::LocationReviewNeeded { .. } | Self::ObjectTracking { .. } => None,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::AgeInconsistency {
                found_age,
                canon_age,
                character,
                ..
            } => format!(
                "age {found_age} conflicts with canon age {canon_age} for '{character}'"
            ),
            Self::LocationReviewNeeded { location, mentions } => format!(
                "Location '{location}' mentioned {} times across chapters - verify consistency",
                mentions.len()
            ),
            Self::TimelineReference {
                date_found,
                canon_event,
                ..
            } => format!("Date reference '{date_found}' matches timeline event '{canon_event}'"),
            Self::ObjectTracking {
                object,
                first_appearance,
            } => format!("Object '{object}' first appears in {first_appearance}"),
            Self::UnattributedDialogue { count, .. } => {
                format!("{count} consecutive dialogue lines without clear attribution")
            }
        }
    }
}

/// Aggregated result of a full regression run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Identity of this run.
    pub report_id: Uuid,
    /// When the run happened.
    pub generated_at: DateTime<Utc>,
    /// How many chapters were scanned.
    pub chapters_checked: usize,
    /// Findings per check, keyed by check name.
    pub checks: BTreeMap<String, Vec<RegressionFinding>>,
}

impl RegressionReport {
    /// Finding counts per check plus a combined total.
    #[must_use]
    pub fn summary(&self) -> (BTreeMap<&str, usize>, usize) {
        let counts: BTreeMap<&str, usize> = self
            .checks
            .iter()
            .map(|(name, findings)| (name.as_str(), findings.len()))
            .collect();
        let total = counts.values().sum();
        (counts, total)
    }

    /// Renders the report as markdown for human review.
    #[must_use]
    pub fn render_markdown(&self) -> String {
        let (counts, total) = self.summary();

        let mut lines = vec![
            "# Regression Check Report".to_string(),
            format!("Generated: {}", self.generated_at.to_rfc3339()),
            format!("Chapters Checked: {}", self.chapters_checked),
            String::new(),
            "## Summary".to_string(),
            String::new(),
        ];

        for (name, count) in &counts {
            lines.push(format!("- **{}**: {count} items", title_case(name)));
        }
        lines.push(format!("\n**Total Items for Review: {total}**"));
        lines.push(String::new());

        for (name, findings) in &self.checks {
            if findings.is_empty() {
                continue;
            }
            lines.push(format!("## {}", title_case(name)));
            lines.push(String::new());
            for finding in findings {
                let severity = finding.severity().to_string().to_uppercase();
                let chapter = finding.chapter().unwrap_or("N/A");
                lines.push(format!("- [{severity}] {chapter}: {}", finding.describe()));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clamp a byte index to a char boundary, moving downward.
fn floor_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Clamp a byte index to a char boundary, moving upward.
fn ceil_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Runs the five consistency scans.
///
/// Holds compiled regexes; construct once, reuse across runs.
pub struct RegressionChecker<'a> {
    canon: &'a CanonStore,
    age_patterns: Vec<Regex>,
    date_patterns: Vec<Regex>,
    dialogue_pattern: Regex,
}

impl<'a> RegressionChecker<'a> {
    /// Creates a checker over a canon store.
    #[must_use]
    pub fn new(canon: &'a CanonStore) -> Self {
        let ci = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("static regex")
        };

        Self {
            canon,
            age_patterns: vec![
                ci(r"\b(\d{1,2})\s*years?\s*old\b"),
                ci(r"\bage[d]?\s*(\d{1,2})\b"),
                ci(r"\b(\d{1,2})-year-old\b"),
            ],
            date_patterns: vec![
                ci(r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?,?\s*\d{4}\b"),
                ci(r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\b"),
                ci(r"\b(Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\b"),
                ci(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b"),
            ],
            dialogue_pattern: ci("\"[^\"]+\"|\u{201c}[^\u{201d}]+"),
        }
    }

    /// Age mentions that conflict with canon character ages.
    #[must_use]
    pub fn check_character_ages(&self, chapters: &[ChapterText]) -> Vec<RegressionFinding> {
        let mut findings = Vec::new();
        let character_facts = self.canon.facts_in(FactCategory::Characters);

        for chapter in chapters {
            let content = &chapter.text;
            for pattern in &self.age_patterns {
                for caps in pattern.captures_iter(content) {
                    let Some(age) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok())
                    else {
                        continue;
                    };
                    let whole = caps.get(0).expect("match group 0");
                    let start = floor_boundary(content, whole.start().saturating_sub(50));
                    let end = ceil_boundary(content, whole.end() + 50);
                    let context = &content[start..end];
                    let context_lower = context.to_lowercase();

                    for (key, fact) in &character_facts {
                        if !key.to_lowercase().contains("age") {
                            continue;
                        }
                        let Ok(canon_age) = fact.value.parse::<u32>() else {
                            continue;
                        };
                        if canon_age == age {
                            continue;
                        }
                        let name = key.split('_').next().unwrap_or(key).to_lowercase();
                        if context_lower.contains(&name) {
                            findings.push(RegressionFinding::AgeInconsistency {
                                chapter: chapter.chapter_id.clone(),
                                found_age: age,
                                canon_age,
                                character: (*key).to_string(),
                                context: context.trim().to_string(),
                            });
                        }
                    }
                }
            }
        }

        findings
    }

    /// Every occurrence of a canon location, surfaced for human review
    /// when it appears more than once.
    #[must_use]
    pub fn check_locations(&self, chapters: &[ChapterText]) -> Vec<RegressionFinding> {
        let location_facts = self.canon.facts_in(FactCategory::Locations);
        let mut mentions_by_location: BTreeMap<String, Vec<Mention>> = BTreeMap::new();

        for chapter in chapters {
            let content_lower = chapter.text.to_lowercase();
            for key in location_facts.keys() {
                let name = normalize_key(key);
                if !content_lower.contains(&name) {
                    continue;
                }
                for (line_num, line) in chapter.text.lines().enumerate() {
                    if line.to_lowercase().contains(&name) {
                        mentions_by_location
                            .entry(name.clone())
                            .or_default()
                            .push(Mention {
                                chapter: chapter.chapter_id.clone(),
                                line: line_num + 1,
                                text: line.trim().to_string(),
                            });
                    }
                }
            }
        }

        mentions_by_location
            .into_iter()
            .filter(|(_, mentions)| mentions.len() > 1)
            .map(|(location, mentions)| RegressionFinding::LocationReviewNeeded {
                location,
                mentions,
            })
            .collect()
    }

    /// Date references that match canon timeline facts. Informational.
    #[must_use]
    pub fn check_timeline(&self, chapters: &[ChapterText]) -> Vec<RegressionFinding> {
        let timeline_facts = self.canon.facts_in(FactCategory::Timeline);
        let mut findings = Vec::new();

        for chapter in chapters {
            for pattern in &self.date_patterns {
                for m in pattern.find_iter(&chapter.text) {
                    let date_lower = m.as_str().to_lowercase();
                    for (key, fact) in &timeline_facts {
                        if fact.value.to_lowercase().contains(&date_lower) {
                            findings.push(RegressionFinding::TimelineReference {
                                chapter: chapter.chapter_id.clone(),
                                date_found: m.as_str().to_string(),
                                canon_event: (*key).to_string(),
                            });
                        }
                    }
                }
            }
        }

        findings
    }

    /// First chapter, in file order, where each canon object appears.
    #[must_use]
    pub fn check_object_continuity(&self, chapters: &[ChapterText]) -> Vec<RegressionFinding> {
        let object_facts = self.canon.facts_in(FactCategory::Objects);
        let mut first_appearance: BTreeMap<String, String> = BTreeMap::new();

        for chapter in chapters {
            let content_lower = chapter.text.to_lowercase();
            for key in object_facts.keys() {
                let name = normalize_key(key);
                if content_lower.contains(&name) {
                    first_appearance
                        .entry(name)
                        .or_insert_with(|| chapter.chapter_id.clone());
                }
            }
        }

        first_appearance
            .into_iter()
            .map(|(object, first)| RegressionFinding::ObjectTracking {
                object,
                first_appearance: first,
            })
            .collect()
    }

    /// Runs of five or more dialogue lines with no attribution verb.
    #[must_use]
    pub fn check_dialogue_attribution(&self, chapters: &[ChapterText]) -> Vec<RegressionFinding> {
        let mut findings = Vec::new();

        for chapter in chapters {
            let mut consecutive = 0usize;
            let mut line_count = 0usize;

            let flush = |consecutive: usize, at_line: usize, findings: &mut Vec<_>| {
                if consecutive >= UNATTRIBUTED_RUN {
                    findings.push(RegressionFinding::UnattributedDialogue {
                        chapter: chapter.chapter_id.clone(),
                        line: at_line - consecutive,
                        count: consecutive,
                    });
                }
            };

            for (line_num, line) in chapter.text.lines().enumerate() {
                line_count = line_num + 1;
                let has_dialogue = self.dialogue_pattern.is_match(line);
                let line_lower = line.to_lowercase();
                let has_attribution =
                    ATTRIBUTION_VERBS.iter().any(|verb| line_lower.contains(verb));

                if has_dialogue && !has_attribution {
                    consecutive += 1;
                } else {
                    flush(consecutive, line_count, &mut findings);
                    consecutive = 0;
                }
            }
            // A chapter ending mid-run still counts.
            flush(consecutive, line_count + 1, &mut findings);
        }

        findings
    }

    /// Runs all five checks and aggregates them into one report.
    #[must_use]
    pub fn run_all_checks(&self, chapters: &[ChapterText]) -> RegressionReport {
        let mut checks = BTreeMap::new();
        checks.insert(
            "character_ages".to_string(),
            self.check_character_ages(chapters),
        );
        checks.insert("locations".to_string(), self.check_locations(chapters));
        checks.insert("timeline".to_string(), self.check_timeline(chapters));
        checks.insert(
            "object_continuity".to_string(),
            self.check_object_continuity(chapters),
        );
        checks.insert(
            "dialogue_attribution".to_string(),
            self.check_dialogue_attribution(chapters),
        );

        RegressionReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            chapters_checked: chapters.len(),
            checks,
        }
    }
}
