//! Era language linting.
//!
//! Scans prose for modern language that breaks a mid-century voice:
//! therapy-speak, corporate jargon, contemporary slang, and technology
//! anachronisms. Same contract as every other check here: flags only,
//! never rewrites.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// Category of anachronistic language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EraCategory {
    /// Modern clinical/emotional vocabulary.
    TherapySpeak,
    /// Business-speak that did not exist yet.
    CorporateJargon,
    /// Filler and emphasis that reads contemporary.
    ContemporarySlang,
    /// Technology rare or absent in the period.
    TechnologyAnachronism,
}

impl EraCategory {
    /// All categories.
    pub const ALL: [Self; 4] = [
        Self::TherapySpeak,
        Self::CorporateJargon,
        Self::ContemporarySlang,
        Self::TechnologyAnachronism,
    ];

    /// The snake_case string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TherapySpeak => "therapy_speak",
            Self::CorporateJargon => "corporate_jargon",
            Self::ContemporarySlang => "contemporary_slang",
            Self::TechnologyAnachronism => "technology_anachronism",
        }
    }

    /// Severity attached to findings in this category.
    ///
    /// Technology terms are context-dependent (a transistor can be
    /// period-correct), so they rank lowest.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::TherapySpeak | Self::CorporateJargon => Severity::High,
            Self::ContemporarySlang => Severity::Warning,
            Self::TechnologyAnachronism => Severity::Info,
        }
    }

    const fn terms(&self) -> &'static [&'static str] {
        match self {
            Self::TherapySpeak => &[
                "trauma", "traumatic", "traumatized", "triggered", "triggering", "boundaries",
                "toxic", "gaslighting", "gaslight", "codependent", "closure", "validate",
                "validation", "self-care", "safe space", "mindful", "mindfulness", "empower",
                "empowered", "unpack", "healing journey", "inner child", "coping mechanism",
                "red flag", "narcissist", "mental health", "support system", "lived experience",
            ],
            Self::CorporateJargon => &[
                "leverage", "leveraging", "synergy", "circle back", "pivot", "bandwidth",
                "stakeholder", "deliverable", "optimize", "proactive", "scalable", "paradigm",
                "actionable", "core competency", "best practices", "value proposition",
                "move the needle", "low-hanging fruit", "drill down", "loop in", "optics",
                "ecosystem",
            ],
            Self::ContemporarySlang => &[
                "24/7", "game-changer", "game changer", "no-brainer", "deep dive",
                "moving forward", "reach out", "reaching out", "heads up", "touch base",
                "pushback", "reality check", "wake-up call", "on the same page",
                "think outside the box", "win-win", "awesome", "totally", "lifestyle",
                "networking", "multitasking", "downtime",
            ],
            Self::TechnologyAnachronism => &[
                "computer", "computers", "television", "satellite", "transistor", "electronic",
                "plastic",
            ],
        }
    }
}

impl fmt::Display for EraCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged anachronistic term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraFinding {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column of the match start.
    pub column: usize,
    /// The matched term, as written.
    pub term: String,
    /// Which lexicon flagged it.
    pub category: EraCategory,
    /// Surrounding text on the line.
    pub context: String,
    /// Period-appropriate alternatives, when the lexicon has them.
    pub suggestions: Vec<String>,
    /// Severity from the category.
    pub severity: Severity,
}

/// Period alternatives for common modern terms. Terms arrive lower-cased.
fn alternatives(term: &str) -> &'static [&'static str] {
    match term {
        "stressed" => &["wound up", "on edge", "worked up", "keyed up"],
        "anxious" => &["nervy", "jumpy", "jittery", "uneasy"],
        "depressed" => &["low", "blue", "down", "in the dumps"],
        "upset" => &["rattled", "shaken", "put out", "sore"],
        "angry" => &["sore", "steamed", "burned up", "hot under the collar"],
        "scared" => &["spooked", "rattled", "shook up"],
        "awesome" => &["swell", "grand", "first-rate"],
        "totally" => &["plenty", "sure", "mighty"],
        "reach out" | "reaching out" => &["have a word", "drop a line"],
        "validate" | "validation" => &["back up", "bear out"],
        _ => &[],
    }
}

/// Scans text for anachronistic language.
///
/// # Usage
///
/// ```
/// use canonry::regression::EraLinter;
///
/// let linter = EraLinter::new();
/// let findings = linter.lint("He wanted to circle back after the show.");
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].term, "circle back");
/// ```
pub struct EraLinter {
    patterns: Vec<(EraCategory, Regex)>,
}

impl EraLinter {
    /// Creates a linter with the built-in lexicon compiled.
    #[must_use]
    pub fn new() -> Self {
        let patterns = EraCategory::ALL
            .into_iter()
            .map(|category| {
                let alternation = category
                    .terms()
                    .iter()
                    .map(|term| format!(r"\b{}\b", regex::escape(term)))
                    .collect::<Vec<_>>()
                    .join("|");
                let regex = RegexBuilder::new(&alternation)
                    .case_insensitive(true)
                    .build()
                    .expect("static lexicon regex");
                (category, regex)
            })
            .collect();
        Self { patterns }
    }

    /// Scans text, returning findings in line order.
    #[must_use]
    pub fn lint(&self, text: &str) -> Vec<EraFinding> {
        let mut findings = Vec::new();

        for (line_num, line) in text.lines().enumerate() {
            for (category, pattern) in &self.patterns {
                for m in pattern.find_iter(line) {
                    let start = super::floor_boundary(line, m.start().saturating_sub(30));
                    let end = super::ceil_boundary(line, m.end() + 30);
                    let term_lower = m.as_str().to_lowercase();

                    findings.push(EraFinding {
                        line: line_num + 1,
                        column: m.start() + 1,
                        term: m.as_str().to_string(),
                        category: *category,
                        context: format!("...{}...", line[start..end].trim()),
                        suggestions: alternatives(&term_lower)
                            .iter()
                            .map(|s| (*s).to_string())
                            .collect(),
                        severity: category.severity(),
                    });
                }
            }
        }

        findings.sort_by_key(|f| (f.line, f.column));
        findings
    }

    /// Finding counts per category.
    #[must_use]
    pub fn summarize(findings: &[EraFinding]) -> Vec<(EraCategory, usize)> {
        EraCategory::ALL
            .into_iter()
            .map(|category| {
                let count = findings.iter().filter(|f| f.category == category).count();
                (category, count)
            })
            .collect()
    }
}

impl Default for EraLinter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_therapy_speak_as_high() {
        let linter = EraLinter::new();
        let findings = linter.lint("She needed closure, he figured.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].term, "closure");
        assert_eq!(findings[0].category, EraCategory::TherapySpeak);
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn word_boundaries_prevent_partial_hits() {
        let linter = EraLinter::new();
        // "pivot" must not fire inside "pivoted"... which still contains the
        // word-boundary match "pivot" only when standing alone.
        assert!(linter.lint("The acrobat pivoted on one heel.").is_empty());
        assert_eq!(linter.lint("We should pivot the act.").len(), 1);
    }

    #[test]
    fn multiword_terms_and_columns() {
        let linter = EraLinter::new();
        let findings = linter.lint("Let's touch base after the matinee.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].term, "touch base");
        assert_eq!(findings[0].column, 7);
        assert!(findings[0].context.contains("touch base"));
    }

    #[test]
    fn suggestions_attach_where_known() {
        let linter = EraLinter::new();
        let findings = linter.lint("That was awesome.");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].suggestions.iter().any(|s| s == "swell"));
    }

    #[test]
    fn technology_terms_are_informational() {
        let linter = EraLinter::new();
        let findings = linter.lint("A television flickered in the window.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn findings_are_line_ordered_and_summarized() {
        let linter = EraLinter::new();
        let text = "He wanted to reach out.\nThe plan felt toxic.\n";
        let findings = linter.lint(text);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[1].line, 2);

        let summary = EraLinter::summarize(&findings);
        let therapy = summary
            .iter()
            .find(|(c, _)| *c == EraCategory::TherapySpeak)
            .unwrap();
        assert_eq!(therapy.1, 1);
    }
}
