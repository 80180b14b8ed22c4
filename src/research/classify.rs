//! Document classification.
//!
//! Classification happens before distillation because the class determines
//! how a document is processed and used. The AI proposes; when it is
//! unavailable or unparseable, a keyword scorer proposes instead; either
//! way the result is a recommendation for a human, never a promotion.

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::collaborator::TextGenerator;
use crate::error::{CanonryResult, CollaboratorError};

use super::document::ResearchClass;

/// How many characters of the document are shown to the classifier.
const PREVIEW_LIMIT: usize = 3000;

/// Result of classifying a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Most likely class.
    pub primary_class: ResearchClass,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Suggested subtype within the class, if any.
    pub subtype: Option<String>,
    /// One-sentence explanation.
    pub reasoning: String,
    /// Second most likely class, if any scored.
    pub alternative_class: Option<ResearchClass>,
    /// Keywords or signals that drove the decision.
    pub key_indicators: Vec<String>,
}

fn keyword_lexicon(class: ResearchClass) -> &'static [&'static str] {
    match class {
        ResearchClass::Canon => &[
            "character", "timeline", "chapter", "bible", "profile", "canon", "must", "rule",
            "constraint", "age:", "born:",
        ],
        ResearchClass::Context => &[
            "history", "historical", "operation", "research", "study", "analysis", "report",
            "conditions", "immigration", "labor",
        ],
        ResearchClass::Artifact => &[
            "letter", "postcard", "dear", "sincerely", "program", "ticket", "stub", "photograph",
            "dated",
        ],
        ResearchClass::Craft => &[
            "style", "writing", "prose", "voice", "technique", "craft", "workflow", "process",
            "draft", "revision",
        ],
    }
}

/// Shape of the JSON a collaborator is asked to return.
#[derive(Debug, Deserialize)]
struct AiClassification {
    primary_class: String,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    alternative_class: Option<String>,
    #[serde(default)]
    key_indicators: Vec<String>,
}

/// Classifies research documents into the four governance classes.
pub struct ResearchClassifier {
    generator: Option<Arc<dyn TextGenerator>>,
    json_block: Regex,
}

impl ResearchClassifier {
    /// Creates a classifier. Without a generator, only the keyword
    /// fallback runs.
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self {
            generator,
            json_block: Regex::new(r"\{[\s\S]*\}").expect("static regex"),
        }
    }

    /// Classifies a document from its filename and content.
    ///
    /// Tries the AI collaborator first; an unparseable response or absent
    /// generator falls back to keyword scoring. The fallback never guesses
    /// silently: a no-signal document comes back as low-confidence
    /// Context with the reasoning saying so.
    ///
    /// # Errors
    ///
    /// Propagates [`CollaboratorError::Generation`] when the AI call
    /// itself fails; there is nothing safe to fall back to in that case
    /// that the keyword scorer would not also report, so the caller
    /// decides whether to retry or use [`Self::classify_by_keywords`].
    pub fn classify(&self, filename: &str, content: &str) -> CanonryResult<ClassificationResult> {
        if let Some(generator) = &self.generator {
            let prompt = classification_prompt(filename, content);
            let response = generator.generate(&prompt, 1000)?;
            match self.parse_ai_response(&response) {
                Ok(result) => return Ok(result),
                Err(err) => {
                    debug!(%err, "AI classification unparseable; using keyword fallback");
                }
            }
        }
        Ok(self.classify_by_keywords(filename, content))
    }

    /// Parses a collaborator's classification JSON.
    fn parse_ai_response(&self, response: &str) -> Result<ClassificationResult, CollaboratorError> {
        let snippet = || response.chars().take(120).collect::<String>();
        let block = self
            .json_block
            .find(response)
            .ok_or_else(|| CollaboratorError::Unparseable { snippet: snippet() })?;
        let parsed: AiClassification =
            serde_json::from_str(block.as_str()).map_err(|_| CollaboratorError::Unparseable {
                snippet: snippet(),
            })?;

        let primary_class = ResearchClass::try_from(parsed.primary_class)
            .map_err(|_| CollaboratorError::Unparseable { snippet: snippet() })?;
        let alternative_class = parsed
            .alternative_class
            .and_then(|c| ResearchClass::try_from(c).ok());

        Ok(ClassificationResult {
            primary_class,
            confidence: parsed.confidence.unwrap_or(0.8).clamp(0.0, 1.0),
            subtype: parsed.subtype,
            reasoning: parsed
                .reasoning
                .unwrap_or_else(|| "AI classification".to_string()),
            alternative_class,
            key_indicators: parsed.key_indicators,
        })
    }

    /// Keyword-scoring fallback classification.
    #[must_use]
    pub fn classify_by_keywords(&self, filename: &str, content: &str) -> ClassificationResult {
        let content_lower = content.to_lowercase();
        let filename_lower = filename.to_lowercase();

        let mut scored: Vec<(ResearchClass, usize, Vec<String>)> = ResearchClass::ALL
            .into_iter()
            .map(|class| {
                let mut indicators = Vec::new();
                for kw in keyword_lexicon(class) {
                    if content_lower.contains(kw) || filename_lower.contains(kw) {
                        indicators.push((*kw).to_string());
                    }
                }
                (class, indicators.len(), indicators)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let total: usize = scored.iter().map(|(_, n, _)| n).sum();
        let (best_class, best_score, indicators) = scored[0].clone();
        let alternative_class = (scored[1].1 > 0).then_some(scored[1].0);

        if best_score == 0 {
            return ClassificationResult {
                primary_class: ResearchClass::Context,
                confidence: 0.3,
                subtype: None,
                reasoning: "No keyword signal; defaulting to context for human review".to_string(),
                alternative_class: None,
                key_indicators: Vec::new(),
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let confidence = (best_score as f32 / total as f32).min(0.95);

        ClassificationResult {
            primary_class: best_class,
            confidence,
            subtype: suggest_subtype(best_class, &content_lower, &filename_lower),
            reasoning: format!("Keyword analysis found {best_score} indicators"),
            alternative_class,
            key_indicators: indicators.into_iter().take(5).collect(),
        }
    }
}

/// Suggests a subtype for a class from document text.
#[must_use]
pub fn suggest_subtype(
    class: ResearchClass,
    content_lower: &str,
    filename_lower: &str,
) -> Option<String> {
    class
        .subtypes()
        .iter()
        .find(|s| content_lower.contains(*s) || filename_lower.contains(*s))
        .map(|s| (*s).to_string())
}

fn classification_prompt(filename: &str, content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_LIMIT).collect();
    if content.chars().count() > PREVIEW_LIMIT {
        preview.push_str("\n\n[... truncated ...]");
    }

    format!(
        r#"You are a research librarian for a long-form fiction project.

TASK: Classify this document into ONE of four research classes.

THE FOUR CLASSES:

1. CANON (novel-bound, sacred)
   - Facts that will appear on the page
   - Timeline dates, character details, relationships
   - Rules governing the novel

2. CONTEXT (background, non-authoritative)
   - Accuracy material NOT directly quoted
   - Background that informs but isn't narrated

3. ARTIFACT (trigger material, scene devices)
   - Documents that exist INSIDE the story world
   - Letters, postcards, ticket stubs, programs

4. CRAFT (meta-guidance, editorial)
   - Material about HOW to write, not WHAT happened
   - Style guides, process documents

DOCUMENT TO CLASSIFY:

Filename: {filename}
Content Preview:
---
{preview}
---

RESPOND IN JSON FORMAT ONLY:
{{
    "primary_class": "canon|context|artifact|craft",
    "confidence": 0.0,
    "subtype": "specific category or null",
    "reasoning": "one sentence explanation",
    "alternative_class": "second most likely class or null",
    "key_indicators": ["indicator1", "indicator2"]
}}

Classify based on HOW this document should be USED, not just what it contains.
"#
    )
}
