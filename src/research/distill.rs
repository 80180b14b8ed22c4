//! Distillation: constrained extraction of structured material.
//!
//! The extraction contract is strict: only facts, constraints, period
//! details, and quotes that appear in the source document. The AI never
//! supplements from outside knowledge. A response that cannot be parsed
//! as the requested structure is kept verbatim as a raw capture; bad
//! structure is not a reason to discard work.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// How many characters of the source document go into the prompt.
const CONTENT_LIMIT: usize = 15_000;

/// Token budget handed to the collaborator for a distillation call.
pub const DISTILL_MAX_TOKENS: u32 = 3000;

/// A distilled digest.
///
/// Untagged on the wire: a structured digest is the plain four-key
/// object, a raw capture is `{"raw_response": ...}`. `RawCapture` is
/// listed first so its required field disambiguates; every field of
/// `Structured` is defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Digest {
    /// Fallback: the collaborator's response, kept verbatim.
    RawCapture {
        /// The unparsed response text.
        raw_response: String,
    },
    /// The structured extraction the prompt asks for.
    Structured {
        /// Specific verifiable facts with dates/names.
        #[serde(default)]
        facts: Vec<String>,
        /// Rules the narrative must follow.
        #[serde(default)]
        constraints: Vec<String>,
        /// Authentic texture details.
        #[serde(default)]
        period_details: Vec<String>,
        /// Direct quotes usable for dialogue or narration.
        #[serde(default)]
        quotes: Vec<String>,
    },
}

impl Digest {
    /// True if this digest fell back to a raw capture.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Self::RawCapture { .. })
    }

    /// Renders the digest as markdown, the form promotion writes into a
    /// class area.
    #[must_use]
    pub fn render_markdown(&self, title: &str) -> String {
        let mut out = format!("## {title}\n");
        match self {
            Self::Structured {
                facts,
                constraints,
                period_details,
                quotes,
            } => {
                for (heading, items) in [
                    ("Facts", facts),
                    ("Constraints", constraints),
                    ("Period Details", period_details),
                    ("Quotes", quotes),
                ] {
                    if items.is_empty() {
                        continue;
                    }
                    out.push_str(&format!("\n### {heading}\n\n"));
                    for item in items {
                        out.push_str(&format!("- {item}\n"));
                    }
                }
            }
            Self::RawCapture { raw_response } => {
                out.push_str("\n### Unstructured Extraction\n\n");
                out.push_str(raw_response);
                out.push('\n');
            }
        }
        out
    }
}

/// Builds the constrained extraction prompt for one document.
#[must_use]
pub fn distillation_prompt(
    title: &str,
    research_class: Option<&str>,
    content: &str,
    project_context: &str,
) -> String {
    let mut body: String = content.chars().take(CONTENT_LIMIT).collect();
    if content.chars().count() > CONTENT_LIMIT {
        body.push_str("\n\n[... truncated ...]");
    }

    format!(
        r#"You are extracting research for a long-form fiction project.

RULES - YOU MUST FOLLOW THESE EXACTLY:
1. Extract ONLY facts that appear in this document
2. Do NOT add any information not present
3. Do NOT speculate or fill gaps
4. Do NOT search for additional information
5. Focus on: dates, names, locations, period details, constraints

Document Title: {title}
Research Class: {class}

Project Context: {project_context}

DOCUMENT CONTENT:
{body}

Please extract:
1. FACTS: Specific verifiable facts with dates/names
2. CONSTRAINTS: Rules the narrative must follow
3. PERIOD DETAILS: Authentic texture (slang, prices, technology)
4. USABLE QUOTES: Direct quotes that could inform dialogue or narration

Format as JSON with these keys: facts, constraints, period_details, quotes
"#,
        class = research_class.unwrap_or("unclassified"),
    )
}

/// Parses a collaborator response into a digest.
///
/// Looks for the first JSON object in the response and accepts it only
/// when it carries at least one of the four extraction keys; anything
/// else becomes a [`Digest::RawCapture`] of the whole response.
#[must_use]
pub fn parse_digest(response: &str) -> Digest {
    let json_block = Regex::new(r"\{[\s\S]*\}").expect("static regex");

    if let Some(block) = json_block.find(response) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(block.as_str()) {
            let has_known_key = ["facts", "constraints", "period_details", "quotes"]
                .iter()
                .any(|k| value.get(k).is_some());
            if has_known_key {
                if let Ok(digest) = serde_json::from_value::<Digest>(value) {
                    return digest;
                }
            }
        }
    }

    Digest::RawCapture {
        raw_response: response.to_string(),
    }
}
