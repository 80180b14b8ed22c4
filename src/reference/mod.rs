//! Governance-aware reference loading.
//!
//! The loader decides what material the AI may see for a given working
//! context. The context→class inclusion table is the governance policy:
//! it is what keeps background research from being narrated and craft
//! guidance from being treated as in-world fact.
//!
//! - CANON: always loaded where facts matter, never contradicted
//! - CONTEXT: plausibility pressure, never narrated
//! - ARTIFACT: scene triggers only
//! - CRAFT: revision-time scaffolding only

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ProjectLayout;
use crate::error::{CanonryResult, StoreError, ValidationError};
use crate::research::ResearchClass;

/// Context in which reference material is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadContext {
    /// Writing new content.
    Drafting,
    /// Editing existing content.
    Revision,
    /// Checking facts.
    ConsistencyCheck,
    /// Checking voice and prose.
    StyleCheck,
    /// Developing a specific scene.
    SceneDevelopment,
    /// Load everything available.
    Full,
}

impl LoadContext {
    /// All contexts.
    pub const ALL: [Self; 6] = [
        Self::Drafting,
        Self::Revision,
        Self::ConsistencyCheck,
        Self::StyleCheck,
        Self::SceneDevelopment,
        Self::Full,
    ];

    /// The kebab-case string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Revision => "revision",
            Self::ConsistencyCheck => "consistency-check",
            Self::StyleCheck => "style-check",
            Self::SceneDevelopment => "scene-development",
            Self::Full => "full",
        }
    }

    /// The governance inclusion table.
    ///
    /// | context | CANON | CONTEXT | ARTIFACT | CRAFT |
    /// |---|---|---|---|---|
    /// | drafting | ✓ | ✓ | ✗ | ✗ |
    /// | revision | ✓ | ✗ | ✗ | ✓ |
    /// | consistency-check | ✓ | ✓ | ✗ | ✗ |
    /// | style-check | ✗ | ✗ | ✗ | ✓ |
    /// | scene-development | ✓ | ✓ | ✓ | ✗ |
    /// | full | ✓ | ✓ | ✓ | ✓ |
    #[must_use]
    pub const fn includes(&self, class: ResearchClass) -> bool {
        use ResearchClass::{Artifact, Canon, Context, Craft};
        match self {
            Self::Drafting | Self::ConsistencyCheck => matches!(class, Canon | Context),
            Self::Revision => matches!(class, Canon | Craft),
            Self::StyleCheck => matches!(class, Craft),
            Self::SceneDevelopment => matches!(class, Canon | Context | Artifact),
            Self::Full => true,
        }
    }
}

impl fmt::Display for LoadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LoadContext {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drafting" => Ok(Self::Drafting),
            "revision" => Ok(Self::Revision),
            "consistency-check" => Ok(Self::ConsistencyCheck),
            "style-check" => Ok(Self::StyleCheck),
            "scene-development" => Ok(Self::SceneDevelopment),
            "full" => Ok(Self::Full),
            _ => Err(ValidationError::UnknownContext {
                value: s.to_string(),
            }),
        }
    }
}

/// The fixed preamble explaining how each class may be used.
#[must_use]
pub const fn class_header(class: ResearchClass) -> &'static str {
    match class {
        ResearchClass::Canon => {
            "\n# CANON REFERENCE (Authoritative)\n\
             The following facts are ESTABLISHED in the novel. They cannot be contradicted.\n\
             Use these as constraints. If something conflicts with canon, canon wins.\n"
        }
        ResearchClass::Context => {
            "\n# CONTEXTUAL BACKGROUND (Non-Authoritative)\n\
             The following provides historical/cultural context. Use for plausibility checks.\n\
             NEVER narrate this information directly to the reader.\n\
             This is pressure, not content.\n"
        }
        ResearchClass::Artifact => {
            "\n# ARTIFACTS (Scene Triggers)\n\
             The following are in-world documents that can trigger scenes or memories.\n\
             Experience these through character POV. Meaning comes from contrast, not exposition.\n\
             NEVER summarize these generically.\n"
        }
        ResearchClass::Craft => {
            "\n# CRAFT GUIDANCE (Editorial Only)\n\
             The following guides HOW to write, not WHAT to write.\n\
             Apply during revision. Never inject into narrative.\n\
             This is scaffolding, not story material.\n"
        }
    }
}

/// Bundle of loaded reference material.
///
/// Ephemeral: recomputed on every load call, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceBundle {
    /// Canon section (with header), or empty.
    pub canon: String,
    /// Context section (with header), or empty.
    pub context: String,
    /// Artifact section (with header), or empty.
    pub artifacts: String,
    /// Craft section (with header), or empty.
    pub craft: String,
    /// Rough token total after any truncation.
    pub total_estimated_tokens: usize,
    /// Class names that contributed material.
    pub sources_loaded: Vec<&'static str>,
}

impl ReferenceBundle {
    /// Joins the loaded sections into one string for the AI.
    #[must_use]
    pub fn combined(&self) -> String {
        let sections: Vec<&str> = [
            self.canon.as_str(),
            self.context.as_str(),
            self.artifacts.as_str(),
            self.craft.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();

        if sections.is_empty() {
            return "[No reference material loaded for this context]".to_string();
        }
        sections.join("\n\n---\n\n")
    }
}

/// Rough token estimate: one token per four characters.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

fn truncate_to_tokens(text: &str, tokens: usize) -> String {
    text.chars().take(tokens * 4).collect()
}

/// Governance-aware reference loader.
///
/// Pure function of `(context, filters)` over the class storage areas;
/// the loader holds no state beyond the project layout.
#[derive(Debug, Clone)]
pub struct ReferenceLoader {
    layout: ProjectLayout,
}

impl ReferenceLoader {
    /// Creates a loader over the given project layout.
    #[must_use]
    pub const fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    /// Loads reference material appropriate for the given context.
    ///
    /// Included classes are loaded in full and prefixed with their usage
    /// headers. If the estimated token total exceeds `max_tokens`, the
    /// sections are trimmed in fixed priority order: CANON is kept first
    /// (only truncated when it alone exceeds the budget), then CRAFT,
    /// then CONTEXT, and ARTIFACT material is the first to go entirely.
    /// Canon facts must never be silently dropped under token pressure.
    ///
    /// # Errors
    ///
    /// Surfaces filesystem failures from the class areas.
    pub fn load(&self, context: LoadContext, max_tokens: usize) -> CanonryResult<ReferenceBundle> {
        self.load_with_artifacts(context, None, max_tokens)
    }

    /// [`load`](Self::load) with an artifact id filter: when given, only
    /// artifact files whose names contain one of the ids are included.
    pub fn load_with_artifacts(
        &self,
        context: LoadContext,
        artifact_ids: Option<&[&str]>,
        max_tokens: usize,
    ) -> CanonryResult<ReferenceBundle> {
        let mut bundle = ReferenceBundle::default();

        if context.includes(ResearchClass::Canon) {
            let text = self.load_class_dir(ResearchClass::Canon, None)?;
            if !text.is_empty() {
                bundle.canon = format!("{}{text}", class_header(ResearchClass::Canon));
                bundle.sources_loaded.push("canon");
            }
        }
        if context.includes(ResearchClass::Context) {
            let text = self.load_class_dir(ResearchClass::Context, None)?;
            if !text.is_empty() {
                bundle.context = format!("{}{text}", class_header(ResearchClass::Context));
                bundle.sources_loaded.push("context");
            }
        }
        if context.includes(ResearchClass::Artifact) {
            let text = self.load_class_dir(ResearchClass::Artifact, artifact_ids)?;
            if !text.is_empty() {
                bundle.artifacts = format!("{}{text}", class_header(ResearchClass::Artifact));
                bundle.sources_loaded.push("artifacts");
            }
        }
        if context.includes(ResearchClass::Craft) {
            let text = self.load_class_dir(ResearchClass::Craft, None)?;
            if !text.is_empty() {
                bundle.craft = format!("{}{text}", class_header(ResearchClass::Craft));
                bundle.sources_loaded.push("craft");
            }
        }

        let total = estimate_tokens(&bundle.canon)
            + estimate_tokens(&bundle.context)
            + estimate_tokens(&bundle.artifacts)
            + estimate_tokens(&bundle.craft);

        if total > max_tokens {
            self.truncate(&mut bundle, max_tokens);
            bundle.total_estimated_tokens = max_tokens;
        } else {
            bundle.total_estimated_tokens = total;
        }

        debug!(
            context = %context,
            tokens = bundle.total_estimated_tokens,
            sources = ?bundle.sources_loaded,
            "reference bundle assembled"
        );
        Ok(bundle)
    }

    // Priority under pressure: canon, then craft, then context, then
    // artifacts.
    fn truncate(&self, bundle: &mut ReferenceBundle, max_tokens: usize) {
        let mut remaining = max_tokens;

        let canon_tokens = estimate_tokens(&bundle.canon);
        if canon_tokens <= remaining {
            remaining -= canon_tokens;
        } else {
            bundle.canon = truncate_to_tokens(&bundle.canon, remaining);
            remaining = 0;
        }

        if remaining > 0 {
            let craft_tokens = estimate_tokens(&bundle.craft);
            if craft_tokens <= remaining {
                remaining -= craft_tokens;
            } else {
                bundle.craft = truncate_to_tokens(&bundle.craft, remaining);
                remaining = 0;
            }
        } else {
            bundle.craft.clear();
        }

        if remaining > 0 {
            let context_tokens = estimate_tokens(&bundle.context);
            if context_tokens <= remaining {
                remaining -= context_tokens;
            } else {
                bundle.context = truncate_to_tokens(&bundle.context, remaining);
                remaining = 0;
            }
        } else {
            bundle.context.clear();
        }

        if remaining > 0 {
            bundle.artifacts = truncate_to_tokens(&bundle.artifacts, remaining);
        } else {
            bundle.artifacts.clear();
        }
    }

    /// Loads every markdown file under a class area (recursively, so
    /// subtype subdirectories are included), each prefixed with a `##`
    /// section header from its file stem.
    fn load_class_dir(
        &self,
        class: ResearchClass,
        id_filter: Option<&[&str]>,
    ) -> CanonryResult<String> {
        let dir = self.layout.class_dir(class);
        if !dir.exists() {
            return Ok(String::new());
        }

        let mut paths = Vec::new();
        collect_markdown(&dir, &mut paths)?;
        paths.sort();

        let mut sections = Vec::new();
        for path in paths {
            if let Some(ids) = id_filter {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                let matched = name
                    .as_deref()
                    .is_some_and(|n| ids.iter().any(|id| n.contains(id)));
                if !matched {
                    continue;
                }
            }
            let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, &e))?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            sections.push(format!("\n## {stem}\n\n{text}"));
        }

        Ok(sections.join("\n"))
    }
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> CanonryResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, &e))?;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|x| x == "md") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seeded_layout(dir: &Path) -> ProjectLayout {
        let layout = ProjectLayout::new(dir);
        layout.ensure_directories().unwrap();
        fs::write(
            layout.class_dir(ResearchClass::Canon).join("master_reference.md"),
            "Tommy is nineteen.",
        )
        .unwrap();
        fs::write(
            layout.class_dir(ResearchClass::Context).join("bracero.md"),
            "Bracero program background.",
        )
        .unwrap();
        fs::write(
            layout.class_dir(ResearchClass::Artifact).join("doc_a1_digest.md"),
            "A postcard from June.",
        )
        .unwrap();
        fs::write(
            layout.class_dir(ResearchClass::Craft).join("style_charter.md"),
            "Short sentences. No modern slang.",
        )
        .unwrap();
        layout
    }

    #[test]
    fn inclusion_table_is_exact() {
        use LoadContext as C;
        use ResearchClass as R;

        let expected: [(C, [bool; 4]); 6] = [
            (C::Drafting, [true, true, false, false]),
            (C::Revision, [true, false, false, true]),
            (C::ConsistencyCheck, [true, true, false, false]),
            (C::StyleCheck, [false, false, false, true]),
            (C::SceneDevelopment, [true, true, true, false]),
            (C::Full, [true, true, true, true]),
        ];

        for (context, flags) in expected {
            for (class, expected_flag) in
                [R::Canon, R::Context, R::Artifact, R::Craft].into_iter().zip(flags)
            {
                assert_eq!(
                    context.includes(class),
                    expected_flag,
                    "{context} / {class}"
                );
            }
        }
    }

    #[test]
    fn style_check_loads_craft_only() {
        let dir = tempdir().unwrap();
        let loader = ReferenceLoader::new(seeded_layout(dir.path()));

        let bundle = loader.load(LoadContext::StyleCheck, 50_000).unwrap();
        assert!(bundle.canon.is_empty());
        assert!(bundle.context.is_empty());
        assert!(bundle.artifacts.is_empty());
        assert!(bundle.craft.contains("No modern slang"));
        assert_eq!(bundle.sources_loaded, vec!["craft"]);

        let combined = bundle.combined();
        assert!(!combined.contains("Tommy is nineteen"));
        assert!(!combined.contains("Bracero"));
    }

    #[test]
    fn drafting_includes_canon_and_context_with_headers() {
        let dir = tempdir().unwrap();
        let loader = ReferenceLoader::new(seeded_layout(dir.path()));

        let bundle = loader.load(LoadContext::Drafting, 50_000).unwrap();
        assert!(bundle.canon.contains("CANON REFERENCE"));
        assert!(bundle.canon.contains("Tommy is nineteen"));
        assert!(bundle.context.contains("NEVER narrate"));
        assert!(bundle.artifacts.is_empty());
        assert!(bundle.craft.is_empty());
        assert_eq!(bundle.sources_loaded, vec!["canon", "context"]);
    }

    #[test]
    fn artifact_filter_selects_by_id_substring() {
        let dir = tempdir().unwrap();
        let layout = seeded_layout(dir.path());
        fs::write(
            layout.class_dir(ResearchClass::Artifact).join("doc_b2_digest.md"),
            "A ticket stub.",
        )
        .unwrap();
        let loader = ReferenceLoader::new(layout);

        let bundle = loader
            .load_with_artifacts(LoadContext::SceneDevelopment, Some(&["a1"]), 50_000)
            .unwrap();
        assert!(bundle.artifacts.contains("postcard"));
        assert!(!bundle.artifacts.contains("ticket stub"));
    }

    #[test]
    fn subtype_subdirectories_are_loaded() {
        let dir = tempdir().unwrap();
        let layout = seeded_layout(dir.path());
        let nested = layout.class_dir(ResearchClass::Context).join("historical");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("newspapers.md"), "Newspaper tone notes.").unwrap();
        let loader = ReferenceLoader::new(layout);

        let bundle = loader.load(LoadContext::ConsistencyCheck, 50_000).unwrap();
        assert!(bundle.context.contains("## newspapers"));
        assert!(bundle.context.contains("Newspaper tone notes."));
    }

    #[test]
    fn over_budget_drops_artifacts_before_canon() {
        let dir = tempdir().unwrap();
        let layout = seeded_layout(dir.path());
        // Inflate artifacts so the bundle cannot fit.
        fs::write(
            layout.class_dir(ResearchClass::Artifact).join("huge.md"),
            "x".repeat(40_000),
        )
        .unwrap();
        let loader = ReferenceLoader::new(layout);

        let budget = 200;
        let bundle = loader.load(LoadContext::Full, budget).unwrap();
        assert_eq!(bundle.total_estimated_tokens, budget);
        // Canon survives intact; artifacts are the casualty.
        assert!(bundle.canon.contains("Tommy is nineteen"));
        assert!(estimate_tokens(&bundle.canon) <= budget);
        assert!(bundle.artifacts.is_empty() || estimate_tokens(&bundle.artifacts) < 40_000 / 4);
    }

    #[test]
    fn canon_alone_over_budget_is_truncated_not_dropped() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_directories().unwrap();
        fs::write(
            layout.class_dir(ResearchClass::Canon).join("huge_canon.md"),
            "c".repeat(10_000),
        )
        .unwrap();
        let loader = ReferenceLoader::new(layout);

        let bundle = loader.load(LoadContext::Drafting, 100).unwrap();
        assert!(!bundle.canon.is_empty());
        assert!(estimate_tokens(&bundle.canon) <= 100);
    }

    #[test]
    fn empty_bundle_has_placeholder_combination() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::new(dir.path());
        layout.ensure_directories().unwrap();
        let loader = ReferenceLoader::new(layout);

        let bundle = loader.load(LoadContext::Drafting, 1000).unwrap();
        assert!(bundle.sources_loaded.is_empty());
        assert!(bundle.combined().contains("No reference material"));
    }

    #[test]
    fn context_strings_round_trip() {
        for context in LoadContext::ALL {
            let parsed: LoadContext = context.as_str().parse().unwrap();
            assert_eq!(parsed, context);
        }
        assert!("editing".parse::<LoadContext>().is_err());
    }
}
