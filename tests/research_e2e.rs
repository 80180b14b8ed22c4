//! End-to-end research lifecycle: ingest through promotion, and the
//! governed loader honoring class boundaries on the promoted material.

use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use canonry::collaborator::TextGenerator;
use canonry::config::ProjectLayout;
use canonry::error::CollaboratorError;
use canonry::reference::{LoadContext, ReferenceLoader};
use canonry::research::{ResearchClass, ResearchPipeline, ResearchStatus};

struct Scripted(&'static str);

impl TextGenerator for Scripted {
    fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CollaboratorError> {
        Ok(self.0.to_string())
    }
}

#[test]
fn ingest_distill_promote_then_loader_governs_visibility() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = ResearchPipeline::open(&layout).unwrap();

    let source = dir.path().join("period_notes.md");
    fs::write(&source, "Radios were everywhere by then.").unwrap();

    // ingest → classify → distill (scripted collaborator) → promote
    let doc = pipeline.ingest(&source, "period texture").unwrap();
    let id = doc.id.clone();
    pipeline
        .classify(&id, ResearchClass::Context, Some("historical"), Some(0.85))
        .unwrap();

    let generator: Arc<dyn TextGenerator> =
        Arc::new(Scripted(r#"{"facts":[],"period_details":["radio was common"]}"#));
    pipeline
        .distill(&id, generator.as_ref(), "historical fiction, mid-1950s")
        .unwrap();

    let doc = pipeline.promote(&id, ResearchClass::Context).unwrap();
    assert_eq!(doc.status, ResearchStatus::Promoted);

    // Drafting includes context material; style-check must not see it.
    let loader = ReferenceLoader::new(layout);
    let drafting = loader.load(LoadContext::Drafting, 50_000).unwrap();
    assert!(drafting.context.contains("radio was common"));

    let style = loader.load(LoadContext::StyleCheck, 50_000).unwrap();
    assert!(style.context.is_empty());
    assert!(!style.combined().contains("radio was common"));
}

#[test]
fn duplicate_ingest_fails_unless_first_was_rejected() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = ResearchPipeline::open(&layout).unwrap();

    let source = dir.path().join("clipping.md");
    fs::write(&source, "The same newspaper clipping.").unwrap();

    let doc = pipeline.ingest(&source, "").unwrap();

    // Identical content, different filename: still a duplicate.
    let twin = dir.path().join("clipping_copy.md");
    fs::write(&twin, "The same newspaper clipping.").unwrap();
    let err = pipeline.ingest(&twin, "").unwrap_err();
    assert!(err.is_duplicate());

    // After rejection the content may come back.
    pipeline.reject(&doc.id, "scan quality too poor").unwrap();
    let again = pipeline.ingest(&twin, "better scan").unwrap();
    assert_eq!(again.status, ResearchStatus::Intake);
}

#[test]
fn promotion_requires_classification_first() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = ResearchPipeline::open(&layout).unwrap();

    let source = dir.path().join("notes.md");
    fs::write(&source, "raw intake material").unwrap();
    let doc = pipeline.ingest(&source, "").unwrap();

    // Straight from intake: refused.
    let err = pipeline.promote(&doc.id, ResearchClass::Canon).unwrap_err();
    assert!(err.is_governance());

    // And distillation is refused before classification too.
    let generator = Scripted("{}");
    let err = pipeline.distill(&doc.id, &generator, "ctx").unwrap_err();
    assert!(err.is_governance());
}

#[test]
fn unparseable_distillation_is_captured_not_lost() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut pipeline = ResearchPipeline::open(&layout).unwrap();

    let source = dir.path().join("essay.md");
    fs::write(&source, "A long essay on tent rigging.").unwrap();
    let doc = pipeline.ingest(&source, "").unwrap();
    let id = doc.id.clone();
    pipeline.classify(&id, ResearchClass::Context, None, None).unwrap();

    let generator = Scripted("The rigging used manila rope and muscle.");
    let doc = pipeline.distill(&id, &generator, "ctx").unwrap();
    assert_eq!(doc.status, ResearchStatus::Distilled);

    // Promotion renders the raw capture into the class area verbatim.
    let doc = pipeline.promote(&id, ResearchClass::Context).unwrap();
    let rendered = fs::read_to_string(doc.final_path.unwrap()).unwrap();
    assert!(rendered.contains("manila rope"));
}
