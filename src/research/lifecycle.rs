//! The research document lifecycle.
//!
//! Pipeline: ingest → classify → distill → promote, with reject reachable
//! from any non-terminal state. The pipeline is the sole owner of the
//! registry; no other component mutates research records.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::collaborator::TextGenerator;
use crate::config::ProjectLayout;
use crate::error::{CanonryResult, GovernanceError, StoreError};

use super::distill::{distillation_prompt, parse_digest, Digest, DISTILL_MAX_TOKENS};
use super::document::{DocumentId, ResearchClass, ResearchDocument, ResearchStatus};

/// Counts of research documents by status and class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResearchStatistics {
    /// Total tracked documents.
    pub total: usize,
    /// Counts keyed by status string.
    pub by_status: BTreeMap<&'static str, usize>,
    /// Counts keyed by class string (classified documents only).
    pub by_class: BTreeMap<&'static str, usize>,
}

/// Manages research documents through the four-class governance pipeline.
///
/// # Usage
///
/// ```no_run
/// use canonry::config::ProjectLayout;
/// use canonry::research::{ResearchClass, ResearchPipeline};
///
/// # fn main() -> canonry::CanonryResult<()> {
/// # let generator: std::sync::Arc<dyn canonry::collaborator::TextGenerator> = unimplemented!();
/// let layout = ProjectLayout::new("/path/to/project");
/// let mut pipeline = ResearchPipeline::open(&layout)?;
///
/// let doc = pipeline.ingest("/path/to/research.md", "bracero program background")?;
/// let id = doc.id.clone();
/// pipeline.classify(&id, ResearchClass::Context, Some("historical"), Some(0.9))?;
/// pipeline.distill(&id, generator.as_ref(), "historical novel, 1954 California")?;
/// pipeline.promote(&id, ResearchClass::Context)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResearchPipeline {
    layout: ProjectLayout,
    registry: BTreeMap<DocumentId, ResearchDocument>,
}

impl ResearchPipeline {
    /// Opens the pipeline, creating the research tree and loading the
    /// registry.
    ///
    /// # Errors
    ///
    /// Fails if directories cannot be created or the registry contains
    /// unknown class/status strings.
    pub fn open(layout: &ProjectLayout) -> CanonryResult<Self> {
        layout.ensure_directories()?;

        let registry_file = layout.registry_file();
        let registry = if registry_file.exists() {
            let raw =
                fs::read_to_string(&registry_file).map_err(|e| StoreError::io(&registry_file, &e))?;
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
                message: format!("{}: {e}", registry_file.display()),
            })?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            layout: layout.clone(),
            registry,
        })
    }

    fn save(&self) -> CanonryResult<()> {
        let registry_file = self.layout.registry_file();
        let json = serde_json::to_string_pretty(&self.registry).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;
        fs::write(&registry_file, json).map_err(|e| StoreError::io(&registry_file, &e))?;
        Ok(())
    }

    fn get_mut(&mut self, id: &DocumentId) -> CanonryResult<&mut ResearchDocument> {
        self.registry
            .get_mut(id)
            .ok_or_else(|| StoreError::DocumentNotFound { id: id.to_string() }.into())
    }

    /// Looks up a document by id.
    #[must_use]
    pub fn document(&self, id: &DocumentId) -> Option<&ResearchDocument> {
        self.registry.get(id)
    }

    /// Step 1: accepts a new document into the intake area.
    ///
    /// Computes a content hash for deduplication; re-ingesting content an
    /// existing non-rejected record already carries is a hard stop, not a
    /// warning.
    ///
    /// # Errors
    ///
    /// - [`StoreError::SourceFileMissing`] if the path does not exist.
    /// - [`StoreError::DuplicateDocument`] on a content-hash collision
    ///   with a non-rejected record.
    pub fn ingest(
        &mut self,
        source_path: impl AsRef<Path>,
        notes: &str,
    ) -> CanonryResult<ResearchDocument> {
        let source_path = source_path.as_ref();
        if !source_path.is_file() {
            return Err(StoreError::SourceFileMissing {
                path: source_path.display().to_string(),
            }
            .into());
        }

        let content = fs::read(source_path).map_err(|e| StoreError::io(source_path, &e))?;
        let file_hash = blake3::hash(&content).to_hex()[..16].to_string();

        if let Some(existing) = self
            .registry
            .values()
            .find(|d| d.file_hash == file_hash && d.status != ResearchStatus::Rejected)
        {
            return Err(StoreError::DuplicateDocument {
                hash: file_hash,
                existing: existing.original_name.clone(),
            }
            .into());
        }

        let original_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let id = self.generate_id(&original_name);

        let extension = source_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let dest = self.layout.intake_dir().join(format!("{id}{extension}"));
        fs::copy(source_path, &dest).map_err(|e| StoreError::io(&dest, &e))?;

        let doc = ResearchDocument {
            id: id.clone(),
            original_name,
            research_class: None,
            subtype: None,
            status: ResearchStatus::Intake,
            confidence: None,
            file_hash,
            raw_path: dest,
            digest_path: None,
            final_path: None,
            notes: notes.to_string(),
            rejection_reason: None,
            ingested_at: Utc::now(),
            classified_at: None,
            distilled_at: None,
            promoted_at: None,
            rejected_at: None,
        };

        self.registry.insert(id.clone(), doc.clone());
        self.save()?;
        info!(id = %id, name = doc.original_name, "research document ingested");
        Ok(doc)
    }

    fn generate_id(&self, filename: &str) -> DocumentId {
        let safe_name: String = filename
            .chars()
            .take(20)
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let base = format!("doc_{safe_name}_{timestamp}");

        // Re-ingesting after a rejection in the same second would collide.
        let mut id = DocumentId::new(base.clone());
        let mut n = 1;
        while self.registry.contains_key(&id) {
            n += 1;
            id = DocumentId::new(format!("{base}_{n}"));
        }
        id
    }

    /// Step 2: records a classification decision.
    ///
    /// Accepted while the document is in intake or already classified
    /// (re-classification before distillation is routine). Does not move
    /// the backing file.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DocumentNotFound`] for an unknown id.
    /// - [`GovernanceError::LifecycleOrder`] once the document has moved
    ///   past classification.
    pub fn classify(
        &mut self,
        id: &DocumentId,
        research_class: ResearchClass,
        subtype: Option<&str>,
        confidence: Option<f32>,
    ) -> CanonryResult<ResearchDocument> {
        let doc = self.get_mut(id)?;
        if !matches!(doc.status, ResearchStatus::Intake | ResearchStatus::Classified) {
            return Err(GovernanceError::LifecycleOrder {
                id: id.to_string(),
                operation: "classify",
                status: doc.status.to_string(),
            }
            .into());
        }

        doc.research_class = Some(research_class);
        doc.subtype = subtype.map(ToString::to_string);
        doc.confidence = confidence.map(|c| c.clamp(0.0, 1.0));
        doc.status = ResearchStatus::Classified;
        doc.classified_at = Some(Utc::now());
        let updated = doc.clone();

        self.save()?;
        info!(id = %id, class = %research_class, "research document classified");
        Ok(updated)
    }

    /// Step 3: extracts a digest through the AI collaborator.
    ///
    /// The prompt is constrained to extraction only: nothing the source
    /// does not contain. A response that fails to parse as the requested
    /// structure is stored verbatim as a raw capture rather than
    /// discarded. Re-distillation of an already-distilled document
    /// replaces the digest.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::LifecycleOrder`] unless the document is
    ///   classified (or distilled, for a re-run).
    /// - [`crate::error::CollaboratorError::Generation`] when the AI call
    ///   itself fails; there is no digest to fall back to then.
    pub fn distill(
        &mut self,
        id: &DocumentId,
        generator: &dyn TextGenerator,
        project_context: &str,
    ) -> CanonryResult<ResearchDocument> {
        let doc = self.get_mut(id)?;
        if !matches!(doc.status, ResearchStatus::Classified | ResearchStatus::Distilled) {
            return Err(GovernanceError::LifecycleOrder {
                id: id.to_string(),
                operation: "distill",
                status: doc.status.to_string(),
            }
            .into());
        }

        let raw = fs::read(&doc.raw_path).map_err(|e| StoreError::io(&doc.raw_path, &e))?;
        let content = String::from_utf8_lossy(&raw);

        let prompt = distillation_prompt(
            &doc.original_name,
            doc.research_class.map(|c| c.as_str()),
            &content,
            project_context,
        );
        let response = generator.generate(&prompt, DISTILL_MAX_TOKENS)?;
        let digest = parse_digest(&response);
        if digest.is_raw() {
            info!(id = %id, "digest response unparseable; keeping raw capture");
        }

        let digest_path = self.layout.digests_dir().join(format!("{id}_digest.json"));
        let json = serde_json::to_string_pretty(&digest).map_err(|e| StoreError::Serialization {
            message: e.to_string(),
        })?;
        fs::write(&digest_path, json).map_err(|e| StoreError::io(&digest_path, &e))?;

        let doc = self.get_mut(id)?;
        doc.digest_path = Some(digest_path);
        doc.status = ResearchStatus::Distilled;
        doc.distilled_at = Some(Utc::now());
        let updated = doc.clone();

        self.save()?;
        info!(id = %id, "research document distilled");
        Ok(updated)
    }

    /// Step 4: human-approved placement into a class area.
    ///
    /// Renders the digest as markdown into the class-designated location,
    /// or copies the raw file when no digest exists. Promoting to Canon
    /// does not populate the fact store; a promoted canon document is a
    /// candidate source of facts, not itself authoritative data.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::LifecycleOrder`] unless the document is
    ///   classified or distilled.
    pub fn promote(
        &mut self,
        id: &DocumentId,
        target_class: ResearchClass,
    ) -> CanonryResult<ResearchDocument> {
        let snapshot = self.get_mut(id)?.clone();
        if !matches!(
            snapshot.status,
            ResearchStatus::Classified | ResearchStatus::Distilled
        ) {
            return Err(GovernanceError::LifecycleOrder {
                id: id.to_string(),
                operation: "promote",
                status: snapshot.status.to_string(),
            }
            .into());
        }

        let mut dest_dir = self.layout.class_dir(target_class);
        if target_class != ResearchClass::Canon {
            if let Some(subtype) = &snapshot.subtype {
                dest_dir = dest_dir.join(subtype);
            }
        }
        fs::create_dir_all(&dest_dir).map_err(|e| StoreError::io(&dest_dir, &e))?;

        let final_path = if let Some(digest_path) = &snapshot.digest_path {
            let raw = fs::read_to_string(digest_path).map_err(|e| StoreError::io(digest_path, &e))?;
            let digest: Digest =
                serde_json::from_str(&raw).map_err(|e| StoreError::Serialization {
                    message: format!("{}: {e}", digest_path.display()),
                })?;
            let path = dest_dir.join(format!("{id}_digest.md"));
            fs::write(&path, digest.render_markdown(&snapshot.original_name))
                .map_err(|e| StoreError::io(&path, &e))?;
            path
        } else {
            let file_name = snapshot
                .raw_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| id.to_string());
            let path = dest_dir.join(file_name);
            fs::copy(&snapshot.raw_path, &path).map_err(|e| StoreError::io(&path, &e))?;
            path
        };

        let doc = self.get_mut(id)?;
        doc.research_class = Some(target_class);
        doc.final_path = Some(final_path);
        doc.status = ResearchStatus::Promoted;
        doc.promoted_at = Some(Utc::now());
        let updated = doc.clone();

        self.save()?;
        info!(id = %id, class = %target_class, "research document promoted");
        Ok(updated)
    }

    /// Rejects a document from any non-terminal state.
    ///
    /// Moves the backing file to the rejected area and stores the reason
    /// verbatim.
    ///
    /// # Errors
    ///
    /// - [`GovernanceError::LifecycleOrder`] if the document is already
    ///   promoted or rejected.
    pub fn reject(&mut self, id: &DocumentId, reason: &str) -> CanonryResult<ResearchDocument> {
        let rejected_dir = self.layout.rejected_dir();
        let doc = self.get_mut(id)?;
        if doc.status.is_terminal() {
            return Err(GovernanceError::LifecycleOrder {
                id: id.to_string(),
                operation: "reject",
                status: doc.status.to_string(),
            }
            .into());
        }

        if doc.raw_path.is_file() {
            let file_name = doc
                .raw_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| id.to_string());
            let dest = rejected_dir.join(file_name);
            fs::rename(&doc.raw_path, &dest).map_err(|e| StoreError::io(&dest, &e))?;
            doc.raw_path = dest;
        }

        doc.status = ResearchStatus::Rejected;
        doc.rejection_reason = Some(reason.to_string());
        doc.rejected_at = Some(Utc::now());
        let updated = doc.clone();

        self.save()?;
        info!(id = %id, reason, "research document rejected");
        Ok(updated)
    }

    /// Documents awaiting classification.
    #[must_use]
    pub fn intake_queue(&self) -> Vec<&ResearchDocument> {
        self.registry
            .values()
            .filter(|d| d.status == ResearchStatus::Intake)
            .collect()
    }

    /// Documents classified or distilled but not yet promoted.
    #[must_use]
    pub fn pending_approval(&self) -> Vec<&ResearchDocument> {
        self.registry
            .values()
            .filter(|d| {
                matches!(d.status, ResearchStatus::Classified | ResearchStatus::Distilled)
            })
            .collect()
    }

    /// Promoted documents of one class.
    #[must_use]
    pub fn documents_by_class(&self, class: ResearchClass) -> Vec<&ResearchDocument> {
        self.registry
            .values()
            .filter(|d| d.status == ResearchStatus::Promoted && d.research_class == Some(class))
            .collect()
    }

    /// Counts by status and class.
    #[must_use]
    pub fn statistics(&self) -> ResearchStatistics {
        let mut stats = ResearchStatistics {
            total: self.registry.len(),
            ..ResearchStatistics::default()
        };
        for doc in self.registry.values() {
            *stats.by_status.entry(doc.status.as_str()).or_default() += 1;
            if let Some(class) = doc.research_class {
                *stats.by_class.entry(class.as_str()).or_default() += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use tempfile::tempdir;

    struct Scripted(&'static str);

    impl TextGenerator for Scripted {
        fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, CollaboratorError> {
            Ok(self.0.to_string())
        }
    }

    fn write_source(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn open_pipeline(dir: &Path) -> ResearchPipeline {
        ResearchPipeline::open(&ProjectLayout::new(dir)).unwrap()
    }

    #[test]
    fn ingest_copies_into_intake_and_registers() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "wetback_notes.md", "Operation background.");
        let mut pipeline = open_pipeline(dir.path());

        let doc = pipeline.ingest(&source, "for chapter 4").unwrap();
        assert_eq!(doc.status, ResearchStatus::Intake);
        assert_eq!(doc.research_class, None);
        assert!(doc.raw_path.starts_with(dir.path().join("research/intake")));
        assert!(doc.raw_path.is_file());
        assert_eq!(doc.notes, "for chapter 4");
        assert_eq!(pipeline.intake_queue().len(), 1);
    }

    #[test]
    fn duplicate_content_is_a_hard_stop() {
        let dir = tempdir().unwrap();
        let source_a = write_source(dir.path(), "a.md", "same bytes");
        let source_b = write_source(dir.path(), "b.md", "same bytes");
        let mut pipeline = open_pipeline(dir.path());

        pipeline.ingest(&source_a, "").unwrap();
        let err = pipeline.ingest(&source_b, "").unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn rejected_content_may_be_reingested() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "a.md", "same bytes");
        let mut pipeline = open_pipeline(dir.path());

        let doc = pipeline.ingest(&source, "").unwrap();
        pipeline.reject(&doc.id, "wrong era entirely").unwrap();

        // First copy was moved to rejected/; same content is ingestable again.
        pipeline.ingest(&source, "second look").unwrap();
    }

    #[test]
    fn ingest_missing_file_fails() {
        let dir = tempdir().unwrap();
        let mut pipeline = open_pipeline(dir.path());
        let err = pipeline.ingest(dir.path().join("ghost.md"), "").unwrap_err();
        assert!(err.is_store());
    }

    #[test]
    fn classify_sets_fields_and_allows_reclassification() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "letter.md", "Dear Tommy");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;

        let doc = pipeline
            .classify(&id, ResearchClass::Context, Some("historical"), Some(0.7))
            .unwrap();
        assert_eq!(doc.status, ResearchStatus::Classified);
        assert_eq!(doc.research_class, Some(ResearchClass::Context));

        let doc = pipeline
            .classify(&id, ResearchClass::Artifact, Some("letters"), Some(0.95))
            .unwrap();
        assert_eq!(doc.research_class, Some(ResearchClass::Artifact));
    }

    #[test]
    fn unknown_document_is_not_found() {
        let dir = tempdir().unwrap();
        let mut pipeline = open_pipeline(dir.path());
        let id = DocumentId::new("doc_ghost");
        assert!(pipeline.classify(&id, ResearchClass::Canon, None, None).unwrap_err().is_not_found());
        assert!(pipeline.reject(&id, "whatever reason").unwrap_err().is_not_found());
    }

    #[test]
    fn distill_requires_classification_first() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "text");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;

        let err = pipeline
            .distill(&id, &Scripted("{}"), "ctx")
            .unwrap_err();
        assert!(err.is_governance());
    }

    #[test]
    fn distill_stores_structured_digest() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "Radio was common in 1954.");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;
        pipeline.classify(&id, ResearchClass::Context, None, None).unwrap();

        let doc = pipeline
            .distill(
                &id,
                &Scripted(r#"{"facts":[],"period_details":["radio was common"]}"#),
                "ctx",
            )
            .unwrap();
        assert_eq!(doc.status, ResearchStatus::Distilled);

        let digest_raw = fs::read_to_string(doc.digest_path.unwrap()).unwrap();
        let digest: Digest = serde_json::from_str(&digest_raw).unwrap();
        assert!(!digest.is_raw());
    }

    #[test]
    fn distill_keeps_unparseable_response_as_raw_capture() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "text");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;
        pipeline.classify(&id, ResearchClass::Context, None, None).unwrap();

        let doc = pipeline
            .distill(&id, &Scripted("I refuse to answer in JSON."), "ctx")
            .unwrap();

        let digest_raw = fs::read_to_string(doc.digest_path.unwrap()).unwrap();
        let digest: Digest = serde_json::from_str(&digest_raw).unwrap();
        assert!(digest.is_raw());
    }

    #[test]
    fn promote_from_intake_fails() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "text");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;

        let err = pipeline.promote(&id, ResearchClass::Context).unwrap_err();
        assert!(err.is_governance());
    }

    #[test]
    fn promote_renders_digest_into_class_area() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "Radio was common.");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;
        pipeline.classify(&id, ResearchClass::Context, None, None).unwrap();
        pipeline
            .distill(&id, &Scripted(r#"{"period_details":["radio was common"]}"#), "ctx")
            .unwrap();

        let doc = pipeline.promote(&id, ResearchClass::Context).unwrap();
        assert_eq!(doc.status, ResearchStatus::Promoted);
        let final_path = doc.final_path.unwrap();
        assert!(final_path.starts_with(dir.path().join("research/context")));
        let rendered = fs::read_to_string(final_path).unwrap();
        assert!(rendered.contains("radio was common"));

        assert_eq!(pipeline.documents_by_class(ResearchClass::Context).len(), 1);
    }

    #[test]
    fn promote_without_digest_copies_raw_file() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "program.md", "CIRCUS PRESENTS");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;
        pipeline
            .classify(&id, ResearchClass::Artifact, Some("programs"), None)
            .unwrap();

        let doc = pipeline.promote(&id, ResearchClass::Artifact).unwrap();
        let final_path = doc.final_path.unwrap();
        assert!(final_path.starts_with(dir.path().join("research/artifacts/programs")));
        assert_eq!(fs::read_to_string(final_path).unwrap(), "CIRCUS PRESENTS");
    }

    #[test]
    fn reject_is_terminal() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "text");
        let mut pipeline = open_pipeline(dir.path());
        let id = pipeline.ingest(&source, "").unwrap().id;

        let doc = pipeline.reject(&id, "not relevant to this book").unwrap();
        assert_eq!(doc.status, ResearchStatus::Rejected);
        assert!(doc.raw_path.starts_with(dir.path().join("research/rejected")));

        let err = pipeline
            .classify(&id, ResearchClass::Canon, None, None)
            .unwrap_err();
        assert!(err.is_governance());
        let err = pipeline.reject(&id, "again for good measure").unwrap_err();
        assert!(err.is_governance());
    }

    #[test]
    fn statistics_count_by_status_and_class() {
        let dir = tempdir().unwrap();
        let a = write_source(dir.path(), "a.md", "alpha");
        let b = write_source(dir.path(), "b.md", "beta");
        let mut pipeline = open_pipeline(dir.path());
        let id_a = pipeline.ingest(&a, "").unwrap().id;
        pipeline.ingest(&b, "").unwrap();
        pipeline.classify(&id_a, ResearchClass::Craft, None, None).unwrap();

        let stats = pipeline.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status.get("intake"), Some(&1));
        assert_eq!(stats.by_status.get("classified"), Some(&1));
        assert_eq!(stats.by_class.get("craft"), Some(&1));
    }

    #[test]
    fn registry_survives_reload() {
        let dir = tempdir().unwrap();
        let source = write_source(dir.path(), "notes.md", "text");
        let id = {
            let mut pipeline = open_pipeline(dir.path());
            let id = pipeline.ingest(&source, "keep me").unwrap().id;
            pipeline.classify(&id, ResearchClass::Craft, Some("style"), Some(0.8)).unwrap();
            id
        };

        let pipeline = open_pipeline(dir.path());
        let doc = pipeline.document(&id).unwrap();
        assert_eq!(doc.status, ResearchStatus::Classified);
        assert_eq!(doc.research_class, Some(ResearchClass::Craft));
        assert_eq!(doc.notes, "keep me");
    }
}
