//! End-to-end governance scenarios: canon facts and chapter locks working
//! against real on-disk state.

use tempfile::tempdir;

use canonry::canon::{CanonStore, FactCategory};
use canonry::config::ProjectLayout;
use canonry::lock::{ChapterLocks, ChapterState};
use canonry::severity::Severity;

#[test]
fn canon_fact_flags_conflicting_chapter_text() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut canon = CanonStore::open(&layout).unwrap();

    canon
        .add_fact("tommy_age", "19", "Chapter 1", FactCategory::Facts)
        .unwrap();

    let findings = canon.validate_against_canon("Tommy, who was 17, walked in.");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].fact_key, "tommy_age");
    assert_eq!(findings[0].canon_value, "19");
    assert_eq!(findings[0].severity, Severity::Warning);
    assert!(findings[0].message.contains("'19'"));
}

#[test]
fn lock_then_invalid_edit_then_audited_unlock() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut locks = ChapterLocks::open(&layout).unwrap();

    locks
        .set_state(
            "ch5",
            ChapterState::CanonLocked,
            Some("finalized for beta readers"),
            "author",
        )
        .unwrap();

    // Any set_state out of canon_locked is rejected with the unlock hint.
    let err = locks.set_state("ch5", ChapterState::Draft, None, "author").unwrap_err();
    assert!(err.is_governance());
    assert!(err.to_string().contains("unlock"));

    // A 15-character reason passes the 10-character floor.
    let record = locks.unlock("ch5", "fixing typo now", "author").unwrap();
    assert_eq!(record.state, ChapterState::Revised);
    assert_eq!(record.unlock_history.len(), 1);

    // The durable audit log saw it too.
    let audit = locks.audit().read_all().unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].chapter_id, "ch5");
    assert_eq!(audit[0].reason, "fixing typo now");
}

#[test]
fn valid_sequences_end_at_published_and_stay_there() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut locks = ChapterLocks::open(&layout).unwrap();

    // draft → revised → canon_locked → (unlock) revised → published
    locks.set_state("ch1", ChapterState::Revised, None, "author").unwrap();
    locks
        .set_state("ch1", ChapterState::CanonLocked, Some("first freeze"), "author")
        .unwrap();
    locks.unlock("ch1", "late continuity fix", "author").unwrap();
    locks
        .set_state("ch1", ChapterState::Published, Some("went to print"), "author")
        .unwrap();

    for target in [
        ChapterState::Draft,
        ChapterState::Revised,
        ChapterState::CanonLocked,
        ChapterState::Published,
    ] {
        assert!(
            locks
                .set_state("ch1", target, Some("should not matter"), "author")
                .is_err(),
            "published chapter accepted a transition to {target}"
        );
    }
    assert!(locks.unlock("ch1", "not even with a reason", "author").is_err());
    assert!(!locks.is_editable("ch1"));
}

#[test]
fn unlock_never_lands_in_draft() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let mut locks = ChapterLocks::open(&layout).unwrap();

    // Two revision passes before locking; unlock must preserve them.
    locks.set_state("ch2", ChapterState::Revised, None, "author").unwrap();
    locks.set_state("ch2", ChapterState::Draft, None, "author").unwrap();
    locks.set_state("ch2", ChapterState::Revised, None, "author").unwrap();
    locks
        .set_state("ch2", ChapterState::CanonLocked, Some("ready for readers"), "author")
        .unwrap();

    let record = locks.unlock("ch2", "reworking the ending scene", "author").unwrap();
    assert_eq!(record.state, ChapterState::Revised);
    assert_eq!(record.revision_count, 3);
}

#[test]
fn fact_versioning_is_monotonic_across_reloads() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());

    {
        let mut canon = CanonStore::open(&layout).unwrap();
        canon
            .add_fact("jenny_age", "22", "Chapter 1", FactCategory::Characters)
            .unwrap();
        canon
            .add_fact("tommy_age", "19", "Chapter 1", FactCategory::Characters)
            .unwrap();
        assert_eq!(canon.version().to_string(), "1.0.2");

        let updated = canon
            .update_fact(
                "tommy_age",
                "20",
                "birthday in chapter seven",
                &["Chapter 7".to_string()],
                FactCategory::Characters,
            )
            .unwrap();
        assert_eq!(canon.version().to_string(), "1.1.0");
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].old_value, "19");
    }

    // Reload: version and history persist; another update keeps climbing.
    let mut canon = CanonStore::open(&layout).unwrap();
    assert_eq!(canon.version().to_string(), "1.1.0");
    let updated = canon
        .update_fact(
            "tommy_age",
            "21",
            "timeline shifted a year",
            &["Chapter 7".to_string(), "Chapter 9".to_string()],
            FactCategory::Characters,
        )
        .unwrap();
    assert_eq!(canon.version().to_string(), "1.2.0");
    assert_eq!(updated.history.len(), 2);
    assert_eq!(updated.history[1].old_value, "20");
}
