//! Regression suite over fixture chapters on disk, plus the era linter.

use std::fs;

use tempfile::tempdir;

use canonry::canon::{CanonStore, FactCategory};
use canonry::chapters::{ChapterProvider, DirectoryChapters};
use canonry::config::ProjectLayout;
use canonry::regression::{EraLinter, RegressionChecker, RegressionFinding};

#[test]
fn full_suite_over_directory_chapters() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    layout.ensure_directories().unwrap();

    let mut canon = CanonStore::open(&layout).unwrap();
    canon
        .add_fact("tommy_age", "19", "chapter_01", FactCategory::Characters)
        .unwrap();
    canon
        .add_fact("winter_quarters", "the lot outside Fresno", "chapter_01", FactCategory::Locations)
        .unwrap();
    canon
        .add_fact("route_change", "announced Tuesday", "chapter_02", FactCategory::Timeline)
        .unwrap();
    canon
        .add_fact("ticket_box", "the red ticket box", "chapter_02", FactCategory::Objects)
        .unwrap();

    let chapters_dir = layout.chapters_dir();
    fs::write(
        chapters_dir.join("chapter_01.md"),
        "Tommy was 17 years old when they reached winter quarters.\n\
         The winter quarters smelled of hay.\n",
    )
    .unwrap();
    fs::write(
        chapters_dir.join("chapter_02.md"),
        "The route change came down on Tuesday.\n\
         He kept the key near the ticket box.\n\
         \"Where to next?\"\n\
         \"North.\"\n\
         \"How far?\"\n\
         \"Far enough.\"\n\
         \"And then?\"\n",
    )
    .unwrap();

    let provider = DirectoryChapters::new(&chapters_dir);
    let chapters = provider.chapters().unwrap();
    assert_eq!(chapters.len(), 2);

    let checker = RegressionChecker::new(&canon);
    let report = checker.run_all_checks(&chapters);
    let (counts, total) = report.summary();

    // Age conflict: text says 17, canon says 19, "tommy" is adjacent.
    assert_eq!(counts["character_ages"], 1);
    // Location named twice in chapter one.
    assert_eq!(counts["locations"], 1);
    // "Tuesday" matches the canon timeline value.
    assert_eq!(counts["timeline"], 1);
    // Ticket box introduced in chapter two.
    assert_eq!(counts["object_continuity"], 1);
    // Five quoted lines, no attribution verb anywhere near them.
    assert_eq!(counts["dialogue_attribution"], 1);
    assert_eq!(total, 5);

    let age = &report.checks["character_ages"][0];
    match age {
        RegressionFinding::AgeInconsistency {
            chapter,
            found_age,
            canon_age,
            ..
        } => {
            assert_eq!(chapter, "chapter_01");
            assert_eq!(*found_age, 17);
            assert_eq!(*canon_age, 19);
        }
        other => panic!("unexpected finding: {other:?}"),
    }

    let markdown = report.render_markdown();
    assert!(markdown.contains("Chapters Checked: 2"));
    assert!(markdown.contains("**Total Items for Review: 5**"));
}

#[test]
fn checker_writes_nothing_back() {
    let dir = tempdir().unwrap();
    let layout = ProjectLayout::new(dir.path());
    layout.ensure_directories().unwrap();

    let mut canon = CanonStore::open(&layout).unwrap();
    canon
        .add_fact("tommy_age", "19", "chapter_01", FactCategory::Characters)
        .unwrap();
    let version_before = canon.version();

    let chapter_path = layout.chapters_dir().join("chapter_01.md");
    fs::write(&chapter_path, "Tommy was 17 years old.").unwrap();
    let content_before = fs::read_to_string(&chapter_path).unwrap();

    let provider = DirectoryChapters::new(layout.chapters_dir());
    let checker = RegressionChecker::new(&canon);
    let report = checker.run_all_checks(&provider.chapters().unwrap());
    assert!(!report.checks["character_ages"].is_empty());

    // Advisory only: chapter file and canon version untouched.
    assert_eq!(fs::read_to_string(&chapter_path).unwrap(), content_before);
    assert_eq!(canon.version(), version_before);
}

#[test]
fn era_linter_flags_modern_voice_in_fixture() {
    let linter = EraLinter::new();
    let text = "He wanted closure after the fire.\n\
                \"We'll circle back,\" the manager said.\n\
                It was an awesome show all the same.\n";

    let findings = linter.lint(text);
    assert_eq!(findings.len(), 3);

    let terms: Vec<&str> = findings.iter().map(|f| f.term.as_str()).collect();
    assert!(terms.contains(&"closure"));
    assert!(terms.contains(&"circle back"));
    assert!(terms.contains(&"awesome"));

    // The summary accounts for every finding.
    let summarized: usize = EraLinter::summarize(&findings)
        .into_iter()
        .map(|(_, count)| count)
        .sum();
    assert_eq!(summarized, 3);
}
