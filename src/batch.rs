//! Batch chapter review.
//!
//! Reviews run sequentially, one AI call per chapter, to avoid rate-limit
//! contention with the external collaborator. Progress surfaces either
//! through a callback (synchronous [`BatchReviewer::run`]) or through a
//! bounded event stream fed by a single worker thread
//! ([`ReviewSession::spawn`]) with cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chapters::ChapterText;
use crate::collaborator::TextGenerator;
use crate::error::{CanonryError, CanonryResult};
use crate::reference::{LoadContext, ReferenceLoader};

/// Token budget for a single chapter review response.
const REVIEW_MAX_TOKENS: u32 = 2000;

/// What a batch run reviews for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    /// Factual consistency against canon.
    Consistency,
    /// Voice and prose quality.
    Prose,
    /// Period accuracy.
    Historical,
    /// All of the above.
    Full,
}

impl ReviewKind {
    /// The reference-loading context this review is governed by.
    ///
    /// Prose review sees craft material only; consistency and historical
    /// review see canon plus context; a full review sees everything.
    #[must_use]
    pub const fn load_context(&self) -> LoadContext {
        match self {
            Self::Consistency | Self::Historical => LoadContext::ConsistencyCheck,
            Self::Prose => LoadContext::StyleCheck,
            Self::Full => LoadContext::Full,
        }
    }

    const fn instructions(&self) -> &'static str {
        match self {
            Self::Consistency => {
                "Check this chapter against the reference material for factual \
                 consistency. List every statement that conflicts with canon, citing \
                 the canon fact it conflicts with. Do not rewrite anything."
            }
            Self::Prose => {
                "Review the prose of this chapter against the craft guidance. Note \
                 voice breaks, pacing problems, and weak passages. Do not rewrite \
                 anything."
            }
            Self::Historical => {
                "Review this chapter for period accuracy using the reference \
                 material. Flag details that feel anachronistic or implausible for \
                 the period. Do not rewrite anything."
            }
            Self::Full => {
                "Review this chapter for factual consistency with canon, period \
                 accuracy, and prose quality, in that order. List findings under \
                 those three headings. Do not rewrite anything."
            }
        }
    }
}

/// Outcome of reviewing one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// The collaborator returned a review.
    Completed,
    /// The collaborator call failed; the error is recorded.
    Failed,
    /// The run was cancelled before this chapter was reached.
    Skipped,
}

/// Review result for a single chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterReview {
    /// Chapter reviewed.
    pub chapter_id: String,
    /// What was reviewed for.
    pub kind: ReviewKind,
    /// Outcome.
    pub status: ReviewStatus,
    /// The collaborator's review text, when completed.
    pub review_text: String,
    /// The failure message, when failed.
    pub error: Option<String>,
    /// When the review finished (or was skipped).
    pub reviewed_at: DateTime<Utc>,
}

/// Aggregated result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// What was reviewed for.
    pub kind: ReviewKind,
    /// Chapters completed.
    pub completed: usize,
    /// Chapters whose review call failed.
    pub failed: usize,
    /// Chapters skipped after cancellation.
    pub skipped: usize,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Per-chapter results, in run order.
    pub reviews: Vec<ChapterReview>,
}

/// Progress events emitted during a batch run.
#[derive(Debug, Clone)]
pub enum ReviewProgress {
    /// A chapter review is starting. `index` is 0-based.
    Started {
        /// Chapter being reviewed.
        chapter_id: String,
        /// Position in the run.
        index: usize,
        /// Total chapters in the run.
        total: usize,
    },
    /// A chapter review finished (completed or failed).
    ChapterDone(ChapterReview),
    /// The run observed the cancel flag and is stopping.
    Cancelled,
    /// The run finished; counts mirror the final report.
    Finished {
        /// Chapters completed.
        completed: usize,
        /// Chapters failed.
        failed: usize,
        /// Chapters skipped.
        skipped: usize,
    },
}

/// Sequential chapter reviewer.
pub struct BatchReviewer {
    generator: Arc<dyn TextGenerator>,
    loader: ReferenceLoader,
}

impl BatchReviewer {
    /// Creates a reviewer over a generator and a governed loader.
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, loader: ReferenceLoader) -> Self {
        Self { generator, loader }
    }

    /// Reviews chapters sequentially, reporting progress through the
    /// callback.
    ///
    /// A failed collaborator call is captured on that chapter's record
    /// and the run continues; the report tallies failures. The reference
    /// bundle is assembled once for the whole run under the given budget.
    ///
    /// # Errors
    ///
    /// Fails only when the reference bundle cannot be assembled.
    pub fn run(
        &self,
        chapters: &[ChapterText],
        kind: ReviewKind,
        reference_token_budget: usize,
        mut on_progress: impl FnMut(&ReviewProgress),
    ) -> CanonryResult<BatchReport> {
        self.run_inner(chapters, kind, reference_token_budget, None, &mut on_progress)
    }

    fn run_inner(
        &self,
        chapters: &[ChapterText],
        kind: ReviewKind,
        reference_token_budget: usize,
        cancel: Option<&AtomicBool>,
        on_progress: &mut dyn FnMut(&ReviewProgress),
    ) -> CanonryResult<BatchReport> {
        let started_at = Utc::now();
        let bundle = self.loader.load(kind.load_context(), reference_token_budget)?;
        let reference = bundle.combined();

        let mut reviews = Vec::with_capacity(chapters.len());
        let mut cancelled = false;

        for (index, chapter) in chapters.iter().enumerate() {
            if !cancelled && cancel.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                cancelled = true;
                on_progress(&ReviewProgress::Cancelled);
            }
            if cancelled {
                reviews.push(ChapterReview {
                    chapter_id: chapter.chapter_id.clone(),
                    kind,
                    status: ReviewStatus::Skipped,
                    review_text: String::new(),
                    error: None,
                    reviewed_at: Utc::now(),
                });
                continue;
            }

            on_progress(&ReviewProgress::Started {
                chapter_id: chapter.chapter_id.clone(),
                index,
                total: chapters.len(),
            });

            let prompt = format!(
                "{reference}\n\n---\n\n{instructions}\n\nCHAPTER: {chapter_id}\n\n{text}",
                instructions = kind.instructions(),
                chapter_id = chapter.chapter_id,
                text = chapter.text,
            );

            let review = match self.generator.generate(&prompt, REVIEW_MAX_TOKENS) {
                Ok(text) => ChapterReview {
                    chapter_id: chapter.chapter_id.clone(),
                    kind,
                    status: ReviewStatus::Completed,
                    review_text: text,
                    error: None,
                    reviewed_at: Utc::now(),
                },
                Err(err) => {
                    warn!(chapter_id = chapter.chapter_id, %err, "chapter review failed");
                    ChapterReview {
                        chapter_id: chapter.chapter_id.clone(),
                        kind,
                        status: ReviewStatus::Failed,
                        review_text: String::new(),
                        error: Some(err.to_string()),
                        reviewed_at: Utc::now(),
                    }
                }
            };

            on_progress(&ReviewProgress::ChapterDone(review.clone()));
            reviews.push(review);
        }

        let count = |status: ReviewStatus| reviews.iter().filter(|r| r.status == status).count();
        let report = BatchReport {
            kind,
            completed: count(ReviewStatus::Completed),
            failed: count(ReviewStatus::Failed),
            skipped: count(ReviewStatus::Skipped),
            started_at,
            finished_at: Utc::now(),
            reviews,
        };

        on_progress(&ReviewProgress::Finished {
            completed: report.completed,
            failed: report.failed,
            skipped: report.skipped,
        });
        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "batch review finished"
        );
        Ok(report)
    }
}

/// A receiver for [`ReviewProgress`] events from a running session.
#[derive(Debug)]
pub struct ReviewStream {
    rx: Receiver<ReviewProgress>,
}

impl ReviewStream {
    /// Receives the next event, blocking. `None` once the worker is done
    /// and the channel drained.
    #[must_use]
    pub fn recv(&self) -> Option<ReviewProgress> {
        self.rx.recv().ok()
    }

    /// Receives the next event with a timeout. `None` on timeout or when
    /// the worker is done.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ReviewProgress> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// A batch review running on its own worker thread.
///
/// Chapters are still processed sequentially inside the worker; the
/// thread exists so a caller can drain progress while the run is in
/// flight and cancel it cooperatively.
pub struct ReviewSession {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<CanonryResult<BatchReport>>,
}

impl ReviewSession {
    /// Spawns a worker for the given chapters and returns the session
    /// plus its event stream.
    #[must_use]
    pub fn spawn(
        generator: Arc<dyn TextGenerator>,
        loader: ReferenceLoader,
        chapters: Vec<ChapterText>,
        kind: ReviewKind,
        reference_token_budget: usize,
    ) -> (Self, ReviewStream) {
        // One slot per chapter plus start/finish bookkeeping keeps the
        // worker from blocking on a slow consumer in the common case.
        let capacity = chapters.len() * 2 + 2;
        let (tx, rx): (Sender<ReviewProgress>, Receiver<ReviewProgress>) = bounded(capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);

        let handle = std::thread::spawn(move || {
            let reviewer = BatchReviewer::new(generator, loader);
            reviewer.run_inner(&chapters, kind, reference_token_budget, Some(&cancel_flag), &mut |event| {
                let _ = tx.send(event.clone());
            })
        });

        (Self { cancel, handle }, ReviewStream { rx })
    }

    /// Requests cancellation. Chapters not yet started are skipped.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Waits for the worker and returns its report.
    ///
    /// # Errors
    ///
    /// Propagates the worker's error, or an internal error if the worker
    /// panicked.
    pub fn join(self) -> CanonryResult<BatchReport> {
        self.handle
            .join()
            .map_err(|_| CanonryError::internal("review worker panicked"))?
    }
}
