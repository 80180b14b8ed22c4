//! Chapter storage boundary.
//!
//! Chapter content is owned by an external collaborator (editor, file
//! tree, export pipeline). The engine only needs `{chapter_id, text}`
//! pairs in a stable order; [`DirectoryChapters`] is the default
//! file-backed implementation.

use std::fs;
use std::path::PathBuf;

use crate::error::{CanonryResult, StoreError};

/// One chapter's identity and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterText {
    /// Stable chapter identifier (file stem for directory-backed storage).
    pub chapter_id: String,
    /// Full chapter text.
    pub text: String,
}

/// Enumerates chapters in a stable order.
pub trait ChapterProvider: Send + Sync {
    /// All chapters, in stable order.
    ///
    /// # Errors
    ///
    /// Implementations surface their own storage failures.
    fn chapters(&self) -> CanonryResult<Vec<ChapterText>>;
}

/// Directory-backed chapter storage.
///
/// Loads `*.md` files in sorted order, then `*.txt` files in sorted
/// order, using the file stem as the chapter id. A missing directory
/// yields an empty set rather than an error; a project with no chapters
/// yet is not a failure.
#[derive(Debug, Clone)]
pub struct DirectoryChapters {
    dir: PathBuf,
}

impl DirectoryChapters {
    /// Creates a provider reading from the given directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn load_with_extension(&self, ext: &str, out: &mut Vec<ChapterText>) -> CanonryResult<()> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, &e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == ext))
            .collect();
        paths.sort();

        for path in paths {
            let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, &e))?;
            let chapter_id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.push(ChapterText { chapter_id, text });
        }
        Ok(())
    }
}

impl ChapterProvider for DirectoryChapters {
    fn chapters(&self) -> CanonryResult<Vec<ChapterText>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut chapters = Vec::new();
        self.load_with_extension("md", &mut chapters)?;
        self.load_with_extension("txt", &mut chapters)?;
        Ok(chapters)
    }
}
