//! Where revisions and their contents come from.

use std::cell::Cell;

use crate::error::{HistoryError, Result};
use crate::types::{FileIdentity, RevisionId};

/// Lazy, newest-first stream of revisions.
///
/// Dropping it releases whatever backs the stream, even mid-way.
pub type Revisions<'a> = Box<dyn Iterator<Item = Result<RevisionId>> + 'a>;

/// A version-controlled repository that can answer history questions about
/// one file.
pub trait RevisionSource {
    /// Revisions that changed `file` on `branch`, newest first.
    fn revisions(&self, file: &FileIdentity, branch: &str) -> Result<Revisions<'_>>;

    /// Exact content of `file` at `revision`.
    ///
    /// Returns [`HistoryError::NotFound`] when the file does not exist there.
    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>>;
}

impl<S: RevisionSource + ?Sized> RevisionSource for &S {
    fn revisions(&self, file: &FileIdentity, branch: &str) -> Result<Revisions<'_>> {
        (**self).revisions(file, branch)
    }

    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>> {
        (**self).contents_at(file, revision)
    }
}

impl<S: RevisionSource + ?Sized> RevisionSource for Box<S> {
    fn revisions(&self, file: &FileIdentity, branch: &str) -> Result<Revisions<'_>> {
        (**self).revisions(file, branch)
    }

    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>> {
        (**self).contents_at(file, revision)
    }
}

// ============================================================================
// In-memory history
// ============================================================================

/// A recorded history of one file, newest revision first.
///
/// Ignores the file identity and branch it is asked about. Useful for
/// replaying history captured elsewhere and for tests.
///
/// ```
/// use pkghistory::{FileIdentity, MemoryHistory, RevisionId, RevisionSource};
///
/// let history = MemoryHistory::new()
///     .with_revision("b2", r#"{"name":"foo","version":"2.0"}"#)
///     .with_revision("a1", r#"{"name":"foo","version":"1.0"}"#);
///
/// let file = FileIdentity::new("/repo", "foo.json");
/// let revs: Vec<_> = history
///     .revisions(&file, "main")
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(revs, vec![RevisionId::new("b2"), RevisionId::new("a1")]);
/// assert_eq!(history.fetch_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryHistory {
    revisions: Vec<(RevisionId, Option<Vec<u8>>)>,
    fail_after: Option<usize>,
    fetches: Cell<usize>,
    listed: Cell<usize>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an older revision holding `contents`.
    pub fn with_revision(mut self, id: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.revisions
            .push((RevisionId::new(id), Some(contents.into())));
        self
    }

    /// Append an older revision in which the file does not exist.
    pub fn with_missing(mut self, id: impl Into<String>) -> Self {
        self.revisions.push((RevisionId::new(id), None));
        self
    }

    /// Make enumeration fail after yielding `count` revisions.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    /// Number of [`RevisionSource::contents_at`] calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    /// Number of revisions handed out by [`RevisionSource::revisions`] so far.
    pub fn listed_count(&self) -> usize {
        self.listed.get()
    }
}

impl RevisionSource for MemoryHistory {
    fn revisions(&self, _file: &FileIdentity, branch: &str) -> Result<Revisions<'_>> {
        let limit = self.fail_after;
        let branch = branch.to_string();
        let iter = self
            .revisions
            .iter()
            .map(|(id, _)| id.clone())
            .enumerate()
            .map(move |(index, id)| match limit {
                Some(n) if index >= n => Err(HistoryError::Command {
                    command: format!("rev-list {}", branch),
                    status: "exit status: 128".to_string(),
                    stderr: "history unavailable".to_string(),
                }),
                _ => Ok(id),
            })
            .inspect(|_| self.listed.set(self.listed.get() + 1));
        Ok(Box::new(iter))
    }

    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>> {
        self.fetches.set(self.fetches.get() + 1);
        let not_found = || HistoryError::NotFound {
            revision: revision.to_string(),
            path: file.entry().to_path_buf(),
        };
        self.revisions
            .iter()
            .find(|(id, _)| id == revision)
            .ok_or_else(not_found)?
            .1
            .clone()
            .ok_or_else(not_found)
    }
}
