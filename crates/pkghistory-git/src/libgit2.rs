use git2::{Commit, Oid, Repository, Revwalk, Sort, Tree};
use pkghistory::{FileIdentity, HistoryError, Result, RevisionId, RevisionSource, Revisions};
use std::path::{Path, PathBuf};

use crate::{backend, lookup_error};

/// Revision source backed by libgit2.
///
/// History follows first parents only. A commit is listed when the file's
/// blob differs from its parent's; the walk ends once it reaches a commit in
/// which the file does not exist, after having seen it.
pub struct LibGit2 {
    repo: Repository,
}

impl LibGit2 {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the repository at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Repository::open(path).map_err(backend)?))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }
}

impl RevisionSource for LibGit2 {
    fn revisions(&self, file: &FileIdentity, branch: &str) -> Result<Revisions<'_>> {
        let head = self
            .repo
            .revparse_single(branch)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(backend)?;

        let mut walk = self.repo.revwalk().map_err(backend)?;
        walk.push(head.id()).map_err(backend)?;
        walk.simplify_first_parent().map_err(backend)?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(backend)?;

        Ok(Box::new(PathHistory {
            repo: &self.repo,
            walk,
            entry: PathBuf::from(file.entry_name()),
            seen: false,
            done: false,
        }))
    }

    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>> {
        let commit = self
            .repo
            .revparse_single(revision.as_str())
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| lookup_error(e, revision.as_str(), file))?;
        let tree = commit.tree().map_err(backend)?;
        let entry = tree
            .get_path(Path::new(&file.entry_name()))
            .map_err(|e| lookup_error(e, revision.as_str(), file))?;
        let blob = entry
            .to_object(&self.repo)
            .and_then(|obj| obj.peel_to_blob())
            .map_err(|e| lookup_error(e, revision.as_str(), file))?;
        Ok(blob.content().to_vec())
    }
}

enum Touch {
    /// The commit changed the file; carries the abbreviated id.
    Changed(String),
    Unchanged,
    /// The file is gone and has been seen before.
    Gone,
}

/// Lazy first-parent walk filtered to commits touching one path.
struct PathHistory<'a> {
    repo: &'a Repository,
    walk: Revwalk<'a>,
    entry: PathBuf,
    seen: bool,
    done: bool,
}

impl PathHistory<'_> {
    fn blob_id(&self, tree: &Tree) -> Result<Option<Oid>> {
        match tree.get_path(&self.entry) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(backend(e)),
        }
    }

    fn touch(&mut self, oid: Oid) -> Result<Touch> {
        let commit = self.repo.find_commit(oid).map_err(backend)?;
        let current = self.blob_id(&commit.tree().map_err(backend)?)?;
        let parent = match commit.parent(0) {
            Ok(parent) => self.blob_id(&parent.tree().map_err(backend)?)?,
            Err(_) => None,
        };

        match current {
            Some(_) => self.seen = true,
            None if self.seen => return Ok(Touch::Gone),
            None => {}
        }

        if current == parent {
            Ok(Touch::Unchanged)
        } else {
            Ok(Touch::Changed(short_id(&commit)?))
        }
    }
}

impl Iterator for PathHistory<'_> {
    type Item = Result<RevisionId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let oid = match self.walk.next()? {
                Ok(oid) => oid,
                Err(e) => {
                    self.done = true;
                    return Some(Err(backend(e)));
                }
            };
            match self.touch(oid) {
                Ok(Touch::Changed(id)) => return Some(Ok(RevisionId::new(id))),
                Ok(Touch::Unchanged) => continue,
                Ok(Touch::Gone) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

fn short_id(commit: &Commit) -> Result<String> {
    let buf = commit.as_object().short_id().map_err(backend)?;
    match buf.as_str() {
        Some(s) => Ok(s.to_string()),
        None => Err(HistoryError::Backend(
            format!("abbreviated id of {} is not UTF-8", commit.id()).into(),
        )),
    }
}
