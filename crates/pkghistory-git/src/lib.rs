#![doc = include_str!("../README.md")]

use git2::{ErrorCode, Repository};
use pkghistory::{FileIdentity, HistoryError, Result};
use std::path::{Path, PathBuf};

mod command;
mod libgit2;

pub use command::GitCommand;
pub use libgit2::LibGit2;

// ============================================================================
// Discovery
// ============================================================================

/// Find the repository containing `path` and describe `path` relative to it.
///
/// The file itself need not exist in the working tree; it may have been
/// deleted and still have history.
pub fn locate(path: &Path) -> Result<FileIdentity> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let path = canonical(&path);

    let start = path.parent().unwrap_or(&path);
    let repo = Repository::discover(start).map_err(backend)?;
    let root = repo.workdir().ok_or_else(|| {
        HistoryError::Backend(
            format!("{} is a bare repository", repo.path().display()).into(),
        )
    })?;

    FileIdentity::from_absolute(canonical(root), &path)
}

/// Canonicalize the longest existing prefix of `path`.
fn canonical(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => canonical(parent).join(name),
        _ => path.to_path_buf(),
    }
}

// ============================================================================
// Private helpers
// ============================================================================

fn backend(e: git2::Error) -> HistoryError {
    HistoryError::Backend(Box::new(e))
}

/// Map a lookup failure to [`HistoryError::NotFound`] when git says the
/// object is missing.
fn lookup_error(e: git2::Error, revision: &str, file: &FileIdentity) -> HistoryError {
    if e.code() == ErrorCode::NotFound {
        HistoryError::NotFound {
            revision: revision.to_string(),
            path: file.entry().to_path_buf(),
        }
    } else {
        backend(e)
    }
}
