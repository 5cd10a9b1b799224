use pkghistory::{FileIdentity, HistoryError, Result, RevisionId, RevisionSource, Revisions};
use std::io::{BufRead, BufReader, Lines, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use tracing::debug;

/// Revision source that runs the `git` executable.
///
/// Every command runs with the repository root as the child's working
/// directory; the caller's working directory is never changed. Messages are
/// forced to the C locale so missing paths can be recognized from stderr.
#[derive(Debug, Clone)]
pub struct GitCommand {
    program: PathBuf,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCommand {
    /// Use `git` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, root: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(root)
            .args(args)
            .env("LC_ALL", "C")
            .env_remove("LANGUAGE")
            .stdin(Stdio::null());
        cmd
    }
}

impl RevisionSource for GitCommand {
    fn revisions(&self, file: &FileIdentity, branch: &str) -> Result<Revisions<'_>> {
        let entry = file.entry_name();
        let args = [
            "rev-list",
            "--abbrev-commit",
            "--remove-empty",
            branch,
            "--",
            entry.as_str(),
        ];
        let description = format!("git {}", args.join(" "));
        debug!(root = %file.root().display(), "{}", description);

        let mut child = self
            .command(file.root(), &args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("git rev-list stdout was not captured"))?;
        let stderr = child.stderr.take().map(drain);

        Ok(Box::new(RevList {
            child: Some(child),
            lines: BufReader::new(stdout).lines(),
            stderr,
            description,
        }))
    }

    fn contents_at(&self, file: &FileIdentity, revision: &RevisionId) -> Result<Vec<u8>> {
        let object = format!("{}:{}", revision, file.entry_name());
        let output = self
            .command(file.root(), &["cat-file", "blob", &object])
            .output()?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_missing_object(&stderr) {
            return Err(HistoryError::NotFound {
                revision: revision.to_string(),
                path: file.entry().to_path_buf(),
            });
        }
        Err(HistoryError::Command {
            command: format!("git cat-file blob {}", object),
            status: output.status.to_string(),
            stderr,
        })
    }
}

/// Messages git prints when `<rev>:<path>` names nothing.
fn is_missing_object(stderr: &str) -> bool {
    stderr.contains("does not exist")
        || stderr.contains("exists on disk, but not in")
        || stderr.contains("Not a valid object name")
        || stderr.contains("invalid object name")
}

/// Read a child's stderr to the end on its own thread, so a chatty child
/// never blocks on a full pipe while stdout is being consumed.
fn drain(mut stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).trim().to_string()
    })
}

/// Streaming `git rev-list` output.
///
/// The child is reaped when the output ends, and killed if the iterator is
/// dropped before that.
struct RevList {
    child: Option<Child>,
    lines: Lines<BufReader<ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    description: String,
}

impl RevList {
    fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        // The pipe is closed once the child is gone, so this returns.
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }

    fn finish(&mut self) -> Option<Result<RevisionId>> {
        let mut child = self.child.take()?;
        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => return Some(Err(e.into())),
        };
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if status.success() {
            return None;
        }
        Some(Err(HistoryError::Command {
            command: self.description.clone(),
            status: status.to_string(),
            stderr,
        }))
    }
}

impl Iterator for RevList {
    type Item = Result<RevisionId>;

    fn next(&mut self) -> Option<Self::Item> {
        self.child.as_ref()?;
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    let id = line.trim();
                    if !id.is_empty() {
                        return Some(Ok(RevisionId::new(id)));
                    }
                }
                Some(Err(e)) => {
                    self.kill();
                    return Some(Err(e.into()));
                }
                None => return self.finish(),
            }
        }
    }
}

impl Drop for RevList {
    fn drop(&mut self) {
        self.kill();
    }
}
