use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors that abort a history walk.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    /// The path does not exist at the requested revision.
    #[error("{} does not exist at revision {revision}", path.display())]
    NotFound { revision: String, path: PathBuf },

    #[error("{0}")]
    Parse(ParseFailure),

    #[error("{} is not inside repository {}", path.display(), root.display())]
    PathOutsideRoot { root: PathBuf, path: PathBuf },

    #[error("backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// What went wrong while turning one revision's content into a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseFailureKind {
    /// Malformed input.
    Syntax,
    /// A name the parser does not know.
    UnknownName,
    /// A value of the wrong type.
    TypeMismatch,
    /// The definition is missing something the format requires.
    Specification,
    /// A declared value is present but invalid.
    Validation,
    /// A subprocess run by the parser failed.
    Execution,
    /// Something the definition loads could not be found.
    MissingLoadTarget,
    /// The definition uses a deprecated feature and deprecations are strict.
    Deprecated,
    /// No definition by the requested name exists in this content.
    Unavailable,
    /// A defect in the parser itself.
    Internal,
}

impl ParseFailureKind {
    /// Failures expected when old revisions meet today's parser.
    ///
    /// A walk skips revisions failing with one of these kinds and keeps going.
    /// [`ParseFailureKind::Unavailable`] is skipped too, but is not reported.
    pub fn is_benign(self) -> bool {
        matches!(
            self,
            ParseFailureKind::Syntax
                | ParseFailureKind::UnknownName
                | ParseFailureKind::TypeMismatch
                | ParseFailureKind::Specification
                | ParseFailureKind::Validation
                | ParseFailureKind::Execution
                | ParseFailureKind::MissingLoadTarget
                | ParseFailureKind::Deprecated
        )
    }
}

impl std::fmt::Display for ParseFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParseFailureKind::Syntax => "syntax error",
            ParseFailureKind::UnknownName => "unknown name",
            ParseFailureKind::TypeMismatch => "type mismatch",
            ParseFailureKind::Specification => "specification error",
            ParseFailureKind::Validation => "validation error",
            ParseFailureKind::Execution => "execution error",
            ParseFailureKind::MissingLoadTarget => "missing load target",
            ParseFailureKind::Deprecated => "deprecated",
            ParseFailureKind::Unavailable => "unavailable",
            ParseFailureKind::Internal => "internal error",
        };
        write!(f, "{}", s)
    }
}

/// A classified parser failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ParseFailure {
    pub kind: ParseFailureKind,
    pub message: String,
}

impl ParseFailure {
    pub fn new(kind: ParseFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Syntax, message)
    }

    pub fn unknown_name(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::UnknownName, message)
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::TypeMismatch, message)
    }

    pub fn specification(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Specification, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Validation, message)
    }

    pub fn deprecated(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Deprecated, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ParseFailureKind::Internal, message)
    }
}

impl From<ParseFailure> for HistoryError {
    fn from(failure: ParseFailure) -> Self {
        HistoryError::Parse(failure)
    }
}
