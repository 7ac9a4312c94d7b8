use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitPaneError>;

#[derive(Debug, Error)]
pub enum GitPaneError {
    #[error("I/O failure while {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("git command failed: `{program}` {args:?}, exit_code={exit_code:?}, stderr={stderr}")]
    GitCommandFailed {
        program: String,
        args: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("invalid git repository: {0}")]
    InvalidRepository(PathBuf),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Diff(#[from] ParseError),

    #[error("config error: {0}")]
    Config(String),

    #[error("external renderer `{program}` failed: {message}")]
    External { program: String, message: String },
}

impl GitPaneError {
    pub fn io(operation: &'static str, source: std::io::Error) -> Self {
        Self::Io { operation, source }
    }

    /// Short, single-line description suitable for a status bar.
    pub fn summary(&self) -> String {
        match self {
            Self::GitCommandFailed { stderr, args, .. } => {
                let first = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                if first.is_empty() {
                    format!("git {} failed", args.first().map(String::as_str).unwrap_or(""))
                } else {
                    first.trim().to_string()
                }
            }
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MalformedHunk,
    StrayLine,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedHunk => f.write_str("malformed hunk header"),
            Self::StrayLine => f.write_str("stray line"),
        }
    }
}

/// Failure while parsing unified diff text. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize) -> Self {
        Self { kind, line }
    }
}
