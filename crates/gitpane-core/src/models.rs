use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Conflicted,
    Untracked,
}

impl FileStatus {
    /// Status letter as printed by `git status --short`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Modified => "M",
            Self::Added => "A",
            Self::Deleted => "D",
            Self::Renamed => "R",
            Self::Copied => "C",
            Self::Conflicted => "U",
            Self::Untracked => "??",
        }
    }

    /// Map a single porcelain/name-status letter. Space and unknown letters
    /// mean "unchanged".
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'M' | 'T' => Some(Self::Modified),
            'A' => Some(Self::Added),
            'D' => Some(Self::Deleted),
            'R' => Some(Self::Renamed),
            'C' => Some(Self::Copied),
            'U' => Some(Self::Conflicted),
            '?' => Some(Self::Untracked),
            _ => None,
        }
    }
}

/// One path from `git status`, with both porcelain columns collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub path: String,
    pub old_path: Option<String>,
    pub staged: Option<FileStatus>,
    pub working: Option<FileStatus>,
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.working == Some(FileStatus::Untracked)
    }

    pub fn is_conflicted(&self) -> bool {
        self.staged == Some(FileStatus::Conflicted) || self.working == Some(FileStatus::Conflicted)
    }

    pub fn has_working_changes(&self) -> bool {
        self.working.is_some()
    }

    /// Two-column code, e.g. `"M "`, `" M"`, `"??"`.
    pub fn short_code(&self) -> String {
        if self.is_untracked() {
            return "??".to_string();
        }
        let column = |status: Option<FileStatus>| status.map_or(" ", FileStatus::code);
        format!("{}{}", column(self.staged), column(self.working))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumstatEntry {
    pub path: String,
    pub old_path: Option<String>,
    /// `None` for binary files.
    pub additions: Option<u32>,
    pub deletions: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub branch: Option<String>,
    pub entries: Vec<StatusEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub path: String,
    /// Source path for renames and copies; empty otherwise.
    pub old_path: String,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    pub binary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub files_changed: usize,
    pub additions: u32,
    pub deletions: u32,
}

impl CommitStats {
    pub fn from_files(files: &[CommitFile]) -> Self {
        Self {
            files_changed: files.len(),
            additions: files.iter().map(|f| f.additions).sum(),
            deletions: files.iter().map(|f| f.deletions).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    pub author_email: String,
    pub date: DateTime<Utc>,
    pub subject: String,
    pub body: String,
    pub parent_hashes: Vec<String>,
    pub is_merge: bool,
    pub files: Vec<CommitFile>,
    pub stats: CommitStats,
}

/// A lane in the commit graph, waiting for `commit_hash` to show up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphColumn {
    pub commit_hash: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLine {
    pub chars: Vec<char>,
    pub width: usize,
}

impl GraphLine {
    pub fn new(chars: Vec<char>) -> Self {
        let width = chars.len();
        Self { chars, width }
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

/// Graph output for one commit: its own row plus any connector rows drawn
/// below it for merges and converging lanes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRow {
    pub hash: String,
    pub column: usize,
    pub line: GraphLine,
    pub connectors: Vec<GraphLine>,
}
