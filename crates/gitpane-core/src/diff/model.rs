//! Structured representation of a unified diff.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Context,
    Add,
    Remove,
}

impl LineKind {
    pub fn marker(self) -> char {
        match self {
            Self::Context => ' ',
            Self::Add => '+',
            Self::Remove => '-',
        }
    }
}

/// A run of text inside a changed line; `is_change` marks tokens that differ
/// from the paired line on the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordSegment {
    pub text: String,
    pub is_change: bool,
}

impl WordSegment {
    pub fn new(text: impl Into<String>, is_change: bool) -> Self {
        Self {
            text: text.into(),
            is_change,
        }
    }
}

/// One body line of a hunk. A line number of 0 means "absent on that side".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub old_line_no: u32,
    pub new_line_no: u32,
    pub content: String,
    pub word_diff: Vec<WordSegment>,
}

impl DiffLine {
    pub fn context(content: impl Into<String>, old_line_no: u32, new_line_no: u32) -> Self {
        Self {
            kind: LineKind::Context,
            old_line_no,
            new_line_no,
            content: content.into(),
            word_diff: Vec::new(),
        }
    }

    pub fn add(content: impl Into<String>, new_line_no: u32) -> Self {
        Self {
            kind: LineKind::Add,
            old_line_no: 0,
            new_line_no,
            content: content.into(),
            word_diff: Vec::new(),
        }
    }

    pub fn remove(content: impl Into<String>, old_line_no: u32) -> Self {
        Self {
            kind: LineKind::Remove,
            old_line_no,
            new_line_no: 0,
            content: content.into(),
            word_diff: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    /// The full `@@ ... @@ section` line.
    pub header: String,
    pub lines: Vec<DiffLine>,
    /// Set when the body does not match the counts announced in the header.
    pub count_mismatch: bool,
}

impl Hunk {
    pub fn new(old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> Self {
        Self {
            old_start,
            old_count,
            new_start,
            new_count,
            header: format!("@@ -{old_start},{old_count} +{new_start},{new_count} @@"),
            lines: Vec::new(),
            count_mismatch: false,
        }
    }

    /// Lines that exist on the old side (context and removals).
    pub fn old_side_len(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Add)
            .count()
    }

    /// Lines that exist on the new side (context and additions).
    pub fn new_side_len(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Remove)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDiff {
    pub old_file: String,
    pub new_file: String,
    pub binary: bool,
    pub hunks: Vec<Hunk>,
}

impl ParsedDiff {
    pub fn max_line_number(&self) -> u32 {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .map(|l| l.old_line_no.max(l.new_line_no))
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        !self.binary && self.hunks.is_empty()
    }

    /// Rows the unified renderer produces: one header per hunk plus body.
    pub fn unified_row_count(&self) -> usize {
        self.hunks.iter().map(|h| h.lines.len() + 1).sum()
    }

    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Add)
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Remove)
            .count()
    }
}

/// Header facts for one `diff --git` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileDiffInfo {
    pub old_file: String,
    pub new_file: String,
    pub is_rename: bool,
    pub is_copy: bool,
    pub is_new: bool,
    pub is_deleted: bool,
    pub old_mode: Option<String>,
    pub new_mode: Option<String>,
    pub similarity: Option<u8>,
}

impl FileDiffInfo {
    pub fn display_name(&self) -> String {
        if (self.is_rename || self.is_copy) && self.old_file != self.new_file {
            return format!("{} → {}", self.old_file, self.new_file);
        }
        if self.is_deleted {
            return self.old_file.clone();
        }
        self.new_file.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiff {
    pub info: FileDiffInfo,
    pub diff: ParsedDiff,
}

pub type MultiFileDiff = Vec<FileDiff>;
