//! Parser for single-file unified diff text as printed by `git diff`.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use super::model::{DiffLine, Hunk, ParsedDiff};
use super::word::attach_word_diffs;
use crate::error::{ParseError, ParseErrorKind};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$").expect("regex compiles")
});

const DEV_NULL: &str = "/dev/null";

/// Header lines that may appear between `diff --git` and the first hunk.
const FILE_HEADER_PREFIXES: &[&str] = &[
    "diff ",
    "index ",
    "--- ",
    "+++ ",
    "old mode ",
    "new mode ",
    "new file mode ",
    "deleted file mode ",
    "similarity index ",
    "dissimilarity index ",
    "rename from ",
    "rename to ",
    "copy from ",
    "copy to ",
];

/// Parse one file's unified diff.
///
/// Lines before the first hunk that are not recognised headers are skipped,
/// so `git show` output with a commit preamble parses as well. Hunks whose
/// bodies disagree with their header counts are kept and flagged with
/// [`Hunk::count_mismatch`].
pub fn parse_unified_diff(text: &str) -> Result<ParsedDiff, ParseError> {
    parse_at(text, 0)
}

/// Same as [`parse_unified_diff`], reporting error lines shifted by
/// `line_offset`.
pub(crate) fn parse_at(text: &str, line_offset: usize) -> Result<ParsedDiff, ParseError> {
    let mut diff = ParsedDiff::default();
    let mut current: Option<HunkBuilder> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = line_offset + idx + 1;

        if let Some(builder) = current.as_mut()
            && builder.expects_body()
        {
            match line.chars().next() {
                Some(' ') => builder.push_context(&line[1..]),
                Some('+') => builder.push_add(&line[1..]),
                Some('-') => builder.push_remove(&line[1..]),
                Some('\\') => {}
                None => builder.push_context(""),
                Some(_) => {
                    if let Some(hunk) = current.take() {
                        diff.hunks.push(hunk.finish());
                    }
                    if line.starts_with("@@") {
                        current = Some(HunkBuilder::open(line, line_no)?);
                    } else if is_file_header(line) {
                        apply_file_header(&mut diff, line);
                    } else if is_binary_marker(line) {
                        return Ok(binary(diff));
                    } else {
                        return Err(ParseError::new(ParseErrorKind::StrayLine, line_no));
                    }
                }
            }
            continue;
        }

        if line.starts_with("@@") {
            if let Some(hunk) = current.take() {
                diff.hunks.push(hunk.finish());
            }
            current = Some(HunkBuilder::open(line, line_no)?);
            continue;
        }
        if is_binary_marker(line) {
            return Ok(binary(diff));
        }
        if is_file_header(line) {
            if let Some(hunk) = current.take() {
                diff.hunks.push(hunk.finish());
            }
            apply_file_header(&mut diff, line);
            continue;
        }

        let Some(builder) = current.as_mut() else {
            debug!("skipping preamble line {line_no}");
            continue;
        };
        // The hunk already holds every line its header announced.
        match line.chars().next() {
            None | Some('\\') => {}
            Some(' ') => builder.push_context(&line[1..]),
            Some('+') => builder.push_add(&line[1..]),
            Some('-') => builder.push_remove(&line[1..]),
            Some(_) => return Err(ParseError::new(ParseErrorKind::StrayLine, line_no)),
        }
    }

    if let Some(hunk) = current.take() {
        diff.hunks.push(hunk.finish());
    }
    Ok(diff)
}

fn binary(mut diff: ParsedDiff) -> ParsedDiff {
    diff.binary = true;
    diff.hunks.clear();
    diff
}

pub(crate) fn is_binary_marker(line: &str) -> bool {
    (line.starts_with("Binary files ") && line.ends_with(" differ"))
        || line.starts_with("GIT binary patch")
}

fn is_file_header(line: &str) -> bool {
    FILE_HEADER_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn apply_file_header(diff: &mut ParsedDiff, line: &str) {
    if let Some(rest) = line.strip_prefix("--- ") {
        diff.old_file = clean_path(rest);
    } else if let Some(rest) = line.strip_prefix("+++ ") {
        diff.new_file = clean_path(rest);
    } else if let Some((old, new)) = line.strip_prefix("diff --git ").and_then(split_git_paths) {
        if diff.old_file.is_empty() {
            diff.old_file = old;
        }
        if diff.new_file.is_empty() {
            diff.new_file = new;
        }
    }
}

/// Split the `a/X b/Y` tail of a `diff --git` line.
pub(crate) fn split_git_paths(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim();
    if let Some(stripped) = rest.strip_prefix('"') {
        let close = stripped.find('"')?;
        let old = &stripped[..close];
        let new = stripped[close + 1..].trim();
        return Some((clean_path(old), clean_path(new)));
    }
    let split = rest.rfind(" b/").or_else(|| rest.rfind(" \"b/"))?;
    Some((clean_path(&rest[..split]), clean_path(&rest[split + 1..])))
}

/// Normalise a path from a diff header: drop the timestamp some tools append
/// after a tab, surrounding quotes and the `a/` / `b/` prefixes.
pub(crate) fn clean_path(raw: &str) -> String {
    let path = raw.split('\t').next().unwrap_or(raw).trim();
    let path = path.trim_matches('"');
    if path == DEV_NULL {
        return DEV_NULL.to_string();
    }
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}

pub(crate) fn is_dev_null(path: &str) -> bool {
    path == DEV_NULL
}

struct HunkBuilder {
    hunk: Hunk,
    old_no: u32,
    new_no: u32,
    remaining_old: u32,
    remaining_new: u32,
}

impl HunkBuilder {
    fn open(line: &str, line_no: usize) -> Result<Self, ParseError> {
        let malformed = || ParseError::new(ParseErrorKind::MalformedHunk, line_no);
        let caps = HUNK_HEADER.captures(line).ok_or_else(malformed)?;
        let number = |idx: usize, default: u32| -> Result<u32, ParseError> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse::<u32>().map_err(|_| malformed()),
                None => Ok(default),
            }
        };
        let old_start = number(1, 0)?;
        let old_count = number(2, 1)?;
        let new_start = number(3, 0)?;
        let new_count = number(4, 1)?;

        let mut hunk = Hunk::new(old_start, old_count, new_start, new_count);
        hunk.header = line.to_string();
        Ok(Self {
            hunk,
            old_no: old_start,
            new_no: new_start,
            remaining_old: old_count,
            remaining_new: new_count,
        })
    }

    fn expects_body(&self) -> bool {
        self.remaining_old > 0 || self.remaining_new > 0
    }

    fn push_context(&mut self, content: &str) {
        self.hunk
            .lines
            .push(DiffLine::context(content, self.old_no, self.new_no));
        self.old_no = self.old_no.saturating_add(1);
        self.new_no = self.new_no.saturating_add(1);
        self.remaining_old = self.remaining_old.saturating_sub(1);
        self.remaining_new = self.remaining_new.saturating_sub(1);
    }

    fn push_add(&mut self, content: &str) {
        self.hunk.lines.push(DiffLine::add(content, self.new_no));
        self.new_no = self.new_no.saturating_add(1);
        self.remaining_new = self.remaining_new.saturating_sub(1);
    }

    fn push_remove(&mut self, content: &str) {
        self.hunk.lines.push(DiffLine::remove(content, self.old_no));
        self.old_no = self.old_no.saturating_add(1);
        self.remaining_old = self.remaining_old.saturating_sub(1);
    }

    fn finish(mut self) -> Hunk {
        let old_len = self.hunk.old_side_len();
        let new_len = self.hunk.new_side_len();
        if old_len != self.hunk.old_count as usize || new_len != self.hunk.new_count as usize {
            warn!(
                "hunk {:?} announced -{} +{} but carried -{} +{}",
                self.hunk.header, self.hunk.old_count, self.hunk.new_count, old_len, new_len
            );
            self.hunk.count_mismatch = true;
        }
        attach_word_diffs(&mut self.hunk.lines);
        self.hunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{LineKind, WordSegment};

    const SIMPLE: &str = "--- a/f\n+++ b/f\n@@ -1,3 +1,3 @@\n ctx\n-old\n+new\n more\n";

    #[test]
    fn parses_simple_hunk() {
        let diff = parse_unified_diff(SIMPLE).expect("parses");
        assert_eq!(diff.old_file, "f");
        assert_eq!(diff.new_file, "f");
        assert!(!diff.binary);
        assert_eq!(diff.hunks.len(), 1);

        let hunk = &diff.hunks[0];
        assert!(!hunk.count_mismatch);
        assert_eq!(hunk.lines.len(), 4);

        let removed = &hunk.lines[1];
        assert_eq!(removed.kind, LineKind::Remove);
        assert_eq!((removed.old_line_no, removed.new_line_no), (2, 0));
        assert_eq!(removed.content, "old");
        assert_eq!(removed.word_diff, vec![WordSegment::new("old", true)]);

        let added = &hunk.lines[2];
        assert_eq!(added.kind, LineKind::Add);
        assert_eq!((added.old_line_no, added.new_line_no), (0, 2));
        assert_eq!(added.content, "new");
        assert_eq!(added.word_diff, vec![WordSegment::new("new", true)]);

        let trailing = &hunk.lines[3];
        assert_eq!((trailing.old_line_no, trailing.new_line_no), (3, 3));
    }

    #[test]
    fn detects_binary_marker() {
        let text = "diff --git a/img b/img\nindex 1..2 100644\nBinary files a/img and b/img differ\n";
        let diff = parse_unified_diff(text).expect("parses");
        assert!(diff.binary);
        assert!(diff.hunks.is_empty());
        assert_eq!(diff.new_file, "img");
    }

    #[test]
    fn rejects_malformed_hunk_header() {
        let err = parse_unified_diff("--- a/f\n+++ b/f\n@@ -x,1 +1 @@\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedHunk);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn rejects_stray_line_inside_body() {
        let err = parse_unified_diff("@@ -1,2 +1,2 @@\n a\n?oops\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::StrayLine);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn flags_count_mismatch_without_failing() {
        let diff = parse_unified_diff("@@ -1,3 +1,3 @@\n a\n-b\n+c\n").expect("tolerated");
        assert!(diff.hunks[0].count_mismatch);

        let extra = parse_unified_diff("@@ -1 +1 @@\n-a\n+b\n+c\n").expect("tolerated");
        assert!(extra.hunks[0].count_mismatch);
        assert_eq!(extra.hunks[0].lines.len(), 3);
    }

    #[test]
    fn no_newline_marker_does_not_emit_a_line() {
        let text = "@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n\\ No newline at end of file\n";
        let diff = parse_unified_diff(text).expect("parses");
        assert_eq!(diff.hunks[0].lines.len(), 2);
        assert!(!diff.hunks[0].count_mismatch);
    }

    #[test]
    fn triple_dash_inside_body_is_a_removal() {
        let text = "@@ -1,2 +1,1 @@\n--- not a header\n keep\n";
        let diff = parse_unified_diff(text).expect("parses");
        let first = &diff.hunks[0].lines[0];
        assert_eq!(first.kind, LineKind::Remove);
        assert_eq!(first.content, "-- not a header");
    }

    #[test]
    fn new_file_uses_dev_null_and_omitted_counts() {
        let text = "--- /dev/null\n+++ b/new.rs\n@@ -0,0 +1 @@\n+fn main() {}\n";
        let diff = parse_unified_diff(text).expect("parses");
        assert_eq!(diff.old_file, "/dev/null");
        assert_eq!(diff.new_file, "new.rs");
        assert_eq!(diff.hunks[0].new_count, 1);
        assert_eq!(diff.hunks[0].lines[0].new_line_no, 1);
    }

    #[test]
    fn keeps_section_heading_in_header() {
        let text = "@@ -10,1 +10,1 @@ fn example()\n-a\n+b\n";
        let diff = parse_unified_diff(text).expect("parses");
        assert_eq!(diff.hunks[0].header, "@@ -10,1 +10,1 @@ fn example()");
        assert_eq!(diff.max_line_number(), 10);
    }

    #[test]
    fn skips_commit_preamble() {
        let text = "commit abc\nAuthor: A <a@e>\n\n    message\n\ndiff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1 @@\n-1\n+2\n";
        let diff = parse_unified_diff(text).expect("parses");
        assert_eq!(diff.hunks.len(), 1);
    }

    #[test]
    fn line_numbers_follow_kind_rules() {
        let text = "@@ -5,4 +7,5 @@\n a\n-b\n-c\n+d\n+e\n+f\n g\n";
        let diff = parse_unified_diff(text).expect("parses");
        for hunk in &diff.hunks {
            let (mut old_no, mut new_no) = (hunk.old_start, hunk.new_start);
            for line in &hunk.lines {
                match line.kind {
                    LineKind::Context => {
                        assert_eq!((line.old_line_no, line.new_line_no), (old_no, new_no));
                        old_no += 1;
                        new_no += 1;
                    }
                    LineKind::Remove => {
                        assert_eq!((line.old_line_no, line.new_line_no), (old_no, 0));
                        old_no += 1;
                    }
                    LineKind::Add => {
                        assert_eq!((line.old_line_no, line.new_line_no), (0, new_no));
                        new_no += 1;
                    }
                }
            }
            assert!(!hunk.count_mismatch);
            assert_eq!(hunk.old_side_len(), hunk.old_count as usize);
            assert_eq!(hunk.new_side_len(), hunk.new_count as usize);
        }
    }

    #[test]
    fn line_numbers_saturate_at_u32_max() {
        let diff = parse_unified_diff("@@ -4294967295,2 +1,2 @@\n a\n b\n").expect("parse");
        let numbers: Vec<(u32, u32)> = diff.hunks[0]
            .lines
            .iter()
            .map(|l| (l.old_line_no, l.new_line_no))
            .collect();
        assert_eq!(numbers, vec![(u32::MAX, 1), (u32::MAX, 2)]);
    }

    #[test]
    fn cleans_header_paths() {
        assert_eq!(clean_path("a/src/main.rs"), "src/main.rs");
        assert_eq!(clean_path("b/src/main.rs\t2024-01-01 00:00"), "src/main.rs");
        assert_eq!(clean_path("\"a/with space.txt\""), "with space.txt");
        assert_eq!(clean_path("/dev/null"), "/dev/null");
        assert_eq!(
            split_git_paths("a/old name.rs b/new name.rs"),
            Some(("old name.rs".to_string(), "new name.rs".to_string()))
        );
    }
}
