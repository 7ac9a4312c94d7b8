//! Parsers for `git status --porcelain=v1 -z` and `git diff --numstat`.

use std::collections::HashMap;

use crate::error::{GitPaneError, Result};
use crate::models::{FileStatus, NumstatEntry, StatusEntry};

const CONFLICT_CODES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Collapse a two-letter porcelain code into `(staged, working)`.
pub fn collapse_status_code(code: &str) -> (Option<FileStatus>, Option<FileStatus>) {
    if code == "??" {
        return (None, Some(FileStatus::Untracked));
    }
    if CONFLICT_CODES.contains(&code) {
        return (Some(FileStatus::Conflicted), Some(FileStatus::Conflicted));
    }
    let mut letters = code.chars();
    let staged = letters.next().and_then(FileStatus::from_letter);
    let working = letters.next().and_then(FileStatus::from_letter);
    (staged, working)
}

pub fn parse_porcelain_status(stdout: &str) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    let mut fields = stdout.split('\0');
    while let Some(field) = fields.next() {
        if field.is_empty() {
            continue;
        }
        let (Some(code), Some(path)) = (field.get(..2), field.get(3..)) else {
            return Err(GitPaneError::Parse(format!(
                "invalid porcelain status entry {field:?}"
            )));
        };
        if code == "!!" {
            continue;
        }
        let (staged, working) = collapse_status_code(code);
        let old_path = if code.contains(['R', 'C']) {
            fields.next().map(ToString::to_string)
        } else {
            None
        };
        entries.push(StatusEntry {
            path: path.to_string(),
            old_path,
            staged,
            working,
            additions: None,
            deletions: None,
        });
    }
    Ok(entries)
}

pub fn parse_numstat_value(raw: &str) -> Option<u32> {
    if raw == "-" {
        return None;
    }
    raw.parse::<u32>().ok()
}

/// Split a numstat path into `(new, old)`. Handles both `old => new` and the
/// compact `dir/{old => new}/file` rename forms.
pub fn split_numstat_path(raw: &str) -> (String, Option<String>) {
    let path = raw.trim().trim_matches('"');
    if let Some(open) = path.find('{')
        && let Some(close) = path[open..].find('}').map(|rel| open + rel)
        && let Some((lhs, rhs)) = path[open + 1..close].split_once(" => ")
    {
        let prefix = &path[..open];
        let suffix = &path[close + 1..];
        let join = |middle: &str| format!("{prefix}{}{suffix}", middle.trim()).replace("//", "/");
        return (join(rhs), Some(join(lhs)));
    }
    if let Some((lhs, rhs)) = path.split_once(" => ") {
        return (rhs.trim().to_string(), Some(lhs.trim().to_string()));
    }
    (path.to_string(), None)
}

/// Parse one `adds\tdels\tpath` line. Anything else yields `None`.
pub fn parse_numstat_line(line: &str) -> Option<NumstatEntry> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?;
    let removed = parts.next()?;
    let raw_path = parts.next()?;
    let is_count = |s: &str| s == "-" || (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    if !is_count(added) || !is_count(removed) || raw_path.is_empty() {
        return None;
    }
    let (path, old_path) = split_numstat_path(raw_path);
    Some(NumstatEntry {
        path,
        old_path,
        additions: parse_numstat_value(added),
        deletions: parse_numstat_value(removed),
    })
}

pub fn parse_numstat(stdout: &str) -> Vec<NumstatEntry> {
    stdout
        .lines()
        .filter_map(|line| parse_numstat_line(line.trim_end_matches('\r')))
        .collect()
}

fn add_counts(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (a, b) => a.or(b),
    }
}

/// Attach staged plus unstaged line counts to each status entry.
pub fn merge_numstat(entries: &mut [StatusEntry], numstats: &[&[NumstatEntry]]) {
    let mut totals: HashMap<&str, (Option<u32>, Option<u32>)> = HashMap::new();
    for stat in numstats.iter().flat_map(|list| list.iter()) {
        let slot = totals.entry(stat.path.as_str()).or_default();
        slot.0 = add_counts(slot.0, stat.additions);
        slot.1 = add_counts(slot.1, stat.deletions);
    }
    for entry in entries.iter_mut() {
        if let Some((additions, deletions)) = totals.get(entry.path.as_str()) {
            entry.additions = *additions;
            entry.deletions = *deletions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_porcelain_records() {
        let out = "M  staged.rs\0 M work.rs\0MM both.rs\0?? new.txt\0R  to.rs\0from.rs\0UU conflict.rs\0";
        let entries = parse_porcelain_status(out).expect("parse status");
        assert_eq!(entries.len(), 6);

        assert_eq!(entries[0].staged, Some(FileStatus::Modified));
        assert_eq!(entries[0].working, None);
        assert_eq!(entries[1].short_code(), " M");
        assert_eq!(entries[2].short_code(), "MM");
        assert!(entries[3].is_untracked());
        assert_eq!(entries[4].path, "to.rs");
        assert_eq!(entries[4].old_path.as_deref(), Some("from.rs"));
        assert_eq!(entries[4].staged, Some(FileStatus::Renamed));
        assert!(entries[5].is_conflicted());
    }

    #[test]
    fn type_changes_read_as_modified() {
        assert_eq!(
            collapse_status_code(" T"),
            (None, Some(FileStatus::Modified))
        );
        assert_eq!(
            collapse_status_code("AA"),
            (Some(FileStatus::Conflicted), Some(FileStatus::Conflicted))
        );
    }

    #[test]
    fn rejects_truncated_entries() {
        assert!(parse_porcelain_status("M\0").is_err());
    }

    #[test]
    fn numstat_handles_binary_and_renames() {
        let out = "3\t1\tsrc/lib.rs\n-\t-\tlogo.png\n0\t0\tsrc/{old => new}/mod.rs\n2\t2\ta.txt => b.txt\nnot numstat\n";
        let stats = parse_numstat(out);
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].additions, Some(3));
        assert_eq!(stats[1].additions, None);
        assert_eq!(stats[2].path, "src/new/mod.rs");
        assert_eq!(stats[2].old_path.as_deref(), Some("src/old/mod.rs"));
        assert_eq!(stats[3].path, "b.txt");
        assert_eq!(stats[3].old_path.as_deref(), Some("a.txt"));
    }

    #[test]
    fn numstat_paths_with_empty_rename_side() {
        assert_eq!(
            split_numstat_path("src/{ => nested}/x.rs"),
            ("src/nested/x.rs".to_string(), Some("src/x.rs".to_string()))
        );
        assert_eq!(split_numstat_path("\"plain.rs\""), ("plain.rs".to_string(), None));
    }

    #[test]
    fn merges_staged_and_unstaged_counts() {
        let mut entries = parse_porcelain_status("MM both.rs\0?? new.txt\0").expect("parse");
        let staged = parse_numstat("1\t0\tboth.rs\n");
        let unstaged = parse_numstat("2\t3\tboth.rs\n");
        merge_numstat(&mut entries, &[&staged, &unstaged]);
        assert_eq!(entries[0].additions, Some(3));
        assert_eq!(entries[0].deletions, Some(3));
        assert_eq!(entries[1].additions, None);
    }
}
