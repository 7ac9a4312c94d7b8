use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{GitPaneError, Result};
use crate::models::{Commit, CommitFile, CommitStats, FileStatus};
use crate::status::parse_numstat_line;

pub const FIELD_SEP: char = '\u{001f}';
pub const RECORD_SEP: char = '\u{001e}';

/// `--format` value producing one record per commit. The trailing separator
/// leaves the file trailer (numstat / name-status lines) as the last field.
pub const LOG_FORMAT: &str = "%x1e%H%x1f%h%x1f%an%x1f%ae%x1f%aI%x1f%P%x1f%s%x1f%b%x1f";

const FIELD_COUNT: usize = 9;

pub fn parse_commit_records(stdout: &str) -> Result<Vec<Commit>> {
    let mut commits = Vec::new();
    let mut seen = HashSet::new();
    for raw_record in stdout.split(RECORD_SEP) {
        let record = raw_record.trim_start_matches(['\r', '\n']);
        if record.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = record.splitn(FIELD_COUNT, FIELD_SEP).collect();
        if fields.len() != FIELD_COUNT {
            return Err(GitPaneError::Parse(format!(
                "expected {FIELD_COUNT} fields, got {} in record {:?}",
                fields.len(),
                record
            )));
        }
        let hash = fields[0].trim().to_string();
        if !seen.insert(hash.clone()) {
            continue;
        }
        let date = DateTime::parse_from_rfc3339(fields[4].trim())
            .map_err(|e| {
                GitPaneError::Parse(format!("invalid author date {:?}: {}", fields[4], e))
            })?
            .with_timezone(&Utc);
        let parent_hashes: Vec<String> = fields[5]
            .split_whitespace()
            .map(ToString::to_string)
            .collect();
        let short_hash = match fields[1].trim() {
            "" => hash.chars().take(7).collect(),
            short => short.to_string(),
        };
        let files = parse_file_trailer(fields[8]);

        commits.push(Commit {
            short_hash,
            author: fields[2].to_string(),
            author_email: fields[3].to_string(),
            date,
            subject: fields[6].to_string(),
            body: fields[7].trim_end().to_string(),
            is_merge: parent_hashes.len() >= 2,
            stats: CommitStats::from_files(&files),
            parent_hashes,
            files,
            hash,
        });
    }
    Ok(commits)
}

/// Merge `--numstat` and `--name-status` lines into one entry per path.
pub fn parse_file_trailer(trailer: &str) -> Vec<CommitFile> {
    let mut files: Vec<CommitFile> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();

    let mut slot = |files: &mut Vec<CommitFile>, path: String| -> usize {
        *by_path.entry(path.clone()).or_insert_with(|| {
            files.push(CommitFile {
                path,
                old_path: String::new(),
                status: FileStatus::Modified,
                additions: 0,
                deletions: 0,
                binary: false,
            });
            files.len() - 1
        })
    };

    for line in trailer.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if let Some(stat) = parse_numstat_line(line) {
            let idx = slot(&mut files, stat.path);
            let file = &mut files[idx];
            file.binary = stat.additions.is_none() && stat.deletions.is_none();
            file.additions = stat.additions.unwrap_or(0);
            file.deletions = stat.deletions.unwrap_or(0);
            if let Some(old) = stat.old_path {
                file.old_path = old;
                file.status = FileStatus::Renamed;
            }
            continue;
        }
        if let Some((status, path, old_path)) = parse_name_status_line(line) {
            let idx = slot(&mut files, path);
            let file = &mut files[idx];
            file.status = status;
            if let Some(old) = old_path {
                file.old_path = old;
            }
        }
    }
    files
}

/// `M\tpath`, `R100\told\tnew`, `C75\tsrc\tdst`.
fn parse_name_status_line(line: &str) -> Option<(FileStatus, String, Option<String>)> {
    let mut parts = line.split('\t');
    let code = parts.next()?;
    let letter = code.chars().next()?;
    if !code[letter.len_utf8()..].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let status = FileStatus::from_letter(letter)?;
    let first = parts.next()?.to_string();
    match (status, parts.next()) {
        (FileStatus::Renamed | FileStatus::Copied, Some(second)) => {
            Some((status, second.to_string(), Some(first)))
        }
        _ => Some((status, first, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hash: &str, parents: &str, subject: &str, trailer: &str) -> String {
        format!(
            "{RECORD_SEP}{hash}{FIELD_SEP}{short}{FIELD_SEP}Alice{FIELD_SEP}alice@example.com{FIELD_SEP}2024-03-01T10:00:00+02:00{FIELD_SEP}{parents}{FIELD_SEP}{subject}{FIELD_SEP}Body line\n\n{FIELD_SEP}{trailer}",
            short = &hash[..7],
        )
    }

    #[test]
    fn parses_one_record() {
        let out = record("aaaaaaaaaa", "bbbbbbbbbb", "Subject", "\n3\t1\tsrc/lib.rs\n");
        let commits = parse_commit_records(&out).expect("parse records");
        assert_eq!(commits.len(), 1);
        let commit = &commits[0];
        assert_eq!(commit.hash, "aaaaaaaaaa");
        assert_eq!(commit.short_hash, "aaaaaaa");
        assert_eq!(commit.parent_hashes, vec!["bbbbbbbbbb"]);
        assert!(!commit.is_merge);
        assert_eq!(commit.body, "Body line");
        assert_eq!(commit.date.to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert_eq!(commit.stats.files_changed, 1);
        assert_eq!(commit.stats.additions, 3);
    }

    #[test]
    fn merges_and_roots() {
        let out = format!(
            "{}{}",
            record("mmmmmmmmmm", "aaaaaaaaaa bbbbbbbbbb", "Merge", "\n"),
            record("rrrrrrrrrr", "", "Root", "")
        );
        let commits = parse_commit_records(&out).expect("parse records");
        assert!(commits[0].is_merge);
        assert_eq!(commits[0].parent_hashes.len(), 2);
        assert!(commits[1].parent_hashes.is_empty());
        assert!(commits[1].files.is_empty());
    }

    #[test]
    fn skips_repeated_hashes() {
        let one = record("aaaaaaaaaa", "", "first", "");
        let commits = parse_commit_records(&format!("{one}{one}")).expect("parse records");
        assert_eq!(commits.len(), 1);
    }

    #[test]
    fn rejects_short_records_and_bad_dates() {
        let short = format!("{RECORD_SEP}abc{FIELD_SEP}def");
        assert!(parse_commit_records(&short).is_err());

        let bad_date = record("aaaaaaaaaa", "", "s", "").replace("2024-03-01T10:00:00+02:00", "yesterday");
        assert!(parse_commit_records(&bad_date).is_err());
    }

    #[test]
    fn trailer_merges_numstat_and_name_status() {
        let trailer = "\n5\t2\tsrc/main.rs\n-\t-\tlogo.png\n0\t0\tsrc/{old => new}.rs\nM\tsrc/main.rs\nA\tlogo.png\nR100\tsrc/old.rs\tsrc/new.rs\nD\tgone.rs\n";
        let files = parse_file_trailer(trailer);
        assert_eq!(files.len(), 4);

        assert_eq!(files[0].path, "src/main.rs");
        assert_eq!(files[0].status, FileStatus::Modified);
        assert_eq!((files[0].additions, files[0].deletions), (5, 2));

        assert_eq!(files[1].status, FileStatus::Added);
        assert!(files[1].binary);

        assert_eq!(files[2].path, "src/new.rs");
        assert_eq!(files[2].old_path, "src/old.rs");
        assert_eq!(files[2].status, FileStatus::Renamed);

        assert_eq!(files[3].path, "gone.rs");
        assert_eq!(files[3].status, FileStatus::Deleted);
        assert_eq!(files[3].additions, 0);
    }

    #[test]
    fn name_status_ignores_noise() {
        assert!(parse_name_status_line("Merge branch 'x'").is_none());
        assert!(parse_name_status_line("").is_none());
        assert_eq!(
            parse_name_status_line("C75\ta.rs\tb.rs"),
            Some((FileStatus::Copied, "b.rs".to_string(), Some("a.rs".to_string())))
        );
    }
}
