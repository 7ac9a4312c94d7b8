use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{GitPaneError, Result};
use crate::git::{GitOutput, GitRunner, to_args};
use crate::log_parser::{LOG_FORMAT, parse_commit_records, parse_file_trailer};
use crate::models::{Commit, CommitStats, NumstatEntry, StatusEntry, StatusSnapshot};
use crate::status::{merge_numstat, parse_numstat, parse_porcelain_status};

/// Git operations the view needs, each one a single blocking call.
#[derive(Debug, Clone)]
pub struct GitService {
    git: GitRunner,
    context_lines: usize,
}

impl GitService {
    pub fn new(git: GitRunner) -> Self {
        Self {
            git,
            context_lines: 3,
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn git(&self) -> &GitRunner {
        &self.git
    }

    pub fn validate_repo(&self, repo_path: &Path) -> Result<()> {
        self.git.validate_repo(repo_path)
    }

    pub fn discover_repo_root(&self, start_path: &Path) -> Result<PathBuf> {
        self.git.discover_repo_root(start_path)
    }

    fn run(&self, repo_path: &Path, args: &[&str]) -> Result<GitOutput> {
        let mut full = to_args(&["-c", "color.ui=never", "-c", "core.quotePath=false"]);
        full.extend(to_args(args));
        self.git.exec(repo_path, &full, false)
    }

    pub fn status(&self, repo_path: &Path) -> Result<Vec<StatusEntry>> {
        let out = self.run(
            repo_path,
            &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
        )?;
        parse_porcelain_status(&out.stdout)
    }

    pub fn diff_numstat(&self, repo_path: &Path, staged: bool) -> Result<Vec<NumstatEntry>> {
        let mut args = vec!["diff", "--no-ext-diff", "--numstat"];
        if staged {
            args.push("--cached");
        }
        let out = self.run(repo_path, &args)?;
        Ok(parse_numstat(&out.stdout))
    }

    /// Current branch name; `None` on a detached HEAD.
    pub fn current_branch(&self, repo_path: &Path) -> Result<Option<String>> {
        let out = self.git.exec(
            repo_path,
            &to_args(&["symbolic-ref", "--quiet", "--short", "HEAD"]),
            true,
        )?;
        let name = out.stdout.trim();
        Ok((out.success() && !name.is_empty()).then(|| name.to_string()))
    }

    pub fn status_snapshot(&self, repo_path: &Path) -> Result<StatusSnapshot> {
        let mut entries = self.status(repo_path)?;
        let staged = self.diff_numstat(repo_path, true)?;
        let unstaged = self.diff_numstat(repo_path, false)?;
        merge_numstat(&mut entries, &[&staged, &unstaged]);
        for entry in entries.iter_mut().filter(|e| e.is_untracked()) {
            entry.additions = untracked_line_count(&repo_path.join(&entry.path));
            entry.deletions = entry.additions.map(|_| 0);
        }
        debug!("status: {} entries", entries.len());
        Ok(StatusSnapshot {
            branch: self.current_branch(repo_path)?,
            entries,
        })
    }

    pub fn file_diff(&self, repo_path: &Path, path: &str, staged: bool) -> Result<String> {
        let unified = format!("-U{}", self.context_lines);
        let mut args = vec!["diff", "--no-color", "--no-ext-diff", unified.as_str()];
        if staged {
            args.push("--cached");
        }
        args.extend(["--", path]);
        Ok(self.run(repo_path, &args)?.stdout)
    }

    /// Diff of an untracked file against nothing. `git diff --no-index` exits
    /// 1 when the files differ, which is the expected case here.
    pub fn untracked_diff(&self, repo_path: &Path, path: &str) -> Result<String> {
        let unified = format!("-U{}", self.context_lines);
        let args = to_args(&[
            "-c",
            "color.ui=never",
            "diff",
            "--no-color",
            "--no-ext-diff",
            unified.as_str(),
            "--no-index",
            "--",
            "/dev/null",
            path,
        ]);
        let out = self.git.exec(repo_path, &args, true)?;
        match out.exit_code {
            Some(0) | Some(1) => Ok(out.stdout),
            exit_code => Err(GitPaneError::GitCommandFailed {
                program: self.git.git_binary().to_string(),
                args,
                exit_code,
                stderr: out.stderr,
                stdout: out.stdout,
            }),
        }
    }

    pub fn commit_history(&self, repo_path: &Path, limit: usize, skip: usize) -> Result<Vec<Commit>> {
        let format = format!("--format={LOG_FORMAT}");
        let max_count = format!("--max-count={limit}");
        let skip = format!("--skip={skip}");
        let out = self.run(
            repo_path,
            &[
                "log",
                "--topo-order",
                "--no-color",
                "--numstat",
                format.as_str(),
                max_count.as_str(),
                skip.as_str(),
            ],
        );
        match out {
            Ok(out) => parse_commit_records(&out.stdout),
            // A repository without commits has no history rather than an error.
            Err(GitPaneError::GitCommandFailed { stderr, .. })
                if stderr.contains("does not have any commits") =>
            {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Full metadata plus per-file status and line counts for one commit.
    pub fn commit_detail(&self, repo_path: &Path, hash: &str) -> Result<Commit> {
        let format = format!("--format={LOG_FORMAT}");
        let out = self.run(
            repo_path,
            &[
                "show",
                "--no-color",
                "--numstat",
                "--find-renames",
                "--diff-merges=first-parent",
                format.as_str(),
                hash,
            ],
        )?;
        let mut commit = parse_commit_records(&out.stdout)?
            .into_iter()
            .next()
            .ok_or_else(|| GitPaneError::Parse(format!("no commit record for {hash}")))?;

        let names = self.run(
            repo_path,
            &[
                "show",
                "--no-color",
                "--format=",
                "--name-status",
                "--find-renames",
                "--diff-merges=first-parent",
                hash,
            ],
        )?;
        let mut trailer = commit_trailer(&commit);
        trailer.push_str(&names.stdout);
        commit.files = parse_file_trailer(&trailer);
        commit.stats = CommitStats::from_files(&commit.files);
        Ok(commit)
    }

    pub fn commit_file_diff(&self, repo_path: &Path, hash: &str, path: &str) -> Result<String> {
        let unified = format!("-U{}", self.context_lines);
        let out = self.run(
            repo_path,
            &[
                "show",
                "--no-color",
                "--no-ext-diff",
                "--format=",
                "--find-renames",
                "--diff-merges=first-parent",
                unified.as_str(),
                hash,
                "--",
                path,
            ],
        )?;
        Ok(out.stdout)
    }

    pub fn stage(&self, repo_path: &Path, path: &str) -> Result<()> {
        self.run(repo_path, &["add", "--", path])?;
        Ok(())
    }

    /// Unstage `path`. Before the first commit there is no HEAD to restore
    /// from, so the path is dropped from the index instead.
    pub fn unstage(&self, repo_path: &Path, path: &str) -> Result<()> {
        let has_head = self
            .git
            .exec(repo_path, &to_args(&["rev-parse", "--verify", "--quiet", "HEAD"]), true)?
            .success();
        if has_head {
            self.run(repo_path, &["restore", "--staged", "--", path])?;
        } else {
            self.run(repo_path, &["rm", "--cached", "--quiet", "--", path])?;
        }
        Ok(())
    }
}

/// Re-serialise the numstat part of a parsed commit so it can be merged with
/// name-status lines.
fn commit_trailer(commit: &Commit) -> String {
    let mut out = String::new();
    for file in &commit.files {
        let (adds, dels) = if file.binary {
            ("-".to_string(), "-".to_string())
        } else {
            (file.additions.to_string(), file.deletions.to_string())
        };
        out.push_str(&format!("{adds}\t{dels}\t{}\n", file.path));
    }
    out
}

fn untracked_line_count(path: &Path) -> Option<u32> {
    let bytes = fs::read(path).ok()?;
    if bytes.contains(&0) {
        return None;
    }
    let newlines = bytes.iter().filter(|b| **b == b'\n').count();
    let trailing = usize::from(!bytes.is_empty() && bytes.last() != Some(&b'\n'));
    u32::try_from(newlines + trailing).ok()
}
