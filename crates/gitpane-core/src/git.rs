use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{GitPaneError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct GitRunner {
    git_binary: String,
    env: BTreeMap<String, String>,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner {
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn git_binary(&self) -> &str {
        &self.git_binary
    }

    pub fn validate_repo(&self, repo_path: &Path) -> Result<()> {
        if !repo_path.is_dir() {
            return Err(GitPaneError::InvalidRepository(repo_path.to_path_buf()));
        }
        let out = self.exec(repo_path, &to_args(&["rev-parse", "--is-inside-work-tree"]), true)?;
        if out.stdout.trim() == "true" {
            return Ok(());
        }
        Err(GitPaneError::InvalidRepository(repo_path.to_path_buf()))
    }

    pub fn discover_repo_root(&self, start_path: &Path) -> Result<PathBuf> {
        let out = self.exec(start_path, &to_args(&["rev-parse", "--show-toplevel"]), false)?;
        let root = out.stdout.trim();
        if root.is_empty() {
            return Err(GitPaneError::InvalidRepository(start_path.to_path_buf()));
        }
        Ok(PathBuf::from(root))
    }

    /// Run git in `repo_path`. A non-zero exit is an error unless
    /// `allow_non_zero` is set.
    pub fn exec(&self, repo_path: &Path, args: &[String], allow_non_zero: bool) -> Result<GitOutput> {
        debug!("git {}", args.join(" "));
        let mut cmd = Command::new(&self.git_binary);
        cmd.current_dir(repo_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let output = cmd
            .output()
            .map_err(|source| GitPaneError::io("running git command", source))?;
        let result = GitOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        if output.status.success() || allow_non_zero {
            return Ok(result);
        }
        Err(GitPaneError::GitCommandFailed {
            program: self.git_binary.clone(),
            args: args.to_vec(),
            exit_code: result.exit_code,
            stderr: result.stderr,
            stdout: result.stdout,
        })
    }
}

pub fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{GitRunner, to_args};
    use crate::error::GitPaneError;

    fn has_git() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn init_repo(tmp: &Path) {
        for args in [
            vec!["init"],
            vec!["config", "user.name", "Test"],
            vec!["config", "user.email", "test@example.com"],
        ] {
            std::process::Command::new("git")
                .args(&args)
                .current_dir(tmp)
                .output()
                .expect("git setup must run");
        }
        fs::write(tmp.join("README.md"), "hello\n").expect("write readme");
        std::process::Command::new("git")
            .args(["add", "README.md"])
            .current_dir(tmp)
            .output()
            .expect("add");
        std::process::Command::new("git")
            .args(["commit", "-m", "init"])
            .current_dir(tmp)
            .output()
            .expect("commit");
    }

    #[test]
    fn validates_git_repository() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().expect("tempdir");
        init_repo(tmp.path());

        let runner = GitRunner::default();
        runner.validate_repo(tmp.path()).expect("repo should be valid");
        let root = runner.discover_repo_root(tmp.path()).expect("root");
        assert_eq!(
            root.canonicalize().expect("canonical root"),
            tmp.path().canonicalize().expect("canonical tmp")
        );
    }

    #[test]
    fn rejects_plain_directories() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().expect("tempdir");
        let runner = GitRunner::default().with_env("GIT_CEILING_DIRECTORIES", tmp.path().to_string_lossy());
        assert!(runner.validate_repo(tmp.path()).is_err());
        assert!(runner.validate_repo(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn failing_commands_carry_stderr() {
        if !has_git() {
            return;
        }
        let tmp = TempDir::new().expect("tempdir");
        init_repo(tmp.path());
        let err = GitRunner::default()
            .exec(tmp.path(), &to_args(&["show", "no-such-rev"]), false)
            .unwrap_err();
        match err {
            GitPaneError::GitCommandFailed { stderr, .. } => assert!(!stderr.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
