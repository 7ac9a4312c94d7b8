use std::path::Path;

use log::warn;

use super::{DiffTarget, Msg};
use crate::error::Result;
use crate::external::ExternalRenderer;
use crate::render::DiffViewMode;
use crate::service::GitService;

/// Work the view asks the host to do off the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadStatus,
    LoadHistory {
        limit: usize,
    },
    LoadCommitDetail {
        hash: String,
    },
    LoadDiff(DiffTarget),
    RenderExternal {
        target: DiffTarget,
        raw: String,
        width: usize,
        mode: DiffViewMode,
    },
    Stage {
        path: String,
    },
    Unstage {
        path: String,
    },
}

fn into_msg<T>(result: Result<T>, ok: impl FnOnce(T) -> Msg) -> Msg {
    match result {
        Ok(value) => ok(value),
        Err(err) => {
            warn!("{err}");
            Msg::Error(err.summary())
        }
    }
}

/// Run one command to completion and turn the outcome into the message the
/// view expects. Blocking; call it from a worker thread.
pub fn execute(command: Command, repo: &Path, service: &GitService, external: &ExternalRenderer) -> Msg {
    match command {
        Command::LoadStatus => into_msg(service.status_snapshot(repo), Msg::StatusLoaded),
        Command::LoadHistory { limit } => {
            into_msg(service.commit_history(repo, limit, 0), Msg::HistoryLoaded)
        }
        Command::LoadCommitDetail { hash } => {
            into_msg(service.commit_detail(repo, &hash), Msg::CommitDetailLoaded)
        }
        Command::LoadDiff(target) => {
            let raw = match &target {
                DiffTarget::WorkTree {
                    path,
                    untracked: true,
                    ..
                } => service.untracked_diff(repo, path),
                DiffTarget::WorkTree { path, staged, .. } => service.file_diff(repo, path, *staged),
                DiffTarget::Commit { hash, path } => service.commit_file_diff(repo, hash, path),
            };
            into_msg(raw, |raw| Msg::DiffLoaded { target, raw })
        }
        Command::RenderExternal {
            target,
            raw,
            width,
            mode,
        } => {
            let output = external.render(&raw, width, mode == DiffViewMode::SideBySide);
            Msg::ExternalRendered {
                target,
                mode,
                output,
            }
        }
        Command::Stage { path } => into_msg(service.stage(repo, &path), |()| Msg::StageCompleted),
        Command::Unstage { path } => {
            into_msg(service.unstage(repo, &path), |()| Msg::StageCompleted)
        }
    }
}
