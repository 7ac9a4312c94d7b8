//! Posts `FilesChanged` when the index, refs or work tree move under us.

use std::path::{Path, PathBuf};

use gitpane_core::Msg;
use log::{debug, warn};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

/// Start watching `repo`. The returned watcher must be kept alive; `None`
/// when `.git` is missing or the platform watcher cannot be created.
pub fn start(repo: &Path, sender: UnboundedSender<Msg>) -> Option<RecommendedWatcher> {
    let git_dir = repo.join(".git");
    if !git_dir.exists() {
        return None;
    }

    let filter_dir = git_dir.clone();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
        let Ok(event) = event else { return };
        if is_relevant(&event, &filter_dir) {
            let _ = sender.send(Msg::FilesChanged);
        }
    })
    .map_err(|err| warn!("file watcher unavailable: {err}"))
    .ok()?;

    for (path, mode) in [
        (git_dir.join("index"), RecursiveMode::NonRecursive),
        (git_dir.join("HEAD"), RecursiveMode::NonRecursive),
        (git_dir.join("refs"), RecursiveMode::Recursive),
        (repo.to_path_buf(), RecursiveMode::Recursive),
    ] {
        if let Err(err) = watcher.watch(&path, mode) {
            debug!("not watching {}: {err}", path.display());
        }
    }
    Some(watcher)
}

/// Inside `.git` only the index, HEAD and refs count; lock files and object
/// writes are git's own bookkeeping.
fn is_relevant(event: &Event, git_dir: &Path) -> bool {
    if event.kind.is_access() {
        return false;
    }
    event.paths.iter().any(|path| relevant_path(path, git_dir))
}

fn relevant_path(path: &Path, git_dir: &Path) -> bool {
    if !path.starts_with(git_dir) {
        return true;
    }
    let watched: [PathBuf; 2] = [git_dir.join("index"), git_dir.join("HEAD")];
    watched.iter().any(|p| p == path) || path.starts_with(git_dir.join("refs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_git_bookkeeping() {
        let git_dir = Path::new("/repo/.git");
        assert!(relevant_path(Path::new("/repo/src/main.rs"), git_dir));
        assert!(relevant_path(Path::new("/repo/.git/index"), git_dir));
        assert!(relevant_path(Path::new("/repo/.git/HEAD"), git_dir));
        assert!(relevant_path(Path::new("/repo/.git/refs/heads/main"), git_dir));
        assert!(!relevant_path(Path::new("/repo/.git/index.lock"), git_dir));
        assert!(!relevant_path(Path::new("/repo/.git/objects/ab/cdef"), git_dir));
    }
}
