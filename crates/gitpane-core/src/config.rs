use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{GitPaneError, Result};
use crate::external::DeltaMode;
use crate::render::DiffViewMode;

const CONFIG_FILENAME: &str = "config.toml";
const LOG_FILENAME: &str = "gitpane.log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitPaneConfig {
    pub git_binary: String,
    pub delta: DeltaMode,
    pub delta_binary: String,
    pub diff_view: DiffViewMode,
    pub history_limit: usize,
    pub context_lines: usize,
    pub watch: bool,
}

impl Default for GitPaneConfig {
    fn default() -> Self {
        Self {
            git_binary: "git".to_string(),
            delta: DeltaMode::Auto,
            delta_binary: "delta".to_string(),
            diff_view: DiffViewMode::Unified,
            history_limit: 500,
            context_lines: 3,
            watch: true,
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "gitpane", "gitpane")
        .ok_or_else(|| GitPaneError::Config("cannot resolve project directories".to_string()))
}

pub fn default_log_path() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join(LOG_FILENAME))
}

/// Read-only access to the user's config file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join(CONFIG_FILENAME))
    }

    pub fn default_store() -> Result<Self> {
        Ok(Self {
            path: Self::default_location()?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<GitPaneConfig> {
        if !self.path.exists() {
            return Ok(GitPaneConfig::default());
        }
        let text = fs::read_to_string(&self.path)
            .map_err(|source| GitPaneError::io("reading config file", source))?;
        toml::from_str(&text).map_err(|e| {
            GitPaneError::Config(format!("invalid config {}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let store = ConfigStore::at(tmp.path().join("config.toml"));
        assert_eq!(store.load().expect("load"), GitPaneConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "delta = \"disabled\"\ndiff_view = \"side-by-side\"\nhistory_limit = 50\n",
        )
        .expect("write config");

        let config = ConfigStore::at(path).load().expect("load");
        assert_eq!(config.delta, DeltaMode::Disabled);
        assert_eq!(config.diff_view, DiffViewMode::SideBySide);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.git_binary, "git");
        assert!(config.watch);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(&path, "delta = \"sometimes\"\n").expect("write config");
        assert!(matches!(
            ConfigStore::at(path).load(),
            Err(GitPaneError::Config(_))
        ));
    }
}
