//! `~/.gitward/config.yaml` — which repository to drive and how.
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::paths;

pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MIN_GIT_VERSION: &str = "1.7";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8787";

/// Persisted gitward configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitwardConfig {
    /// Working tree of the managed repository (the site root).
    pub repo_path: PathBuf,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory holding `themes/` and `plugins/`; defaults to `<repo>/wp-content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    #[serde(default = "default_min_git_version")]
    pub min_git_version: String,
    /// Webhook listen address.
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Host name reported in webhook merge messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl GitwardConfig {
    /// Config for `repo_path` with every other field at its default.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            remote: default_remote(),
            branch: default_branch(),
            content_dir: None,
            lock_timeout_secs: default_lock_timeout_secs(),
            min_git_version: default_min_git_version(),
            listen: default_listen(),
            server_name: None,
            created_at: Utc::now(),
        }
    }

    pub fn content_dir(&self) -> PathBuf {
        self.content_dir
            .clone()
            .unwrap_or_else(|| self.repo_path.join("wp-content"))
    }

    pub fn themes_dir(&self) -> PathBuf {
        self.content_dir().join("themes")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.content_dir().join("plugins")
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_lock_timeout_secs() -> u64 {
    DEFAULT_LOCK_TIMEOUT_SECS
}

fn default_min_git_version() -> String {
    DEFAULT_MIN_GIT_VERSION.to_string()
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load `<home>/.gitward/config.yaml`.
///
/// Returns `CoreError::ConfigNotFound` if absent,
/// `CoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<GitwardConfig, CoreError> {
    let path = paths::config_path(home);
    if !path.exists() {
        return Err(CoreError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<GitwardConfig, CoreError> {
    load_at(&paths::home()?)
}

/// Atomically save the config.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &GitwardConfig) -> Result<(), CoreError> {
    let root = paths::gitward_root(home);
    if !root.exists() {
        std::fs::create_dir_all(&root).map_err(|e| io_err(&root, e))?;
        paths::set_dir_permissions(&root)?;
    }
    let path = paths::config_path(home);
    let tmp_path = path.with_extension("yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    paths::set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &GitwardConfig) -> Result<(), CoreError> {
    save_at(&paths::home()?, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_and_load_roundtrip() {
        let home = TempDir::new().unwrap();
        let mut config = GitwardConfig::new("/srv/site");
        config.branch = "main".to_string();
        config.server_name = Some("example.org".to_string());
        save_at(home.path(), &config).unwrap();

        let loaded = load_at(home.path()).unwrap();
        assert_eq!(loaded, config);
        assert!(!paths::config_path(home.path()).with_extension("yaml.tmp").exists());
    }

    #[test]
    fn missing_config_is_reported() {
        let home = TempDir::new().unwrap();
        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let home = TempDir::new().unwrap();
        let path = paths::config_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "repo_path: /srv/site\n").unwrap();

        let config = load_at(home.path()).unwrap();
        assert_eq!(config.remote, "origin");
        assert_eq!(config.branch, "master");
        assert_eq!(config.min_git_version, "1.7");
        assert_eq!(config.lock_timeout(), Duration::from_secs(30));
        assert_eq!(config.plugins_dir(), PathBuf::from("/srv/site/wp-content/plugins"));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let home = TempDir::new().unwrap();
        let path = paths::config_path(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "repo_path: [unclosed\n").unwrap();

        let err = load_at(home.path()).unwrap_err();
        assert!(matches!(err, CoreError::Parse { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn explicit_content_dir_overrides_default() {
        let mut config = GitwardConfig::new("/srv/site");
        config.content_dir = Some(PathBuf::from("/srv/shared/content"));
        assert_eq!(config.themes_dir(), PathBuf::from("/srv/shared/content/themes"));
    }
}
