//! Well-known locations under the gitward home, plus permission helpers.
//!
//! Every function takes an explicit `home` so tests can root everything in a
//! `TempDir`; only [`home`] consults the environment.

use std::path::{Path, PathBuf};

use crate::error::{io_err, CoreError};

pub const CONFIG_FILE: &str = "config.yaml";
pub const OPTIONS_DIR: &str = "options";

pub fn gitward_root(home: &Path) -> PathBuf {
    home.join(".gitward")
}

pub fn config_path(home: &Path) -> PathBuf {
    gitward_root(home).join(CONFIG_FILE)
}

pub fn options_dir(home: &Path) -> PathBuf {
    gitward_root(home).join(OPTIONS_DIR)
}

/// The current user's home directory.
pub fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}

#[cfg(unix)]
pub(crate) fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
pub(crate) fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
pub(crate) fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_in_dot_gitward() {
        let home = Path::new("/home/site");
        assert_eq!(config_path(home), PathBuf::from("/home/site/.gitward/config.yaml"));
        assert_eq!(options_dir(home), PathBuf::from("/home/site/.gitward/options"));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(CoreError::HomeNotFound.to_string().contains("home directory"));
    }
}
