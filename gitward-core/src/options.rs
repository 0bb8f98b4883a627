//! Persisted key-value option store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.gitward/
//!   options/
//!     git_all_versions.json     (inventory baseline — mode 0600)
//!     gitium_webhook_key.json   (webhook shared secret — mode 0600)
//! ```
//!
//! One JSON document per key. Every write goes to its own uniquely named
//! temporary file in the same directory which is then renamed over the
//! target, so a concurrent reader sees either the old or the new document,
//! never a partial one, and concurrent writers never share a temp file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::error::{io_err, CoreError};
use crate::paths;

/// Option holding the serialized inventory baseline.
pub const VERSIONS_OPTION: &str = "git_all_versions";

/// Option holding the webhook shared secret.
pub const WEBHOOK_KEY_OPTION: &str = "gitium_webhook_key";

/// Handle on the option directory under a gitward home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionStore {
    dir: PathBuf,
}

impl OptionStore {
    /// Store rooted at `<home>/.gitward/options/`. No I/O.
    pub fn at(home: &Path) -> Self {
        Self {
            dir: paths::options_dir(home),
        }
    }

    /// `OptionStore::at` convenience wrapper using `dirs::home_dir()`.
    pub fn open() -> Result<Self, CoreError> {
        Ok(Self::at(&paths::home()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<key>.json` — pure, no I/O.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, CoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Read and decode `key`, or `None` when it was never set.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CoreError> {
        let path = self.path_for(key)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(&path, err)),
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| CoreError::Json {
                key: key.to_string(),
                source,
            })
    }

    /// Encode and atomically write `value` under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;
        paths::set_dir_permissions(&self.dir)?;

        let json = serde_json::to_string_pretty(value).map_err(|source| CoreError::Json {
            key: key.to_string(),
            source,
        })?;
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}.json."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| io_err(&self.dir, e))?;
        write_document(&mut tmp, json.as_bytes())?;
        tmp.persist(&path).map_err(|e| io_err(&path, e.error))?;
        Ok(())
    }

    /// Remove `key`. Returns `false` when it was not set.
    pub fn unset(&self, key: &str) -> Result<bool, CoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&path, err)),
        }
    }

    /// String option, treating an unset key as empty.
    pub fn get_string(&self, key: &str) -> Result<String, CoreError> {
        Ok(self.get::<String>(key)?.unwrap_or_default())
    }
}

fn write_document(tmp: &mut NamedTempFile, bytes: &[u8]) -> Result<(), CoreError> {
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| io_err(tmp.path(), e))?;
    paths::set_file_permissions(tmp.path())
}

fn validate_key(key: &str) -> Result<(), CoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidOptionKey(key.to_string()))
    }
}
