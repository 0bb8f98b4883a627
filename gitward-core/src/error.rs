//! Error types for gitward-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration, option store, and snapshot
/// persistence.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (config save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on config load, with the offending file path.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON error reading or writing an option document.
    #[error("option `{key}` JSON error: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Option keys are used as file names and must stay within `[A-Za-z0-9_-]`.
    #[error("invalid option key `{0}`")]
    InvalidOptionKey(String),

    /// `dirs::home_dir()` returned `None`, so `~/.gitward/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `gitward init` first")]
    ConfigNotFound { path: PathBuf },
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
