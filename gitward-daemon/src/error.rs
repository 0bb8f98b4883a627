use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the webhook server and its runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address '{addr}': {source}")]
    InvalidListen {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("core error: {0}")]
    Core(#[from] gitward_core::CoreError),

    #[error("sync error: {0}")]
    Sync(#[from] gitward_sync::SyncError),

    #[error("server error: {0}")]
    Server(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
