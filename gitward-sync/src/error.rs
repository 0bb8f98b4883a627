//! Error types for gitward-sync.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use gitward_core::CoreError;

use crate::git::{VcsError, VcsErrorKind};

/// All errors that can arise from repository sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Misconfiguration that makes syncing impossible (missing remote, git
    /// client below the minimum version, …).
    #[error("configuration error: {0}")]
    Config(String),

    /// Another trigger held the repository lock for longer than the timeout.
    #[error("timed out after {waited:?} waiting for repository lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    /// `add`/`commit`/`pull`/`push` failed; carries the client's message.
    #[error("git {op} failed: {message}")]
    GitClient { op: &'static str, message: String },

    /// Pull hit a merge conflict or push was rejected as non-fast-forward.
    #[error("git {op} could not merge: {message}")]
    MergeConflict { op: &'static str, message: String },

    /// Config, option store, or baseline failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<VcsError> for SyncError {
    fn from(err: VcsError) -> Self {
        match err.kind {
            VcsErrorKind::Conflict | VcsErrorKind::Rejected => SyncError::MergeConflict {
                op: err.op,
                message: err.message,
            },
            VcsErrorKind::Failed | VcsErrorKind::Spawn => SyncError::GitClient {
                op: err.op,
                message: err.message,
            },
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_push_maps_to_merge_conflict() {
        let err: SyncError = VcsError::new("push", VcsErrorKind::Rejected, "non-fast-forward").into();
        assert!(matches!(err, SyncError::MergeConflict { op: "push", .. }));
    }

    #[test]
    fn plain_failure_maps_to_client_error() {
        let err: SyncError = VcsError::new("add", VcsErrorKind::Failed, "pathspec did not match").into();
        assert_eq!(err.to_string(), "git add failed: pathspec did not match");
    }
}
