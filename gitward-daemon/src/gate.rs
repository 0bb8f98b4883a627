//! Webhook authentication and the pull / merge / push it triggers.
//!
//! The gate is transport-agnostic: it takes an explicit [`WebhookRequest`]
//! plus the stored key and returns a status with a plain-text body. The HTTP
//! layer in [`crate::server`] only extracts and forwards.

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Local;
use subtle::ConstantTimeEq;
use thiserror::Error;

use gitward_sync::{SyncCoordinator, SyncError};

/// Host reported when neither a configured name nor a `Host` header exists.
const FALLBACK_HOST: &str = "localhost";

/// Parsed inbound trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookRequest {
    /// `?key=` query value.
    pub key: Option<String>,
    /// `Host` header, used in the success message.
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum GateError {
    /// Missing, wrong, or unconfigured key.
    #[error("Cheating uh?")]
    Unauthorized,

    #[error("gitward requires minimum git version {minimum}")]
    GitTooOld { minimum: String },

    /// The client version could not be determined at all.
    #[error("Could not run git: {0}")]
    GitUnavailable(#[source] SyncError),

    #[error("Failed merge & push: {0}")]
    Sync(#[source] SyncError),
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::Unauthorized => StatusCode::FORBIDDEN,
            GateError::GitTooOld { .. } | GateError::GitUnavailable(_) | GateError::Sync(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Authenticates triggers and runs the coordinator's pull-only path.
#[derive(Debug)]
pub struct WebhookGate {
    coordinator: Arc<SyncCoordinator>,
    min_git_version: String,
    server_name: Option<String>,
}

impl WebhookGate {
    pub fn new(coordinator: Arc<SyncCoordinator>, min_git_version: impl Into<String>) -> Self {
        Self {
            coordinator,
            min_git_version: min_git_version.into(),
            server_name: None,
        }
    }

    /// Report `name` in merge messages instead of the request's `Host`.
    pub fn with_server_name(mut self, name: Option<String>) -> Self {
        self.server_name = name.filter(|n| !n.is_empty());
        self
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Authenticate, check the client version, pull + push, and render the
    /// outcome as an HTTP status and body.
    pub fn handle(&self, request: &WebhookRequest, stored_key: &str) -> WebhookResponse {
        match self.try_handle(request, stored_key) {
            Ok(body) => WebhookResponse {
                status: StatusCode::OK,
                body,
            },
            Err(err) => {
                match &err {
                    GateError::Unauthorized => tracing::warn!(host = ?request.host, "rejected webhook call"),
                    other => tracing::error!(error = %other, "webhook sync failed"),
                }
                WebhookResponse {
                    status: err.status(),
                    body: err.to_string(),
                }
            }
        }
    }

    /// [`handle`](Self::handle) without the HTTP rendering.
    pub fn try_handle(&self, request: &WebhookRequest, stored_key: &str) -> Result<String, GateError> {
        authorize(request.key.as_deref().unwrap_or_default(), stored_key)?;

        self.coordinator
            .require_version(&self.min_git_version)
            .map_err(|err| match err {
                SyncError::Config(reason) => {
                    tracing::warn!(%reason, "git client below minimum version");
                    GateError::GitTooOld {
                        minimum: self.min_git_version.clone(),
                    }
                }
                other => GateError::GitUnavailable(other),
            })?;

        let outcome = self.coordinator.pull_merge_push().map_err(GateError::Sync)?;
        tracing::info!(duration_ms = outcome.duration_ms as u64, "webhook merge complete");
        Ok(format!(
            "Merged changes from {} on {}",
            self.host_name(request),
            Local::now().format("%m.%d.%Y")
        ))
    }

    fn host_name<'a>(&'a self, request: &'a WebhookRequest) -> &'a str {
        self.server_name
            .as_deref()
            .or(request.host.as_deref())
            .filter(|h| !h.is_empty())
            .unwrap_or(FALLBACK_HOST)
    }
}

/// Fails closed: an empty stored key rejects every caller, including one
/// that also sends an empty key.
pub fn authorize(provided: &str, stored: &str) -> Result<(), GateError> {
    if stored.is_empty() {
        return Err(GateError::Unauthorized);
    }
    if bool::from(provided.as_bytes().ct_eq(stored.as_bytes())) {
        Ok(())
    } else {
        Err(GateError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use gitward_core::{InventoryProvider, SnapshotStore, UnitRecord};
    use gitward_sync::{CoordinatorSettings, VcsClient, VcsError, VcsErrorKind};
    use tempfile::TempDir;

    use super::*;

    struct StubGit {
        /// Empty means the binary cannot be spawned.
        version: &'static str,
        push_error: bool,
        pulls: AtomicUsize,
    }

    impl VcsClient for StubGit {
        fn add(&self, _path: &Path) -> Result<(), VcsError> {
            Ok(())
        }
        fn commit(&self, _message: &str) -> Result<bool, VcsError> {
            Ok(true)
        }
        fn pull(&self, _remote: &str, _branch: &str) -> Result<(), VcsError> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn push(&self, _remote: &str, _branch: &str) -> Result<(), VcsError> {
            if self.push_error {
                Err(VcsError::new("push", VcsErrorKind::Rejected, "non-fast-forward"))
            } else {
                Ok(())
            }
        }
        fn is_dirty(&self) -> Result<bool, VcsError> {
            Ok(false)
        }
        fn version(&self) -> Result<String, VcsError> {
            if self.version.is_empty() {
                return Err(VcsError::new(
                    "version",
                    VcsErrorKind::Spawn,
                    "failed to spawn git: No such file or directory (os error 2)",
                ));
            }
            Ok(self.version.to_string())
        }
        fn last_error(&self) -> Option<String> {
            None
        }
    }

    struct EmptySite;

    impl InventoryProvider for EmptySite {
        fn list_installed_themes(&self) -> Vec<UnitRecord> {
            Vec::new()
        }
        fn list_installed_plugins(&self) -> Vec<UnitRecord> {
            Vec::new()
        }
    }

    fn gate(dir: &TempDir, version: &'static str, push_error: bool) -> (WebhookGate, Arc<StubGit>) {
        let git = Arc::new(StubGit {
            version,
            push_error,
            pulls: AtomicUsize::new(0),
        });
        let settings = CoordinatorSettings {
            repo_root: dir.path().to_path_buf(),
            remote: "origin".into(),
            branch: "master".into(),
            lock_path: dir.path().join(".gitward.lock"),
            lock_timeout: Duration::from_secs(2),
        };
        let coordinator = SyncCoordinator::new(
            git.clone(),
            Arc::new(EmptySite),
            SnapshotStore::at(dir.path()),
            settings,
        );
        (WebhookGate::new(Arc::new(coordinator), "1.7"), git)
    }

    fn request(key: &str) -> WebhookRequest {
        WebhookRequest {
            key: Some(key.to_string()),
            host: Some("example.org".to_string()),
        }
    }

    #[test]
    fn empty_stored_key_always_forbidden() {
        assert!(matches!(authorize("", ""), Err(GateError::Unauthorized)));
        assert!(matches!(authorize("anything", ""), Err(GateError::Unauthorized)));
    }

    #[test]
    fn key_must_match_exactly() {
        assert!(authorize("s3cret", "s3cret").is_ok());
        assert!(authorize("s3cre", "s3cret").is_err());
        assert!(authorize("s3cret ", "s3cret").is_err());
        assert!(authorize("", "s3cret").is_err());
    }

    #[test]
    fn wrong_key_is_403_and_does_not_pull() {
        let dir = TempDir::new().unwrap();
        let (gate, git) = gate(&dir, "2.39.2", false);
        let response = gate.handle(&request("nope"), "s3cret");
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(response.body, "Cheating uh?");
        assert_eq!(git.pulls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_key_is_403() {
        let dir = TempDir::new().unwrap();
        let (gate, _) = gate(&dir, "2.39.2", false);
        let response = gate.handle(&WebhookRequest::default(), "s3cret");
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn old_git_is_500_without_syncing() {
        let dir = TempDir::new().unwrap();
        let (gate, git) = gate(&dir, "1.6.4", false);
        let response = gate.handle(&request("s3cret"), "s3cret");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "gitward requires minimum git version 1.7");
        assert_eq!(git.pulls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_git_is_500_with_client_message() {
        let dir = TempDir::new().unwrap();
        let (gate, git) = gate(&dir, "", false);
        let response = gate.handle(&request("s3cret"), "s3cret");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.starts_with("Could not run git: "), "{}", response.body);
        assert!(response.body.contains("failed to spawn git"), "{}", response.body);
        assert!(!response.body.contains("minimum git version"), "{}", response.body);
        assert_eq!(git.pulls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn host_falls_back_to_localhost() {
        let dir = TempDir::new().unwrap();
        let (gate, _) = gate(&dir, "2.39.2", false);
        let request = WebhookRequest {
            key: Some("s3cret".into()),
            host: None,
        };
        let body = gate.try_handle(&request, "s3cret").unwrap();
        assert!(body.starts_with("Merged changes from localhost on "), "{body}");
    }

    #[test]
    fn success_names_host_and_date() {
        let dir = TempDir::new().unwrap();
        let (gate, git) = gate(&dir, "2.39.2", false);
        let response = gate.handle(&request("s3cret"), "s3cret");
        assert_eq!(response.status, StatusCode::OK);
        let expected = format!(
            "Merged changes from example.org on {}",
            Local::now().format("%m.%d.%Y")
        );
        assert_eq!(response.body, expected);
        assert_eq!(git.pulls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn configured_server_name_wins_over_host_header() {
        let dir = TempDir::new().unwrap();
        let (gate, _) = gate(&dir, "2.39.2", false);
        let gate = gate.with_server_name(Some("blog.internal".into()));
        let body = gate.try_handle(&request("s3cret"), "s3cret").unwrap();
        assert!(body.starts_with("Merged changes from blog.internal on "), "{body}");
    }

    #[test]
    fn sync_failure_is_500_with_error_text() {
        let dir = TempDir::new().unwrap();
        let (gate, _) = gate(&dir, "2.39.2", true);
        let response = gate.handle(&request("s3cret"), "s3cret");
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.body.starts_with("Failed merge & push: "), "{}", response.body);
        assert!(response.body.contains("non-fast-forward"), "{}", response.body);
    }
}
