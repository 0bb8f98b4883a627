//! Serialized commit / pull / push against one repository.
//!
//! Every mutation of the repository or of the inventory baseline happens
//! while holding the cross-process [`RepoLock`]. A failed step aborts the
//! rest, releases the lock, and leaves the baseline untouched so the next
//! successful run recomputes the same pending changes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use gitward_core::{
    capture, ChangeEntry, FsInventory, GitwardConfig, InventoryProvider, SnapshotStore,
    SyncRequest,
};

use crate::diff::diff;
use crate::error::SyncError;
use crate::git::{version_at_least, GitCli, VcsClient};
use crate::lock::{lock_path_for, RepoLock};
use crate::message;

/// Where and how the coordinator syncs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub repo_root: PathBuf,
    pub remote: String,
    pub branch: String,
    pub lock_path: PathBuf,
    pub lock_timeout: Duration,
}

impl CoordinatorSettings {
    pub fn from_config(config: &GitwardConfig) -> Self {
        Self {
            repo_root: config.repo_path.clone(),
            remote: config.remote.clone(),
            branch: config.branch.clone(),
            lock_path: lock_path_for(&config.repo_path),
            lock_timeout: config.lock_timeout(),
        }
    }
}

/// Result of one coordinator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    /// Message of the commit created, if any.
    pub committed: Option<String>,
    /// Inventory changes the commit message was built from.
    pub changes: Vec<ChangeEntry>,
    pub pulled: bool,
    pub pushed: bool,
    pub duration_ms: u128,
}

/// Owns the repository client and serializes every operation on it.
pub struct SyncCoordinator {
    client: Arc<dyn VcsClient>,
    inventory: Arc<dyn InventoryProvider>,
    store: SnapshotStore,
    settings: CoordinatorSettings,
}

impl SyncCoordinator {
    pub fn new(
        client: Arc<dyn VcsClient>,
        inventory: Arc<dyn InventoryProvider>,
        store: SnapshotStore,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            client,
            inventory,
            store,
            settings,
        }
    }

    /// Coordinator driving the `git` binary and the on-disk content directory
    /// described by `config`, with the baseline stored under `home`.
    pub fn from_config(home: &Path, config: &GitwardConfig) -> Self {
        Self::new(
            Arc::new(GitCli::new(&config.repo_path)),
            Arc::new(FsInventory::from_config(config)),
            SnapshotStore::at(home),
            CoordinatorSettings::from_config(config),
        )
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn client(&self) -> &dyn VcsClient {
        self.client.as_ref()
    }

    pub fn inventory(&self) -> &dyn InventoryProvider {
        self.inventory.as_ref()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Changes between the saved baseline and the current inventory.
    ///
    /// Reads without the lock; a slightly stale baseline only affects
    /// informational output.
    pub fn pending_changes(&self) -> Result<Vec<ChangeEntry>, SyncError> {
        let baseline = self.store.load()?;
        Ok(diff(&baseline, &capture(self.inventory.as_ref())))
    }

    /// The message [`commit_and_sync`](Self::commit_and_sync) would use for
    /// `request` given `changes`.
    pub fn message_for(&self, request: &SyncRequest, changes: &[ChangeEntry]) -> String {
        let label = request.action_label.as_deref();
        match (&request.subject, changes.is_empty()) {
            (Some(subject), true) => message::format(label, &[subject.as_change()]),
            _ => message::format(label, changes),
        }
    }

    /// Stage, commit if dirty, optionally pull + push, then advance the
    /// baseline.
    pub fn commit_and_sync(&self, request: &SyncRequest) -> Result<CommitOutcome, SyncError> {
        let started = Instant::now();
        let _lock = self.lock()?;

        let target = self.relative_target(&request.target_directory);
        self.client.add(&target)?;

        let mut outcome = CommitOutcome::default();
        if self.client.is_dirty()? {
            let baseline = self.store.load()?;
            let changes = diff(&baseline, &capture(self.inventory.as_ref()));
            let message = self.message_for(request, &changes);
            if self.client.commit(&message)? {
                tracing::info!("committed: {message}");
                outcome.committed = Some(message);
            } else {
                tracing::debug!("nothing staged under {}; no commit", target.display());
            }
            outcome.changes = changes;
        } else {
            tracing::debug!("working tree clean; skipping commit");
        }

        if request.should_push {
            self.pull_and_push()?;
            outcome.pulled = true;
            outcome.pushed = true;
        }

        self.store.save(&capture(self.inventory.as_ref()))?;
        outcome.duration_ms = started.elapsed().as_millis();
        Ok(outcome)
    }

    /// Accept remote merges: pull, then push, without staging local changes.
    pub fn pull_merge_push(&self) -> Result<CommitOutcome, SyncError> {
        let started = Instant::now();
        let _lock = self.lock()?;
        self.pull_and_push()?;
        self.store.save(&capture(self.inventory.as_ref()))?;
        Ok(CommitOutcome {
            pulled: true,
            pushed: true,
            duration_ms: started.elapsed().as_millis(),
            ..CommitOutcome::default()
        })
    }

    /// Client version string.
    pub fn git_version(&self) -> Result<String, SyncError> {
        Ok(self.client.version()?)
    }

    /// Fail with [`SyncError::Config`] unless the client is at least `minimum`.
    pub fn require_version(&self, minimum: &str) -> Result<String, SyncError> {
        let version = self.git_version()?;
        if version_at_least(&version, minimum) {
            Ok(version)
        } else {
            Err(SyncError::Config(format!(
                "git {version} is older than the required {minimum}"
            )))
        }
    }

    fn pull_and_push(&self) -> Result<(), SyncError> {
        let CoordinatorSettings { remote, branch, .. } = &self.settings;
        if remote.trim().is_empty() || branch.trim().is_empty() {
            return Err(SyncError::Config(
                "no remote/branch configured to sync with".to_string(),
            ));
        }
        self.client.pull(remote, branch)?;
        self.client.push(remote, branch)?;
        tracing::info!("synced with {remote}/{branch}");
        Ok(())
    }

    fn lock(&self) -> Result<RepoLock, SyncError> {
        RepoLock::acquire(&self.settings.lock_path, self.settings.lock_timeout)
    }

    fn relative_target(&self, target: &Path) -> PathBuf {
        if target.as_os_str().is_empty() {
            return PathBuf::from(".");
        }
        match target.strip_prefix(&self.settings.repo_root) {
            Ok(rest) if rest.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rest) => rest.to_path_buf(),
            Err(_) => target.to_path_buf(),
        }
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
