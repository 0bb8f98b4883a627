//! Cross-process repository lock.
//!
//! An advisory `fs2` exclusive lock on a file inside the repository's `.git`
//! directory. Independent processes (two hook invocations, a hook and the
//! webhook server) contend on the same file; a waiter gives up after a
//! bounded timeout instead of blocking forever.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{io_err, SyncError};

pub const LOCK_FILE_NAME: &str = "gitward.lock";
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `<repo>/.git/gitward.lock`, or `<repo>/.gitward.lock` when the repository
/// has no `.git` directory (worktrees, bare layouts).
pub fn lock_path_for(repo: &Path) -> PathBuf {
    let git_dir = repo.join(".git");
    if git_dir.is_dir() {
        git_dir.join(LOCK_FILE_NAME)
    } else {
        repo.join(format!(".{LOCK_FILE_NAME}"))
    }
}

/// Held repository lock; released on drop.
///
/// The lock file itself is left in place: deleting it would let a later
/// process lock a fresh inode while an earlier waiter still holds the old one.
#[derive(Debug)]
pub struct RepoLock {
    file: File,
    path: PathBuf,
}

impl RepoLock {
    /// Acquire the lock at `path`, polling until `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<RepoLock, SyncError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| io_err(path, e))?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::debug!(
                        "acquired repository lock {} after {:?}",
                        path.display(),
                        started.elapsed()
                    );
                    return Ok(RepoLock {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == fs2::lock_contended_error().kind() => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        tracing::warn!(
                            "gave up on repository lock {} after {waited:?}",
                            path.display()
                        );
                        return Err(SyncError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    sleep(LOCK_POLL_INTERVAL.min(timeout - waited));
                }
                Err(err) => return Err(io_err(path, err)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        // fs2::FileExt::unlock requires the trait in scope.
        if let Err(err) = FileExt::unlock(&self.file) {
            tracing::warn!("failed to release repository lock {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_lives_in_git_dir_when_present() {
        let repo = TempDir::new().unwrap();
        assert_eq!(lock_path_for(repo.path()), repo.path().join(".gitward.lock"));
        std::fs::create_dir(repo.path().join(".git")).unwrap();
        assert_eq!(lock_path_for(repo.path()), repo.path().join(".git/gitward.lock"));
    }

    #[test]
    fn second_holder_times_out() {
        let repo = TempDir::new().unwrap();
        let path = lock_path_for(repo.path());
        let _held = RepoLock::acquire(&path, Duration::from_secs(1)).unwrap();

        let started = Instant::now();
        let err = RepoLock::acquire(&path, Duration::from_millis(120)).unwrap_err();
        assert!(matches!(err, SyncError::LockTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn lock_is_reusable_after_drop() {
        let repo = TempDir::new().unwrap();
        let path = lock_path_for(repo.path());
        drop(RepoLock::acquire(&path, Duration::from_secs(1)).unwrap());
        let again = RepoLock::acquire(&path, Duration::from_millis(10)).unwrap();
        assert_eq!(again.path(), path);
        assert!(path.exists(), "lock file is kept between holders");
    }

    #[test]
    fn waiter_proceeds_once_holder_releases() {
        let repo = TempDir::new().unwrap();
        let path = lock_path_for(repo.path());
        let held = RepoLock::acquire(&path, Duration::from_secs(1)).unwrap();

        let waiter_path = path.clone();
        let waiter = std::thread::spawn(move || {
            RepoLock::acquire(&waiter_path, Duration::from_secs(5)).map(|_| ())
        });
        sleep(Duration::from_millis(100));
        drop(held);
        waiter.join().unwrap().unwrap();
    }
}
