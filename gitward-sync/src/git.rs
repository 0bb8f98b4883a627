//! Version-control client contract and its `git` command-line implementation.
//!
//! [`GitCli`] shells out to the system `git` binary with `-C <repo>` for every
//! call. `GIT_TERMINAL_PROMPT=0` keeps a missing credential from hanging a
//! hook forever. Output is classified by its text, so every command runs
//! under the C locale.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Mutex;

/// Broad class of a client failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsErrorKind {
    /// The git binary could not be started.
    Spawn,
    /// The command ran and failed.
    Failed,
    /// `pull` stopped on a merge conflict.
    Conflict,
    /// `push` was rejected (non-fast-forward).
    Rejected,
}

/// Failure reported by a [`VcsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsError {
    pub op: &'static str,
    pub kind: VcsErrorKind,
    pub message: String,
}

impl VcsError {
    pub fn new(op: &'static str, kind: VcsErrorKind, message: impl Into<String>) -> Self {
        Self {
            op,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for VcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "git {} failed: {}", self.op, self.message)
    }
}

impl std::error::Error for VcsError {}

/// The minimal repository operations the coordinator needs.
pub trait VcsClient: Send + Sync {
    /// Stage every change under `path` (relative to the repository root).
    fn add(&self, path: &Path) -> Result<(), VcsError>;
    /// Commit staged changes. `Ok(false)` when there was nothing to commit.
    fn commit(&self, message: &str) -> Result<bool, VcsError>;
    /// Fetch and merge `branch` from `remote`.
    fn pull(&self, remote: &str, branch: &str) -> Result<(), VcsError>;
    fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError>;
    /// Staged, unstaged, or untracked changes exist.
    fn is_dirty(&self) -> Result<bool, VcsError>;
    /// Client version, e.g. `2.39.2`.
    fn version(&self) -> Result<String, VcsError>;
    /// Message of the most recent failure, if any.
    fn last_error(&self) -> Option<String>;
}

// ---------------------------------------------------------------------------
// git CLI
// ---------------------------------------------------------------------------

/// [`VcsClient`] backed by the `git` executable.
#[derive(Debug)]
pub struct GitCli {
    repo: PathBuf,
    program: PathBuf,
    last_error: Mutex<Option<String>>,
}

impl GitCli {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            program: PathBuf::from("git"),
            last_error: Mutex::new(None),
        }
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn run<I, S>(&self, op: &'static str, args: I) -> Result<Output, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = self.command(args);
        tracing::debug!("running git {op} in {}", self.repo.display());
        let output = cmd.output().map_err(|err| {
            self.record(VcsError::new(
                op,
                VcsErrorKind::Spawn,
                format!("failed to spawn {}: {err}", self.program.display()),
            ))
        })?;
        Ok(output)
    }

    fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C")
            .arg(&self.repo)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .env("LANGUAGE", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Run and require success; failures become [`VcsErrorKind::Failed`].
    fn run_ok<I, S>(&self, op: &'static str, args: I) -> Result<Output, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(op, args)?;
        if output.status.success() {
            return Ok(output);
        }
        Err(self.record(VcsError::new(op, VcsErrorKind::Failed, describe(&output))))
    }

    fn record(&self, err: VcsError) -> VcsError {
        if let Ok(mut slot) = self.last_error.lock() {
            *slot = Some(err.message.clone());
        }
        err
    }
}

impl VcsClient for GitCli {
    fn add(&self, path: &Path) -> Result<(), VcsError> {
        // `--all` so deletions under `path` are staged too.
        self.run_ok("add", [OsStr::new("add"), OsStr::new("--all"), OsStr::new("--"), path.as_os_str()])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<bool, VcsError> {
        let output = self.run("commit", ["commit", "-m", message])?;
        if output.status.success() {
            return Ok(true);
        }
        let text = combined(&output);
        if is_nothing_to_commit(&text) {
            tracing::debug!("git commit: nothing to commit");
            return Ok(false);
        }
        Err(self.record(VcsError::new("commit", VcsErrorKind::Failed, describe(&output))))
    }

    fn pull(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        let output = self.run("pull", ["pull", "--no-rebase", "--no-edit", remote, branch])?;
        if output.status.success() {
            return Ok(());
        }
        let text = combined(&output);
        if is_missing_remote_ref(&text) {
            tracing::info!("remote branch {remote}/{branch} does not exist yet; nothing to merge");
            return Ok(());
        }
        if is_merge_conflict(&text) {
            if let Err(err) = self.run_ok("merge --abort", ["merge", "--abort"]) {
                tracing::warn!("could not abort conflicted merge: {err}");
            }
            return Err(self.record(VcsError::new("pull", VcsErrorKind::Conflict, describe(&output))));
        }
        Err(self.record(VcsError::new("pull", VcsErrorKind::Failed, describe(&output))))
    }

    fn push(&self, remote: &str, branch: &str) -> Result<(), VcsError> {
        let output = self.run("push", ["push", remote, branch])?;
        if output.status.success() {
            return Ok(());
        }
        let kind = if is_rejected_push(&combined(&output)) {
            VcsErrorKind::Rejected
        } else {
            VcsErrorKind::Failed
        };
        Err(self.record(VcsError::new("push", kind, describe(&output))))
    }

    fn is_dirty(&self) -> Result<bool, VcsError> {
        let output = self.run_ok("status", ["status", "--porcelain"])?;
        Ok(!output.stdout.iter().all(u8::is_ascii_whitespace))
    }

    fn version(&self) -> Result<String, VcsError> {
        let output = self.run_ok("version", ["--version"])?;
        let text = String::from_utf8_lossy(&output.stdout);
        parse_version(&text).ok_or_else(|| {
            self.record(VcsError::new(
                "version",
                VcsErrorKind::Failed,
                format!("unrecognised version output: {}", text.trim()),
            ))
        })
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }
}

fn combined(output: &Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn describe(output: &Output) -> String {
    let streams = [&output.stderr, &output.stdout];
    let detail: Vec<String> = streams
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    format!("(status {}) {}", output.status, detail.join("\n"))
}

fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit")
        || text.contains("nothing added to commit")
        || text.contains("no changes added to commit")
}

fn is_missing_remote_ref(text: &str) -> bool {
    text.contains("couldn't find remote ref")
}

fn is_merge_conflict(text: &str) -> bool {
    text.contains("CONFLICT") || text.contains("Automatic merge failed")
}

fn is_rejected_push(text: &str) -> bool {
    text.contains("[rejected]") || text.contains("non-fast-forward")
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Extract the dotted version from `git --version` output
/// (`git version 2.39.2 (Apple Git-143)` → `2.39.2`).
pub fn parse_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|word| word.starts_with(|c: char| c.is_ascii_digit()))
        .map(|word| word.trim_end_matches('.').to_string())
}

/// Numeric, component-wise `actual >= minimum`. Missing components count as
/// zero; non-numeric suffixes within a component are ignored (`2.39.windows`).
pub fn version_at_least(actual: &str, minimum: &str) -> bool {
    let actual = numeric_components(actual);
    let minimum = numeric_components(minimum);
    let len = actual.len().max(minimum.len());
    for i in 0..len {
        let a = actual.get(i).copied().unwrap_or(0);
        let m = minimum.get(i).copied().unwrap_or(0);
        if a != m {
            return a > m;
        }
    }
    true
}

fn numeric_components(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}
