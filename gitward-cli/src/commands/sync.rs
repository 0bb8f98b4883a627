//! `gitward commit` and `gitward pull` — drive the sync coordinator directly.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gitward_core::SyncRequest;
use gitward_sync::{CommitOutcome, SyncCoordinator};

use super::load_context;

/// Arguments for `gitward commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Action label prepended to the commit message (e.g. "update plugin").
    #[arg(long)]
    pub label: Option<String>,

    /// Directory to stage, absolute or relative to the repository root.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Pull and push after committing.
    #[arg(long)]
    pub push: bool,
}

impl CommitArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = load_context()?;
        let coordinator = SyncCoordinator::from_config(&home, &config);

        let mut request = SyncRequest::new(self.dir).with_push(self.push);
        if let Some(label) = self.label {
            request = request.with_label(label);
        }

        let outcome = coordinator
            .commit_and_sync(&request)
            .with_context(|| format!("commit failed in '{}'", config.repo_path.display()))?;
        print_outcome(&outcome, &config.remote, &config.branch);
        Ok(())
    }
}

/// Arguments for `gitward pull`.
#[derive(Args, Debug)]
pub struct PullArgs {}

impl PullArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = load_context()?;
        let coordinator = SyncCoordinator::from_config(&home, &config);

        coordinator
            .require_version(&config.min_git_version)
            .context("git client check failed")?;
        let outcome = coordinator
            .pull_merge_push()
            .with_context(|| format!("pull failed in '{}'", config.repo_path.display()))?;
        print_outcome(&outcome, &config.remote, &config.branch);
        Ok(())
    }
}

fn print_outcome(outcome: &CommitOutcome, remote: &str, branch: &str) {
    match &outcome.committed {
        Some(message) => println!("✓ committed: {message}"),
        None if outcome.pulled => {}
        None => println!("✓ nothing to commit"),
    }
    if outcome.pushed {
        println!("✓ synced with {remote}/{branch}");
    }
    println!("  ({} ms)", outcome.duration_ms);
}
