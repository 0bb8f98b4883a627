//! `gitward init <repo> [--remote] [--branch] [--content-dir]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gitward_core::config::{self, DEFAULT_BRANCH, DEFAULT_REMOTE};
use gitward_core::{capture, Category, FsInventory, GitwardConfig, SnapshotStore};

/// Point gitward at a repository and record the initial baseline.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Working tree of the site repository.
    pub repo: PathBuf,

    /// Remote to pull from and push to.
    #[arg(long, default_value = DEFAULT_REMOTE)]
    pub remote: String,

    /// Branch to pull and push.
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Directory holding `themes/` and `plugins/` (default: <repo>/wp-content).
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Host name reported in webhook merge messages.
    #[arg(long)]
    pub server_name: Option<String>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let repo = self
            .repo
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.repo.display()))?;

        let mut config = GitwardConfig::new(repo.clone());
        config.remote = self.remote;
        config.branch = self.branch;
        config.server_name = self.server_name;
        if let Some(dir) = self.content_dir {
            let dir = dir
                .canonicalize()
                .with_context(|| format!("cannot resolve content dir '{}'", dir.display()))?;
            config.content_dir = Some(dir);
        }

        config::save_at(&home, &config)
            .with_context(|| format!("failed to save config for '{}'", repo.display()))?;

        let snapshot = capture(&FsInventory::from_config(&config));
        SnapshotStore::at(&home)
            .save(&snapshot)
            .context("failed to save initial baseline")?;

        println!(
            "✓ Tracking '{}' ({}/{})",
            repo.display(),
            config.remote,
            config.branch
        );
        println!(
            "  Baseline: {} theme(s), {} plugin(s)",
            snapshot.entries(Category::Themes).len(),
            snapshot.entries(Category::Plugins).len()
        );
        println!("  Saved to: ~/.gitward/config.yaml");
        Ok(())
    }
}
