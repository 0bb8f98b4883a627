//! `gitward serve` — webhook server in the foreground.

use anyhow::{Context, Result};
use clap::Args;

use gitward_core::{OptionStore, WEBHOOK_KEY_OPTION};
use gitward_daemon::start_blocking;

use super::load_context;

/// Arguments for `gitward serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding the configured one.
    #[arg(long)]
    pub listen: Option<String>,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = load_context()?;

        let key = OptionStore::at(&home)
            .get_string(WEBHOOK_KEY_OPTION)
            .context("failed to read webhook key")?;
        if key.is_empty() {
            eprintln!(
                "warning: no webhook key set; every call will be rejected. \
                 Set one with `gitward option set {WEBHOOK_KEY_OPTION} <key>`."
            );
        }

        start_blocking(&home, config, self.listen).context("webhook server exited with error")?;
        Ok(())
    }
}
