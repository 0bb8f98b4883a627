pub mod diff;
pub mod hook;
pub mod init;
pub mod option;
pub mod serve;
pub mod snapshot;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use gitward_core::{config, GitwardConfig};

/// Home directory and the saved configuration.
pub(crate) fn load_context() -> Result<(PathBuf, GitwardConfig)> {
    let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
    let config = config::load_at(&home).context("failed to load config; run `gitward init` first")?;
    Ok((home, config))
}
