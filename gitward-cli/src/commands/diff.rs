//! `gitward diff` — pending inventory changes and the commit message they
//! would produce.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use gitward_core::{ChangeEntry, ChangeKind};
use gitward_sync::{format_message, SyncCoordinator};

use super::load_context;

/// Arguments for `gitward diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Label to prepend to the message preview.
    #[arg(long)]
    pub label: Option<String>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct DiffJson<'a> {
    message: String,
    changes: &'a [ChangeEntry],
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = load_context()?;
        let coordinator = SyncCoordinator::from_config(&home, &config);

        let changes = coordinator
            .pending_changes()
            .context("failed to compute pending changes")?;
        let message = format_message(self.label.as_deref(), &changes);

        if self.json {
            let payload = DiffJson {
                message,
                changes: &changes,
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize diff JSON")?
            );
            return Ok(());
        }

        if changes.is_empty() {
            println!("No inventory changes since the last baseline.");
            return Ok(());
        }

        for change in &changes {
            let marker = match change.kind {
                ChangeKind::Added => "+".green().bold(),
                ChangeKind::Removed => "-".red().bold(),
                ChangeKind::Updated => "~".yellow().bold(),
            };
            let versions = match (&change.previous_version, &change.new_version) {
                (Some(old), Some(new)) if old != new => format!(" ({old} → {new})"),
                _ => String::new(),
            };
            println!(
                "  {marker} {} {}{versions}",
                change.category.singular().bright_black(),
                change.label()
            );
        }
        println!("\nmessage: {message}");
        Ok(())
    }
}
