//! `gitward hook <event>` — entry point for host platform callbacks.
//!
//! Always exits successfully: a failed commit must never fail the platform
//! action that fired the hook. Failures go to the log.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gitward_sync::{HookEvent, HookOutcome, HookPayload, HookRegistry, SyncCoordinator};

use super::load_context;

/// Arguments for `gitward hook`.
#[derive(Args, Debug)]
pub struct HookArgs {
    /// post-install | process-complete | post-activate | post-deactivate |
    /// load-plugins | load-themes
    pub event: HookEvent,

    /// Unit type for post-install: theme | plugin.
    #[arg(long = "type", value_name = "TYPE")]
    pub unit_type: Option<String>,

    /// Install action for post-install: install | update.
    #[arg(long)]
    pub action: Option<String>,

    /// Directory the package was installed into (post-install).
    #[arg(long)]
    pub destination: Option<PathBuf>,

    /// Plugin key for activation events (e.g. hello-dolly/hello.php).
    #[arg(long)]
    pub unit: Option<String>,

    /// The list page's `deleted` flag (load-plugins / load-themes).
    #[arg(long)]
    pub deleted: Option<String>,
}

impl HookArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = match load_context() {
            Ok(ctx) => ctx,
            Err(err) => {
                eprintln!("gitward: {} hook skipped: {err:#}", self.event);
                return Ok(());
            }
        };
        let coordinator = SyncCoordinator::from_config(&home, &config);

        let payload = HookPayload {
            unit_type: self.unit_type,
            action: self.action,
            destination: self.destination,
            unit: self.unit,
            deleted: self.deleted,
        };
        match HookRegistry::with_defaults().dispatch(self.event, &payload, &coordinator) {
            HookOutcome::Ignored => {}
            HookOutcome::Synced(outcome) => {
                if let Some(message) = outcome.committed {
                    println!("✓ committed: {message}");
                }
                if outcome.pushed {
                    println!("✓ synced with {}/{}", config.remote, config.branch);
                }
            }
            HookOutcome::Failed(message) => {
                eprintln!("gitward: {} hook failed: {message}", self.event);
            }
        }
        Ok(())
    }
}
