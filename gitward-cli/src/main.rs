//! gitward — commit and sync plugin/theme changes of a site checkout.
//!
//! # Usage
//!
//! ```text
//! gitward init <repo> [--remote origin] [--branch master] [--content-dir <dir>]
//! gitward snapshot [--json]
//! gitward diff [--json]
//! gitward commit [--label <text>] [--dir <path>] [--push]
//! gitward pull
//! gitward hook <event> [--type theme|plugin] [--action install|update]
//!                      [--destination <dir>] [--unit <key>] [--deleted true]
//! gitward serve [--listen 127.0.0.1:8787]
//! gitward option get|set|unset <key> [value]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs,
    hook::HookArgs,
    init::InitArgs,
    option::OptionCommand,
    serve::ServeArgs,
    snapshot::SnapshotArgs,
    sync::{CommitArgs, PullArgs},
};
use gitward_daemon::{init_tracing, LogFormat};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "gitward",
    version,
    about = "Track plugin and theme changes of a site in git",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr (`RUST_LOG` overrides).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Point gitward at a repository and record the initial baseline.
    Init(InitArgs),

    /// Show the currently installed themes and plugins.
    Snapshot(SnapshotArgs),

    /// Show changes since the last baseline and the message they produce.
    Diff(DiffArgs),

    /// Stage, commit, and optionally pull + push.
    Commit(CommitArgs),

    /// Pull remote changes and push the merge.
    Pull(PullArgs),

    /// Handle a host platform event.
    Hook(HookArgs),

    /// Run the webhook server in the foreground.
    Serve(ServeArgs),

    /// Read or write persisted options.
    Option {
        #[command(subcommand)]
        command: OptionCommand,
    },
}

/// `warn` keeps one-shot commands quiet; the long-running server logs at
/// `info`. `--verbose` raises either to `debug`.
fn default_log_level(cli: &Cli) -> &'static str {
    match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve(_), false) => "info",
        _ => "warn",
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = default_log_level(&cli);
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(level, format);

    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Snapshot(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Commit(args) => args.run(),
        Commands::Pull(args) => args.run(),
        Commands::Hook(args) => args.run(),
        Commands::Serve(args) => args.run(),
        Commands::Option { command } => commands::option::run(command),
    }
}
