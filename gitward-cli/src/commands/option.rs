//! `gitward option get|set|unset <key> [value]`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use gitward_core::OptionStore;

/// Read or write persisted options.
#[derive(Subcommand, Debug)]
pub enum OptionCommand {
    /// Print an option's value (JSON for structured values).
    Get(KeyArgs),
    /// Store a string value.
    Set(SetArgs),
    /// Remove an option.
    Unset(KeyArgs),
}

#[derive(Args, Debug)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
}

pub fn run(command: OptionCommand) -> Result<()> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let store = OptionStore::at(&home);

    match command {
        OptionCommand::Get(args) => {
            let value: Option<Value> = store
                .get(&args.key)
                .with_context(|| format!("failed to read option '{}'", args.key))?;
            match value {
                Some(Value::String(text)) => println!("{text}"),
                Some(other) => println!(
                    "{}",
                    serde_json::to_string_pretty(&other).context("failed to serialize option")?
                ),
                None => eprintln!("option '{}' is not set", args.key),
            }
        }
        OptionCommand::Set(args) => {
            store
                .set(&args.key, args.value.as_str())
                .with_context(|| format!("failed to write option '{}'", args.key))?;
            println!("✓ set '{}'", args.key);
        }
        OptionCommand::Unset(args) => {
            let removed = store
                .unset(&args.key)
                .with_context(|| format!("failed to remove option '{}'", args.key))?;
            if removed {
                println!("✓ removed '{}'", args.key);
            } else {
                println!("option '{}' was not set", args.key);
            }
        }
    }
    Ok(())
}
