//! `gitward snapshot` — currently installed themes and plugins.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use gitward_core::{capture, FsInventory, InventorySnapshot, SnapshotStore};

use super::load_context;

/// Arguments for `gitward snapshot`.
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Show the saved baseline instead of a fresh capture.
    #[arg(long)]
    pub baseline: bool,
}

#[derive(Tabled)]
struct UnitRow {
    #[tabled(rename = "type")]
    category: String,
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "version")]
    version: String,
}

impl SnapshotArgs {
    pub fn run(self) -> Result<()> {
        let (home, config) = load_context()?;

        let snapshot = if self.baseline {
            SnapshotStore::at(&home)
                .load()
                .context("failed to load saved baseline")?
        } else {
            capture(&FsInventory::from_config(&config))
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot JSON")?
            );
            return Ok(());
        }

        print_table(&snapshot);
        Ok(())
    }
}

fn print_table(snapshot: &InventorySnapshot) {
    if snapshot.is_empty() {
        println!("No themes or plugins found.");
        return;
    }

    let rows: Vec<UnitRow> = snapshot
        .categories()
        .flat_map(|(category, entries)| {
            entries.iter().map(move |entry| UnitRow {
                category: category.singular().to_string(),
                key: entry.key.clone(),
                name: entry.display_name.clone(),
                version: entry.version.clone().unwrap_or_else(|| "-".to_string()),
            })
        })
        .collect();

    println!("{}", format!("{} unit(s)", rows.len()).bold());
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}
