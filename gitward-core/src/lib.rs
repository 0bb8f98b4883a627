//! gitward core library — inventory types, baseline persistence, config, errors.
//!
//! Public API surface:
//! - [`types`] — inventory, change, and request types
//! - [`inventory`] — capture + the persisted baseline ([`SnapshotStore`])
//! - [`fs_inventory`] — reads installed themes/plugins from disk
//! - [`options`] — the key-value option store
//! - [`config`] — `~/.gitward/config.yaml` load / save
//! - [`error`] — [`CoreError`]

pub mod config;
pub mod error;
pub mod fs_inventory;
pub mod inventory;
pub mod options;
pub mod paths;
pub mod types;

pub use config::GitwardConfig;
pub use error::CoreError;
pub use fs_inventory::FsInventory;
pub use inventory::{capture, Baseline, InventoryProvider, SnapshotStore};
pub use options::{OptionStore, VERSIONS_OPTION, WEBHOOK_KEY_OPTION};
pub use types::{
    Category, ChangeEntry, ChangeKind, InventoryEntry, InventorySnapshot, Subject, SyncRequest,
    UnitRecord,
};
