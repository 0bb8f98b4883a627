//! # gitward-sync
//!
//! Inventory diffing, commit messages, and the lock-serialized
//! commit / pull / push coordinator.
//!
//! Host events enter through [`HookRegistry::dispatch`]; everything that
//! touches the repository goes through a single [`SyncCoordinator`].

pub mod coordinator;
pub mod diff;
pub mod error;
pub mod git;
pub mod hooks;
pub mod lock;
pub mod message;

pub use coordinator::{CommitOutcome, CoordinatorSettings, SyncCoordinator};
pub use diff::diff;
pub use error::SyncError;
pub use git::{GitCli, VcsClient, VcsError, VcsErrorKind};
pub use hooks::{HookContext, HookEvent, HookOutcome, HookPayload, HookRegistry};
pub use lock::{lock_path_for, RepoLock};
pub use message::format as format_message;
