//! Host-platform event table.
//!
//! Each platform event (plugin installed, plugin activated, list page loaded
//! after a deletion, …) maps to one handler that turns the event payload into
//! a [`SyncRequest`], or into nothing when the event needs no commit. The
//! table is built once at startup; [`HookRegistry::dispatch`] never
//! propagates a sync failure, so the platform action that fired the hook
//! always completes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use gitward_core::{capture, Category, InventoryProvider, Subject, SyncRequest};

use crate::coordinator::{CommitOutcome, SyncCoordinator};

/// Platform events gitward reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    /// A theme or plugin package finished installing or updating.
    PostInstall,
    /// The upgrader finished a whole batch.
    ProcessComplete,
    PostActivate,
    PostDeactivate,
    /// The plugins list page loaded (possibly right after a deletion).
    LoadPlugins,
    /// The themes list page loaded (possibly right after a deletion).
    LoadThemes,
}

impl HookEvent {
    pub fn all() -> &'static [HookEvent] {
        &[
            HookEvent::PostInstall,
            HookEvent::ProcessComplete,
            HookEvent::PostActivate,
            HookEvent::PostDeactivate,
            HookEvent::LoadPlugins,
            HookEvent::LoadThemes,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::PostInstall => "post-install",
            HookEvent::ProcessComplete => "process-complete",
            HookEvent::PostActivate => "post-activate",
            HookEvent::PostDeactivate => "post-deactivate",
            HookEvent::LoadPlugins => "load-plugins",
            HookEvent::LoadThemes => "load-themes",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::all()
            .iter()
            .copied()
            .find(|event| event.name() == s)
            .ok_or_else(|| {
                let known: Vec<_> = HookEvent::all().iter().map(HookEvent::name).collect();
                format!("unknown hook event '{s}'; expected one of: {}", known.join(", "))
            })
    }
}

/// Everything the host passes along with an event. Fields an event does not
/// use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookPayload {
    /// `theme` or `plugin` (post-install; defaults to `plugin`).
    #[serde(default)]
    pub unit_type: Option<String>,
    /// `install` or `update` (post-install; defaults to `update`).
    #[serde(default)]
    pub action: Option<String>,
    /// Directory the package was installed into (post-install).
    #[serde(default)]
    pub destination: Option<PathBuf>,
    /// Plugin key, e.g. `hello-dolly/hello.php` (activate / deactivate).
    #[serde(default)]
    pub unit: Option<String>,
    /// The list page's `deleted` query flag; only `"true"` means a deletion.
    #[serde(default)]
    pub deleted: Option<String>,
}

/// Read-only view a handler may consult.
pub struct HookContext<'a> {
    pub repo_root: &'a Path,
    pub inventory: &'a dyn InventoryProvider,
}

pub type HookHandler = fn(&HookContext<'_>, &HookPayload) -> Option<SyncRequest>;

/// What dispatching one event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// No handler, or the handler decided nothing needs committing.
    Ignored,
    Synced(CommitOutcome),
    /// The sync failed; already logged.
    Failed(String),
}

/// Event name → handler table.
#[derive(Default)]
pub struct HookRegistry {
    handlers: BTreeMap<HookEvent, HookHandler>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard table: one handler for every [`HookEvent`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(HookEvent::PostInstall, post_install);
        registry.register(HookEvent::ProcessComplete, process_complete);
        registry.register(HookEvent::PostActivate, post_activate);
        registry.register(HookEvent::PostDeactivate, post_deactivate);
        registry.register(HookEvent::LoadPlugins, deletion_check);
        registry.register(HookEvent::LoadThemes, deletion_check);
        registry
    }

    /// Install `handler` for `event`, replacing any previous one.
    pub fn register(&mut self, event: HookEvent, handler: HookHandler) {
        self.handlers.insert(event, handler);
    }

    pub fn is_registered(&self, event: HookEvent) -> bool {
        self.handlers.contains_key(&event)
    }

    /// The request `event` would produce, without touching the repository.
    pub fn request_for(
        &self,
        event: HookEvent,
        ctx: &HookContext<'_>,
        payload: &HookPayload,
    ) -> Option<SyncRequest> {
        let handler = self.handlers.get(&event)?;
        handler(ctx, payload)
    }

    /// Run `event` through its handler and the coordinator. Failures are
    /// logged and reported, never propagated.
    pub fn dispatch(
        &self,
        event: HookEvent,
        payload: &HookPayload,
        coordinator: &SyncCoordinator,
    ) -> HookOutcome {
        let ctx = HookContext {
            repo_root: &coordinator.settings().repo_root,
            inventory: coordinator.inventory(),
        };
        let Some(request) = self.request_for(event, &ctx, payload) else {
            tracing::debug!("{event}: nothing to commit");
            return HookOutcome::Ignored;
        };
        match coordinator.commit_and_sync(&request) {
            Ok(outcome) => HookOutcome::Synced(outcome),
            Err(err) => {
                tracing::warn!("{event} hook: sync failed, continuing: {err}");
                HookOutcome::Failed(err.to_string())
            }
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

// ---------------------------------------------------------------------------
// Default handlers
// ---------------------------------------------------------------------------

fn post_install(ctx: &HookContext<'_>, payload: &HookPayload) -> Option<SyncRequest> {
    let category = match payload.unit_type.as_deref() {
        Some("theme") => Category::Themes,
        _ => Category::Plugins,
    };
    let action = payload
        .action
        .as_deref()
        .filter(|a| !a.is_empty())
        .unwrap_or("update");
    let label = format!("{action} {}", category.singular());

    let Some(destination) = payload.destination.as_deref() else {
        return Some(SyncRequest::new(".").with_label(label));
    };
    let target = destination
        .strip_prefix(ctx.repo_root)
        .unwrap_or(destination)
        .to_path_buf();
    let mut request = SyncRequest::new(target).with_label(label);
    if let Some(dir_name) = destination.file_name().map(|n| n.to_string_lossy().into_owned()) {
        request = request.with_subject(installed_subject(ctx, category, &dir_name));
    }
    Some(request)
}

fn process_complete(_ctx: &HookContext<'_>, _payload: &HookPayload) -> Option<SyncRequest> {
    Some(SyncRequest::new(".").with_push(true))
}

fn post_activate(ctx: &HookContext<'_>, payload: &HookPayload) -> Option<SyncRequest> {
    activation_request(ctx, payload, "post activation of")
}

fn post_deactivate(ctx: &HookContext<'_>, payload: &HookPayload) -> Option<SyncRequest> {
    activation_request(ctx, payload, "post deactivation of")
}

/// A missing `deleted` flag means the page was loaded for another reason.
fn deletion_check(_ctx: &HookContext<'_>, payload: &HookPayload) -> Option<SyncRequest> {
    match payload.deleted.as_deref() {
        Some("true") => Some(SyncRequest::new(".").with_push(true)),
        _ => None,
    }
}

fn activation_request(
    ctx: &HookContext<'_>,
    payload: &HookPayload,
    label: &str,
) -> Option<SyncRequest> {
    let Some(key) = payload.unit.as_deref().filter(|k| !k.is_empty()) else {
        tracing::warn!("{label}: event without a plugin key; ignoring");
        return None;
    };
    let snapshot = capture(ctx.inventory);
    let subject = match snapshot.get(Category::Plugins, key) {
        Some(entry) => Subject {
            category: Category::Plugins,
            key: key.to_string(),
            name: entry.display_name.clone(),
            version: entry.version.clone(),
        },
        None => Subject {
            category: Category::Plugins,
            key: key.to_string(),
            name: key.to_string(),
            version: None,
        },
    };
    Some(
        SyncRequest::new(".")
            .with_label(label)
            .with_push(true)
            .with_subject(subject),
    )
}

/// Subject for a freshly installed package directory: the first inventory
/// entry living in it, or the bare directory name.
fn installed_subject(ctx: &HookContext<'_>, category: Category, dir_name: &str) -> Subject {
    let snapshot = capture(ctx.inventory);
    let prefix = format!("{dir_name}/");
    let found = snapshot
        .entries(category)
        .iter()
        .find(|e| e.key == dir_name || e.key.starts_with(&prefix));
    match found {
        Some(entry) => Subject {
            category,
            key: entry.key.clone(),
            name: entry.display_name.clone(),
            version: entry.version.clone(),
        },
        None => Subject {
            category,
            key: dir_name.to_string(),
            name: dir_name.to_string(),
            version: None,
        },
    }
}
