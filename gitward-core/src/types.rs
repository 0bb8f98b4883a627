//! Domain types for gitward.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! Inventory types are serializable via serde + serde_json for the persisted
//! baseline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of installed unit tracked in an inventory.
///
/// Declaration order is the category order used everywhere output must be
/// deterministic (themes first, then plugins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Themes,
    Plugins,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Themes, Category::Plugins]
    }

    /// Singular noun used in commit messages (`theme`, `plugin`).
    pub fn singular(&self) -> &'static str {
        match self {
            Category::Themes => "theme",
            Category::Plugins => "plugin",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Themes => write!(f, "themes"),
            Category::Plugins => write!(f, "plugins"),
        }
    }
}

/// How a unit differs between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Updated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Removed => write!(f, "removed"),
            ChangeKind::Updated => write!(f, "updated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Raw record reported by an inventory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub key: String,
    pub name: String,
    pub version: Option<String>,
}

/// One installed unit captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Unique identifier within a category (theme slug, plugin file path).
    pub key: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl InventoryEntry {
    /// Build an entry, normalizing an empty or whitespace-only version to `None`.
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            version: version.filter(|v| !v.trim().is_empty()),
        }
    }

    /// `"<name> version <version>"`, or just the name when no version is known.
    pub fn label(&self) -> String {
        versioned_label(&self.display_name, self.version.as_deref())
    }
}

impl From<UnitRecord> for InventoryEntry {
    fn from(record: UnitRecord) -> Self {
        InventoryEntry::new(record.key, record.name, record.version)
    }
}

/// Installed units per category at one instant.
///
/// Entries keep their insertion order; keys are unique within a category.
/// Categories with no entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventorySnapshot {
    categories: BTreeMap<Category, Vec<InventoryEntry>>,
}

impl InventorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` under `category`. An existing entry with the same key is
    /// replaced in place so its position is kept.
    pub fn insert(&mut self, category: Category, entry: InventoryEntry) {
        let entries = self.categories.entry(category).or_default();
        match entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Entries for `category` in insertion order (empty when absent).
    pub fn entries(&self, category: Category) -> &[InventoryEntry] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, category: Category, key: &str) -> Option<&InventoryEntry> {
        self.entries(category).iter().find(|e| e.key == key)
    }

    pub fn contains_category(&self, category: Category) -> bool {
        self.categories.contains_key(&category)
    }

    /// Non-empty categories in category order.
    pub fn categories(&self) -> impl Iterator<Item = (Category, &[InventoryEntry])> {
        self.categories
            .iter()
            .map(|(category, entries)| (*category, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Rebuild through [`insert`](Self::insert) so duplicate keys collapse and
    /// empty categories disappear. Used after deserializing untrusted input.
    pub fn normalized(self) -> Self {
        let mut out = Self::new();
        for (category, entries) in self.categories {
            for entry in entries {
                out.insert(category, entry);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Changes and requests
// ---------------------------------------------------------------------------

/// One difference between two snapshots. Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub key: String,
    pub category: Category,
    pub kind: ChangeKind,
    /// Display name from the newer side, or the older side for removals.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_version: Option<String>,
}

impl ChangeEntry {
    /// The version relevant to this change: previous for removals, new otherwise.
    pub fn version(&self) -> Option<&str> {
        match self.kind {
            ChangeKind::Removed => self.previous_version.as_deref(),
            ChangeKind::Added | ChangeKind::Updated => self.new_version.as_deref(),
        }
    }

    pub fn label(&self) -> String {
        versioned_label(&self.name, self.version())
    }
}

/// The unit a hook fired for, used to describe a commit when the inventory
/// itself did not change (e.g. an activation that only touched files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub category: Category,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Subject {
    /// Present the subject as a single `Updated` change for message formatting.
    pub fn as_change(&self) -> ChangeEntry {
        ChangeEntry {
            key: self.key.clone(),
            category: self.category,
            kind: ChangeKind::Updated,
            name: self.name.clone(),
            previous_version: None,
            new_version: self.version.clone().filter(|v| !v.trim().is_empty()),
        }
    }
}

/// One trigger's request to commit (and optionally sync) repository changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_label: Option<String>,
    /// Directory to stage, relative to the repository root.
    pub target_directory: PathBuf,
    pub should_push: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
}

impl SyncRequest {
    /// Stage everything under `target_directory`; no label, no push.
    pub fn new(target_directory: impl Into<PathBuf>) -> Self {
        Self {
            action_label: None,
            target_directory: target_directory.into(),
            should_push: false,
            subject: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.action_label = Some(label.into());
        self
    }

    pub fn with_push(mut self, should_push: bool) -> Self {
        self.should_push = should_push;
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }
}

fn versioned_label(name: &str, version: Option<&str>) -> String {
    match version.filter(|v| !v.is_empty()) {
        Some(version) => format!("{name} version {version}"),
        None => name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, name: &str, version: Option<&str>) -> InventoryEntry {
        InventoryEntry::new(key, name, version.map(str::to_string))
    }

    #[test]
    fn entry_label_appends_version() {
        assert_eq!(
            entry("hello-dolly/hello.php", "Hello Dolly", Some("1.6")).label(),
            "Hello Dolly version 1.6"
        );
        assert_eq!(entry("cron-view/cron-gui.php", "Cron GUI", None).label(), "Cron GUI");
    }

    #[test]
    fn empty_version_is_dropped() {
        let e = entry("twentytwelve", "Twenty Twelve", Some("  "));
        assert_eq!(e.version, None);
        assert_eq!(e.label(), "Twenty Twelve");
    }

    #[test]
    fn insert_replaces_existing_key_in_place() {
        let mut snap = InventorySnapshot::new();
        snap.insert(Category::Plugins, entry("a.php", "A", Some("1")));
        snap.insert(Category::Plugins, entry("b.php", "B", Some("1")));
        snap.insert(Category::Plugins, entry("a.php", "A", Some("2")));

        let keys: Vec<_> = snap.entries(Category::Plugins).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, ["a.php", "b.php"]);
        assert_eq!(
            snap.get(Category::Plugins, "a.php").and_then(|e| e.version.as_deref()),
            Some("2")
        );
        assert_eq!(snap.len(), 2);
    }

    #[test]
    fn empty_snapshot_has_no_categories() {
        let snap = InventorySnapshot::new();
        assert!(snap.is_empty());
        assert!(!snap.contains_category(Category::Themes));
        assert!(snap.entries(Category::Themes).is_empty());
    }

    #[test]
    fn snapshot_serializes_as_category_map() {
        let mut snap = InventorySnapshot::new();
        snap.insert(Category::Themes, entry("twentytwelve", "Twenty Twelve", Some("1.3")));
        let json = serde_json::to_value(&snap).expect("serialize");
        assert_eq!(json["themes"][0]["key"], "twentytwelve");
        assert_eq!(json["themes"][0]["version"], "1.3");
        assert!(json.get("plugins").is_none());
    }

    #[test]
    fn normalized_drops_empty_categories_and_duplicate_keys() {
        let raw = r#"{"themes":[],"plugins":[
            {"key":"a.php","display_name":"A"},
            {"key":"a.php","display_name":"A2"}
        ]}"#;
        let snap: InventorySnapshot = serde_json::from_str(raw).expect("parse");
        let snap = snap.normalized();
        assert!(!snap.contains_category(Category::Themes));
        assert_eq!(snap.entries(Category::Plugins).len(), 1);
        assert_eq!(snap.entries(Category::Plugins)[0].display_name, "A2");
    }

    #[test]
    fn removed_change_uses_previous_version() {
        let change = ChangeEntry {
            key: "hello-dolly/hello.php".into(),
            category: Category::Plugins,
            kind: ChangeKind::Removed,
            name: "Hello Dolly".into(),
            previous_version: Some("1.6".into()),
            new_version: None,
        };
        assert_eq!(change.label(), "Hello Dolly version 1.6");
    }

    #[test]
    fn sync_request_builder() {
        let req = SyncRequest::new("wp-content/plugins/hello-dolly")
            .with_label("install plugin")
            .with_push(true);
        assert_eq!(req.action_label.as_deref(), Some("install plugin"));
        assert!(req.should_push);
        assert!(req.subject.is_none());
    }

    #[test]
    fn category_display_and_singular() {
        assert_eq!(Category::Themes.to_string(), "themes");
        assert_eq!(Category::Plugins.singular(), "plugin");
    }
}
