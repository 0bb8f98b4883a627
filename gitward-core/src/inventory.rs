//! Inventory capture and the persisted "last known" baseline.
//!
//! The baseline lives in the option store under [`VERSIONS_OPTION`] as a
//! [`Baseline`] JSON document. It is only ever replaced wholesale, never
//! patched, so a reader always sees one complete capture.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::options::{OptionStore, VERSIONS_OPTION};
use crate::types::{Category, InventoryEntry, InventorySnapshot, UnitRecord};

/// Source of the currently installed themes and plugins.
///
/// Implementations never fail: anything they cannot read is logged and left
/// out of the returned list.
pub trait InventoryProvider: Send + Sync {
    fn list_installed_themes(&self) -> Vec<UnitRecord>;
    fn list_installed_plugins(&self) -> Vec<UnitRecord>;
}

/// Build a snapshot of everything `provider` reports right now.
///
/// A category with no records is omitted rather than stored empty.
pub fn capture(provider: &dyn InventoryProvider) -> InventorySnapshot {
    let mut snapshot = InventorySnapshot::new();
    for record in provider.list_installed_themes() {
        snapshot.insert(Category::Themes, InventoryEntry::from(record));
    }
    for record in provider.list_installed_plugins() {
        snapshot.insert(Category::Plugins, InventoryEntry::from(record));
    }
    tracing::debug!(
        "captured inventory: {} theme(s), {} plugin(s)",
        snapshot.entries(Category::Themes).len(),
        snapshot.entries(Category::Plugins).len()
    );
    snapshot
}

/// On-disk baseline payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub captured_at: DateTime<Utc>,
    pub inventory: InventorySnapshot,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BaselineCompat {
    Structured(BaselineStructuredCompat),
    /// `{"plugins": {"hello-dolly/hello.php": "Hello Dolly version 1.6"}}`
    Legacy(BTreeMap<Category, BTreeMap<String, String>>),
}

#[derive(Debug, Deserialize)]
struct BaselineStructuredCompat {
    captured_at: Option<DateTime<Utc>>,
    inventory: InventorySnapshot,
}

/// Load/save access to the persisted baseline.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    options: OptionStore,
}

impl SnapshotStore {
    pub fn new(options: OptionStore) -> Self {
        Self { options }
    }

    pub fn at(home: &Path) -> Self {
        Self::new(OptionStore::at(home))
    }

    /// The last saved baseline, or `None` if nothing was ever saved.
    pub fn load_baseline(&self) -> Result<Option<Baseline>, CoreError> {
        let Some(compat) = self.options.get::<BaselineCompat>(VERSIONS_OPTION)? else {
            return Ok(None);
        };
        let baseline = match compat {
            BaselineCompat::Structured(doc) => Baseline {
                captured_at: doc.captured_at.unwrap_or_else(Utc::now),
                inventory: doc.inventory.normalized(),
            },
            BaselineCompat::Legacy(categories) => Baseline {
                captured_at: Utc::now(),
                inventory: from_legacy(categories),
            },
        };
        Ok(Some(baseline))
    }

    /// The last saved snapshot, or an empty snapshot if none exists.
    pub fn load(&self) -> Result<InventorySnapshot, CoreError> {
        Ok(self
            .load_baseline()?
            .map(|baseline| baseline.inventory)
            .unwrap_or_default())
    }

    /// Replace the baseline with `snapshot`.
    pub fn save(&self, snapshot: &InventorySnapshot) -> Result<(), CoreError> {
        let baseline = Baseline {
            captured_at: Utc::now(),
            inventory: snapshot.clone(),
        };
        self.options.set(VERSIONS_OPTION, &baseline)?;
        tracing::debug!("saved inventory baseline ({} unit(s))", snapshot.len());
        Ok(())
    }
}

fn from_legacy(categories: BTreeMap<Category, BTreeMap<String, String>>) -> InventorySnapshot {
    let mut snapshot = InventorySnapshot::new();
    for (category, units) in categories {
        for (key, label) in units {
            let (name, version) = match label.rsplit_once(" version ") {
                Some((name, version)) => (name, Some(version.trim().to_string())),
                None => (label.as_str(), None),
            };
            let name = name.trim().trim_matches('`');
            snapshot.insert(category, InventoryEntry::new(key, name, version));
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FixedInventory {
        themes: Vec<UnitRecord>,
        plugins: Vec<UnitRecord>,
    }

    impl InventoryProvider for FixedInventory {
        fn list_installed_themes(&self) -> Vec<UnitRecord> {
            self.themes.clone()
        }
        fn list_installed_plugins(&self) -> Vec<UnitRecord> {
            self.plugins.clone()
        }
    }

    fn record(key: &str, name: &str, version: &str) -> UnitRecord {
        UnitRecord {
            key: key.to_string(),
            name: name.to_string(),
            version: Some(version.to_string()),
        }
    }

    #[test]
    fn capture_omits_empty_categories() {
        let provider = FixedInventory {
            themes: vec![],
            plugins: vec![record("hello-dolly/hello.php", "Hello Dolly", "1.6")],
        };
        let snapshot = capture(&provider);
        assert!(!snapshot.contains_category(Category::Themes));
        assert_eq!(
            snapshot.get(Category::Plugins, "hello-dolly/hello.php").map(|e| e.label()),
            Some("Hello Dolly version 1.6".to_string())
        );
    }

    #[test]
    fn capture_blank_version_keeps_name_only() {
        let provider = FixedInventory {
            themes: vec![record("twentytwelve", "Twenty Twelve", "")],
            plugins: vec![],
        };
        let snapshot = capture(&provider);
        assert_eq!(snapshot.entries(Category::Themes)[0].label(), "Twenty Twelve");
    }

    #[test]
    fn load_without_baseline_is_empty() {
        let home = TempDir::new().unwrap();
        let store = SnapshotStore::at(home.path());
        assert!(store.load().unwrap().is_empty());
        assert!(store.load_baseline().unwrap().is_none());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let home = TempDir::new().unwrap();
        let store = SnapshotStore::at(home.path());
        let provider = FixedInventory {
            themes: vec![record("twentytwelve", "Twenty Twelve", "1.3")],
            plugins: vec![
                record("zeta/zeta.php", "Zeta", "2.0"),
                record("alpha/alpha.php", "Alpha", "1.0"),
            ],
        };
        let snapshot = capture(&provider);
        store.save(&snapshot).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, snapshot);
        let keys: Vec<_> = loaded
            .entries(Category::Plugins)
            .iter()
            .map(|e| e.key.as_str())
            .collect();
        assert_eq!(keys, ["zeta/zeta.php", "alpha/alpha.php"]);
    }

    #[test]
    fn legacy_flat_labels_are_converted() {
        let home = TempDir::new().unwrap();
        let options = OptionStore::at(home.path());
        let legacy = serde_json::json!({
            "themes": { "twentytwelve": "Twenty Twelve version 1.3" },
            "plugins": {
                "cron-view/cron-gui.php": "Cron GUI version 1.03",
                "hello-dolly/hello.php": "Hello Dolly"
            }
        });
        options.set(VERSIONS_OPTION, &legacy).unwrap();

        let loaded = SnapshotStore::new(options).load().unwrap();
        let cron = loaded.get(Category::Plugins, "cron-view/cron-gui.php").unwrap();
        assert_eq!(cron.display_name, "Cron GUI");
        assert_eq!(cron.version.as_deref(), Some("1.03"));
        let dolly = loaded.get(Category::Plugins, "hello-dolly/hello.php").unwrap();
        assert_eq!(dolly.version, None);
        assert_eq!(loaded.entries(Category::Themes).len(), 1);
    }

    #[test]
    fn structured_without_timestamp_still_loads() {
        let home = TempDir::new().unwrap();
        let options = OptionStore::at(home.path());
        let doc = serde_json::json!({
            "inventory": { "plugins": [ { "key": "a.php", "display_name": "A" } ] }
        });
        options.set(VERSIONS_OPTION, &doc).unwrap();

        let before = Utc::now();
        let baseline = SnapshotStore::new(options).load_baseline().unwrap().unwrap();
        assert!(baseline.captured_at >= before);
        assert_eq!(baseline.inventory.len(), 1);
    }
}
