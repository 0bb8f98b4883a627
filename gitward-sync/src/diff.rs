//! Change detection between two inventory snapshots.
//!
//! Output order is deterministic: category by category (themes, then
//! plugins); within a category, entries of the newer snapshot in insertion
//! order (added or updated), followed by entries only the older snapshot has
//! (removed) in their original order.

use gitward_core::{Category, ChangeEntry, ChangeKind, InventoryEntry, InventorySnapshot};

/// Everything that differs between `old` and `new`.
pub fn diff(old: &InventorySnapshot, new: &InventorySnapshot) -> Vec<ChangeEntry> {
    let mut changes = Vec::new();
    for category in Category::all() {
        let category = *category;
        for entry in new.entries(category) {
            match old.get(category, &entry.key) {
                None => changes.push(change(category, ChangeKind::Added, None, Some(entry))),
                Some(previous) if previous != entry => {
                    changes.push(change(category, ChangeKind::Updated, Some(previous), Some(entry)))
                }
                Some(_) => {}
            }
        }
        for entry in old.entries(category) {
            if new.get(category, &entry.key).is_none() {
                changes.push(change(category, ChangeKind::Removed, Some(entry), None));
            }
        }
    }
    changes
}

fn change(
    category: Category,
    kind: ChangeKind,
    previous: Option<&InventoryEntry>,
    current: Option<&InventoryEntry>,
) -> ChangeEntry {
    let named = current.or(previous);
    ChangeEntry {
        key: named.map(|e| e.key.clone()).unwrap_or_default(),
        category,
        kind,
        name: named.map(|e| e.display_name.clone()).unwrap_or_default(),
        previous_version: previous.and_then(|e| e.version.clone()),
        new_version: current.and_then(|e| e.version.clone()),
    }
}
