//! Commit message formatting.
//!
//! Pure and deterministic: the same label and change list always produce the
//! same string.

use gitward_core::{Category, ChangeEntry, ChangeKind};

/// Message used when nothing in the inventory changed.
pub const NO_CHANGE_MESSAGE: &str = "update";

/// Build a commit message from an optional action label and a change list.
///
/// - no changes → `update`
/// - only removals → ``removed plugins `A`, `B` `` (one group per category,
///   groups joined by `; `)
/// - one change → `` `Hello Dolly version 1.6` ``
/// - several changes → backtick-quoted labels joined by `, `
///
/// A non-empty `label` is prepended verbatim with one space.
pub fn format(label: Option<&str>, changes: &[ChangeEntry]) -> String {
    let body = match changes {
        [] => NO_CHANGE_MESSAGE.to_string(),
        _ if changes.iter().all(|c| c.kind == ChangeKind::Removed) => removed_summary(changes),
        [single] => quoted(&single.label()),
        many => quoted_list(many.iter()),
    };
    match label.filter(|l| !l.is_empty()) {
        Some(label) => format!("{label} {body}"),
        None => body,
    }
}

fn removed_summary(changes: &[ChangeEntry]) -> String {
    let mut groups: Vec<(Category, Vec<&ChangeEntry>)> = Vec::new();
    for change in changes {
        match groups.iter_mut().find(|(category, _)| *category == change.category) {
            Some((_, members)) => members.push(change),
            None => groups.push((change.category, vec![change])),
        }
    }
    groups
        .into_iter()
        .map(|(category, members)| {
            let plural = if members.len() > 1 { "s" } else { "" };
            format!(
                "removed {}{plural} {}",
                category.singular(),
                quoted_list(members.into_iter())
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn quoted_list<'a>(changes: impl Iterator<Item = &'a ChangeEntry>) -> String {
    changes
        .map(|c| quoted(&c.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quoted(text: &str) -> String {
    format!("`{text}`")
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn change(category: Category, kind: ChangeKind, name: &str, version: Option<&str>) -> ChangeEntry {
        let version = version.map(str::to_string);
        let (previous_version, new_version) = match kind {
            ChangeKind::Removed => (version, None),
            _ => (None, version),
        };
        ChangeEntry {
            key: name.to_lowercase().replace(' ', "-"),
            category,
            kind,
            name: name.to_string(),
            previous_version,
            new_version,
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    fn no_changes_is_update(#[case] label: Option<&str>) {
        assert_eq!(format(label, &[]), "update");
    }

    #[test]
    fn no_changes_still_gets_label_prefix() {
        assert_eq!(format(Some("post activation of"), &[]), "post activation of update");
    }

    #[test]
    fn single_change_with_version_and_label() {
        let changes = [change(Category::Plugins, ChangeKind::Updated, "Hello Dolly", Some("1.6"))];
        assert_eq!(
            format(Some("update plugin"), &changes),
            "update plugin `Hello Dolly version 1.6`"
        );
    }

    #[test]
    fn single_change_name_only() {
        let changes = [change(Category::Themes, ChangeKind::Added, "Twenty Twelve", None)];
        assert_eq!(format(Some("install theme"), &changes), "install theme `Twenty Twelve`");
    }

    #[test]
    fn removed_batch_is_pluralized() {
        let changes = [
            change(Category::Plugins, ChangeKind::Removed, "Cron GUI", None),
            change(Category::Plugins, ChangeKind::Removed, "Hello Dolly", None),
        ];
        assert_eq!(format(None, &changes), "removed plugins `Cron GUI`, `Hello Dolly`");
    }

    #[test]
    fn single_removal_stays_singular() {
        let changes = [change(Category::Themes, ChangeKind::Removed, "Twenty Twelve", Some("1.3"))];
        assert_eq!(format(None, &changes), "removed theme `Twenty Twelve version 1.3`");
    }

    #[test]
    fn removals_across_categories_are_grouped() {
        let changes = [
            change(Category::Themes, ChangeKind::Removed, "Twenty Twelve", None),
            change(Category::Plugins, ChangeKind::Removed, "Cron GUI", None),
            change(Category::Plugins, ChangeKind::Removed, "Hello Dolly", None),
        ];
        assert_eq!(
            format(None, &changes),
            "removed theme `Twenty Twelve`; removed plugins `Cron GUI`, `Hello Dolly`"
        );
    }

    #[test]
    fn mixed_changes_are_listed() {
        let changes = [
            change(Category::Themes, ChangeKind::Updated, "Twenty Twelve", Some("1.4")),
            change(Category::Plugins, ChangeKind::Removed, "Cron GUI", Some("1.03")),
        ];
        assert_eq!(
            format(Some("update"), &changes),
            "update `Twenty Twelve version 1.4`, `Cron GUI version 1.03`"
        );
    }

    #[test]
    fn label_is_prepended_verbatim() {
        let changes = [change(Category::Plugins, ChangeKind::Added, "Akismet", Some("5.0"))];
        assert_eq!(format(Some("Install  Plugin"), &changes), "Install  Plugin `Akismet version 5.0`");
    }

    #[test]
    fn formatting_is_deterministic() {
        let changes = [
            change(Category::Plugins, ChangeKind::Added, "A", Some("1")),
            change(Category::Plugins, ChangeKind::Added, "B", None),
        ];
        assert_eq!(format(Some("x"), &changes), format(Some("x"), &changes));
    }
}
