//! Filesystem inventory provider for a WordPress-style content directory.
//!
//! Themes are `<themes>/<slug>/style.css` files with a `Theme Name:` header.
//! Plugins are `.php` files directly under `<plugins>/` or one level down
//! (`<plugins>/<dir>/<file>.php`) with a `Plugin Name:` header. Only the first
//! [`HEADER_SCAN_BYTES`] of each file are inspected.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::GitwardConfig;
use crate::inventory::InventoryProvider;
use crate::types::UnitRecord;

pub const HEADER_SCAN_BYTES: u64 = 8 * 1024;

/// Reads installed themes and plugins from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInventory {
    themes_dir: PathBuf,
    plugins_dir: PathBuf,
}

impl FsInventory {
    pub fn new(themes_dir: impl Into<PathBuf>, plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            themes_dir: themes_dir.into(),
            plugins_dir: plugins_dir.into(),
        }
    }

    pub fn from_config(config: &GitwardConfig) -> Self {
        Self::new(config.themes_dir(), config.plugins_dir())
    }
}

impl InventoryProvider for FsInventory {
    fn list_installed_themes(&self) -> Vec<UnitRecord> {
        let mut records = Vec::new();
        for dir in sorted_entries(&self.themes_dir) {
            if !dir.is_dir() {
                continue;
            }
            let Some(slug) = file_name(&dir) else { continue };
            let stylesheet = dir.join("style.css");
            if !stylesheet.is_file() {
                continue;
            }
            let Some(headers) = read_headers(&stylesheet) else { continue };
            let Some(name) = header_value(&headers, "Theme Name") else {
                continue;
            };
            records.push(UnitRecord {
                key: slug,
                name,
                version: header_value(&headers, "Version"),
            });
        }
        records
    }

    fn list_installed_plugins(&self) -> Vec<UnitRecord> {
        let mut records = Vec::new();
        for path in sorted_entries(&self.plugins_dir) {
            if path.is_dir() {
                for inner in sorted_entries(&path) {
                    if let Some(record) = plugin_record(&self.plugins_dir, &inner) {
                        records.push(record);
                    }
                }
            } else if let Some(record) = plugin_record(&self.plugins_dir, &path) {
                records.push(record);
            }
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }
}

fn plugin_record(plugins_dir: &Path, path: &Path) -> Option<UnitRecord> {
    if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("php") {
        return None;
    }
    let headers = read_headers(path)?;
    let name = header_value(&headers, "Plugin Name")?;
    let key = path
        .strip_prefix(plugins_dir)
        .ok()?
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Some(UnitRecord {
        key,
        name,
        version: header_value(&headers, "Version"),
    })
}

/// Directory entries sorted by file name; unreadable directories yield nothing.
fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            tracing::warn!("cannot list {}: {err}", dir.display());
            return Vec::new();
        }
    };
    let mut paths: Vec<PathBuf> = read.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();
    paths
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn read_headers(path: &Path) -> Option<String> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!("cannot read {}: {err}", path.display());
            return None;
        }
    };
    let mut buf = Vec::new();
    if let Err(err) = file.take(HEADER_SCAN_BYTES).read_to_end(&mut buf) {
        tracing::warn!("cannot read {}: {err}", path.display());
        return None;
    }
    Some(String::from_utf8_lossy(&buf).replace('\r', "\n"))
}

/// Value of a `Name: value` header inside a leading comment block.
///
/// Matching is case-insensitive and ignores comment decoration (`*`, `#`,
/// `@`, `/`) before the header name. Empty values count as absent.
pub fn header_value(contents: &str, header: &str) -> Option<String> {
    for line in contents.lines() {
        let line = line.trim_start_matches(|c: char| c.is_whitespace() || "/*#@".contains(c));
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case(header) {
            continue;
        }
        let value = value.trim();
        let value = value.strip_suffix("*/").unwrap_or(value).trim();
        if value.is_empty() {
            return None;
        }
        return Some(value.to_string());
    }
    None
}
