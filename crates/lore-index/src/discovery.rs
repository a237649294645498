//! Note discovery for full rebuilds and staleness checks.
//!
//! Walks the vault directory and returns the vault-relative paths of every
//! trackable note, applying the configured include/exclude patterns and
//! skipping hidden directories.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use lore_config::CompiledPatterns;
use walkdir::WalkDir;

use crate::IndexError;

/// Discovers all trackable notes under the vault root.
///
/// Returns vault-relative paths, sorted for deterministic processing order.
/// Unreadable directory entries are skipped, not errors.
pub fn discover_notes(
    vault_root: &Path,
    patterns: &CompiledPatterns,
) -> Result<Vec<PathBuf>, IndexError> {
    let mut notes = Vec::new();

    if !vault_root.exists() {
        return Ok(notes);
    }

    for entry in WalkDir::new(vault_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e.file_name()))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = match entry.path().strip_prefix(vault_root) {
            Ok(p) => p.to_path_buf(),
            Err(_) => continue,
        };

        if patterns.matches(&rel_path) {
            notes.push(rel_path);
        }
    }

    notes.sort();
    Ok(notes)
}

/// Checks if a filename is hidden (starts with '.').
fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
