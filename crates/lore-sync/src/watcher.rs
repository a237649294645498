//! notify-backed vault watcher.
//!
//! Translates raw filesystem notifications into typed [`VaultEvent`]s for
//! trackable files and feeds them to the sync manager on a background
//! thread. The manager never sees the delivery mechanism - tests drive it
//! with synthetic events instead.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    thread,
};

use lore_config::{CompiledPatterns, Config};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};

use crate::{SyncError, SyncManager, VaultEvent, manager::vault_relative};

/// Watches a vault directory and drives a [`SyncManager`].
pub struct VaultWatcher {
    /// The underlying watcher; kept alive for the lifetime of the struct.
    _watcher: RecommendedWatcher,
}

impl VaultWatcher {
    /// Starts watching the configured vault recursively.
    ///
    /// Events for non-trackable paths (wrong extension, hidden or excluded
    /// directories) are discarded here, before they reach the manager.
    pub fn start(config: &Config, manager: Arc<SyncManager>) -> Result<Self, SyncError> {
        let vault_root = config.vault.root.clone();
        let patterns = config
            .compile_patterns()
            .map_err(|e| SyncError::Patterns(e.to_string()))?;

        let (tx, rx) = mpsc::channel();

        let mut watcher =
            RecommendedWatcher::new(tx, notify::Config::default()).map_err(SyncError::Watch)?;
        watcher
            .watch(&vault_root, RecursiveMode::Recursive)
            .map_err(SyncError::Watch)?;

        thread::spawn(move || {
            for result in rx {
                match result {
                    Ok(event) => {
                        for vault_event in map_event(&event, &vault_root, &patterns) {
                            manager.handle_event(vault_event);
                        }
                    }
                    Err(e) => {
                        log::warn!("file watcher error: {e}");
                    }
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

/// Maps a raw notify event onto typed vault events for trackable paths.
fn map_event(event: &Event, vault_root: &Path, patterns: &CompiledPatterns) -> Vec<VaultEvent> {
    let trackable = |abs: &PathBuf| -> Option<PathBuf> {
        vault_relative(vault_root, abs).filter(|rel| patterns.matches(rel))
    };

    match &event.kind {
        EventKind::Create(_) => event
            .paths
            .iter()
            .filter_map(|p| trackable(p).map(VaultEvent::Created))
            .collect(),

        EventKind::Remove(_) => event
            .paths
            .iter()
            .filter_map(|p| trackable(p).map(VaultEvent::Deleted))
            .collect(),

        // A rename reported with both endpoints maps onto the rename
        // event; when only one side is trackable it degrades to a plain
        // delete or create.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let from = event.paths.first().and_then(trackable);
            let to = event.paths.get(1).and_then(trackable);
            match (from, to) {
                (Some(from), Some(to)) => vec![VaultEvent::Renamed { from, to }],
                (Some(from), None) => vec![VaultEvent::Deleted(from)],
                (None, Some(to)) => vec![VaultEvent::Created(to)],
                (None, None) => Vec::new(),
            }
        }

        // One-sided rename notifications: the old name disappears, the new
        // name appears.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => event
            .paths
            .iter()
            .filter_map(|p| trackable(p).map(VaultEvent::Deleted))
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event
            .paths
            .iter()
            .filter_map(|p| trackable(p).map(VaultEvent::Created))
            .collect(),

        EventKind::Modify(_) => event
            .paths
            .iter()
            .filter_map(|p| trackable(p).map(VaultEvent::Modified))
            .collect(),

        _ => Vec::new(),
    }
}
