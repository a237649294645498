//! The incremental sync manager.
//!
//! Consumes vault file events and keeps the index consistent:
//! - create/modify events land in a pending set keyed by path
//!   (last-write-wins) and restart the trailing debounce; when it fires,
//!   the whole pending set is extracted and upserted as one batch with one
//!   change notification
//! - delete events bypass the debounce entirely: the queued re-index (if
//!   any) is cancelled and the path is removed from the index immediately
//! - a rename is an immediate remove of the old path plus a queued
//!   re-index of the new one, which stays correct when the rename is
//!   followed by rapid edits
//!
//! Change notifications additionally arm a second, much slower debounce
//! that persists the index, so bursts of small mutations coalesce into one
//! serialize-and-write.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, RwLockWriteGuard},
    time::Duration,
};

use lore_config::Config;
use lore_document::{extract, rel_path_string};
use lore_index::{CacheManager, NoteIndex, SharedIndex};

use crate::{VaultEvent, debounce::Debouncer};

/// Receives change notifications from the sync pipeline.
///
/// One `on_batch_indexed` call per flushed batch, however many files it
/// contained; removals are notified immediately.
pub trait ChangeListener: Send + Sync {
    /// A batch of paths was re-extracted and upserted.
    fn on_batch_indexed(&self, _paths: &[String]) {}

    /// Paths were removed from the index.
    fn on_removed(&self, _paths: &[String]) {}
}

/// A listener that ignores every notification.
pub struct NullListener;

impl ChangeListener for NullListener {}

/// Drives index maintenance from a stream of vault events.
pub struct SyncManager {
    /// State shared with the debounce workers.
    inner: Arc<SyncState>,
    /// Trailing debounce for batched re-indexing.
    flush_debounce: Debouncer,
    /// Long-delay debounce coalescing persistence.
    persist_debounce: Arc<Debouncer>,
}

/// Shared state between the event side and the flush side.
struct SyncState {
    /// Vault root for extraction.
    vault_root: PathBuf,
    /// The shared index handle.
    index: SharedIndex,
    /// Cache manager used for persistence.
    cache: Arc<CacheManager>,
    /// Paths waiting to be re-indexed. One entry per path: a second rapid
    /// edit replaces the queued reference, it does not queue twice.
    pending: Mutex<HashSet<PathBuf>>,
    /// Notification sink.
    listener: Box<dyn ChangeListener>,
}

impl SyncManager {
    /// Creates a sync manager over the shared index.
    ///
    /// Debounce delays come from the configuration; the listener receives
    /// change notifications.
    pub fn new(
        config: &Config,
        index: SharedIndex,
        cache: Arc<CacheManager>,
        listener: Box<dyn ChangeListener>,
    ) -> Self {
        let inner = Arc::new(SyncState {
            vault_root: config.vault.root.clone(),
            index,
            cache,
            pending: Mutex::new(HashSet::new()),
            listener,
        });

        let persist_debounce = {
            let state = Arc::clone(&inner);
            Arc::new(Debouncer::new(
                Duration::from_secs(config.sync.persist_debounce_secs),
                move || state.persist(),
            ))
        };

        let flush_debounce = {
            let state = Arc::clone(&inner);
            let persist = Arc::clone(&persist_debounce);
            Debouncer::new(Duration::from_millis(config.sync.debounce_ms), move || {
                if state.flush() {
                    persist.reset();
                }
            })
        };

        Self {
            inner,
            flush_debounce,
            persist_debounce,
        }
    }

    /// Applies a single vault event.
    pub fn handle_event(&self, event: VaultEvent) {
        match event {
            VaultEvent::Created(path) | VaultEvent::Modified(path) => {
                self.queue_reindex(path);
            }
            VaultEvent::Deleted(path) => {
                self.remove_now(&[path]);
            }
            VaultEvent::Renamed { from, to } => {
                self.remove_now(&[from]);
                self.queue_reindex(to);
            }
        }
    }

    /// Flushes any pending updates immediately, without waiting for the
    /// debounce window.
    pub fn flush_now(&self) {
        if self.inner.flush() {
            self.persist_debounce.reset();
        }
    }

    /// Shuts the pipeline down: cancels both debounce timers, drops any
    /// pending (not-yet-applied) updates, and attempts one final persist.
    ///
    /// Pending updates are deliberately dropped, not force-flushed:
    /// extraction may be slow and shutdown must not block on it.
    pub fn shutdown(&self) {
        self.flush_debounce.cancel();
        self.persist_debounce.cancel();

        let mut pending = self.inner.lock_pending();
        pending.clear();
        drop(pending);

        self.inner.persist();
    }

    /// Queues a path for re-indexing and restarts the debounce window.
    fn queue_reindex(&self, path: PathBuf) {
        self.inner.lock_pending().insert(path);
        self.flush_debounce.reset();
    }

    /// Removes paths from both the pending set and the index, immediately,
    /// with an immediate notification.
    fn remove_now(&self, paths: &[PathBuf]) {
        let mut removed = Vec::with_capacity(paths.len());

        {
            let mut pending = self.inner.lock_pending();
            for path in paths {
                pending.remove(path);
            }
        }

        let mut guard = self.inner.lock_index();
        let Some(index) = guard.as_mut() else {
            return;
        };

        for path in paths {
            let key = rel_path_string(path);
            if let Err(e) = index.remove(&key) {
                log::warn!("failed to remove {key} from index: {e}");
            } else {
                removed.push(key);
            }
        }
        drop(guard);

        if !removed.is_empty() {
            self.inner.listener.on_removed(&removed);
            self.persist_debounce.reset();
        }
    }
}

impl SyncState {
    /// Extracts and upserts everything pending as one batch.
    ///
    /// Returns true when anything was written. Files that fail extraction
    /// (typically deleted mid-window) are skipped; the rest of the batch
    /// proceeds. Exactly one notification fires for the whole batch.
    fn flush(&self) -> bool {
        let paths: Vec<PathBuf> = {
            let mut pending = self.lock_pending();
            pending.drain().collect()
        };
        if paths.is_empty() {
            return false;
        }

        let mut docs = Vec::with_capacity(paths.len());
        for path in &paths {
            match extract(&self.vault_root, path) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                }
            }
        }
        if docs.is_empty() {
            return false;
        }

        let mut guard = self.lock_index();
        let Some(index) = guard.as_mut() else {
            log::warn!("index not ready, dropping batch of {} updates", docs.len());
            return false;
        };

        if let Err(e) = index.upsert_batch(&docs) {
            log::warn!("failed to apply batch of {} updates: {e}", docs.len());
            return false;
        }
        drop(guard);

        let indexed: Vec<String> = docs.into_iter().map(|d| d.path).collect();
        self.listener.on_batch_indexed(&indexed);

        true
    }

    /// Persists the index snapshot (best effort).
    fn persist(&self) {
        let guard = self.lock_index();
        if let Some(index) = guard.as_ref() {
            self.cache.persist(index);
        }
    }

    /// Locks the pending set, recovering from poisoning.
    fn lock_pending(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Locks the shared index for writing, recovering from poisoning.
    fn lock_index(&self) -> RwLockWriteGuard<'_, Option<NoteIndex>> {
        match self.index.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Convenience check used by callers wiring the manager to a watcher: is
/// this absolute path inside the vault at all?
pub fn vault_relative(vault_root: &Path, abs_path: &Path) -> Option<PathBuf> {
    abs_path
        .strip_prefix(vault_root)
        .ok()
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use std::{fs, thread, time::Duration};

    use lore_index::shared_index;
    use tempfile::TempDir;

    use super::*;

    /// Listener that records every notification.
    #[derive(Default)]
    struct RecordingListener {
        batches: Mutex<Vec<Vec<String>>>,
        removals: Mutex<Vec<Vec<String>>>,
    }

    impl ChangeListener for Arc<RecordingListener> {
        fn on_batch_indexed(&self, paths: &[String]) {
            self.batches.lock().unwrap().push(paths.to_vec());
        }

        fn on_removed(&self, paths: &[String]) {
            self.removals.lock().unwrap().push(paths.to_vec());
        }
    }

    /// A manager over a fresh in-memory index with a short debounce.
    fn setup(temp: &TempDir) -> (SyncManager, SharedIndex, Arc<RecordingListener>) {
        let mut config = Config::with_root(temp.path());
        config.sync.debounce_ms = 40;
        config.cache.persist = false;

        let index = shared_index();
        *index.write().unwrap() = Some(NoteIndex::in_memory().unwrap());

        let listener = Arc::new(RecordingListener::default());
        let cache = Arc::new(CacheManager::new(&config));
        let manager = SyncManager::new(
            &config,
            Arc::clone(&index),
            cache,
            Box::new(Arc::clone(&listener)),
        );

        (manager, index, listener)
    }

    fn doc_count(index: &SharedIndex) -> u64 {
        index
            .read()
            .unwrap()
            .as_ref()
            .unwrap()
            .doc_count()
            .unwrap()
    }

    fn wait_for_flush() {
        thread::sleep(Duration::from_millis(250));
    }

    #[test]
    fn rapid_edits_coalesce_into_one_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "# Note\n\ncontent").unwrap();
        let (manager, index, listener) = setup(&temp);

        for _ in 0..5 {
            manager.handle_event(VaultEvent::Modified(PathBuf::from("note.md")));
        }
        wait_for_flush();

        assert_eq!(doc_count(&index), 1);
        let batches = listener.batches.lock().unwrap();
        assert_eq!(batches.len(), 1, "exactly one notification per batch");
        assert_eq!(batches[0], vec!["note.md".to_string()]);
    }

    #[test]
    fn multiple_paths_flush_as_one_batch() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.md"), "a").unwrap();
        fs::write(temp.path().join("b.md"), "b").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Created(PathBuf::from("a.md")));
        manager.handle_event(VaultEvent::Created(PathBuf::from("b.md")));
        wait_for_flush();

        assert_eq!(doc_count(&index), 2);
        assert_eq!(listener.batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn delete_bypasses_debounce() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "content").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Created(PathBuf::from("note.md")));
        wait_for_flush();
        assert_eq!(doc_count(&index), 1);

        fs::remove_file(temp.path().join("note.md")).unwrap();
        manager.handle_event(VaultEvent::Deleted(PathBuf::from("note.md")));

        // No sleep: removal is synchronous.
        assert_eq!(doc_count(&index), 0);
        assert_eq!(
            listener.removals.lock().unwrap().as_slice(),
            &[vec!["note.md".to_string()]]
        );
    }

    #[test]
    fn delete_cancels_queued_reindex() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "content").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Modified(PathBuf::from("note.md")));
        fs::remove_file(temp.path().join("note.md")).unwrap();
        manager.handle_event(VaultEvent::Deleted(PathBuf::from("note.md")));
        wait_for_flush();

        assert_eq!(doc_count(&index), 0);
        assert!(listener.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn rename_removes_old_and_indexes_new() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.md"), "# Old\n\nmoved content").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Created(PathBuf::from("old.md")));
        wait_for_flush();
        assert_eq!(doc_count(&index), 1);

        fs::rename(temp.path().join("old.md"), temp.path().join("new.md")).unwrap();
        manager.handle_event(VaultEvent::Renamed {
            from: PathBuf::from("old.md"),
            to: PathBuf::from("new.md"),
        });

        // Old path is gone immediately.
        {
            let guard = index.read().unwrap();
            let idx = guard.as_ref().unwrap();
            assert!(idx.internal_id("old.md").is_none());
        }

        wait_for_flush();
        assert_eq!(doc_count(&index), 1);
        let guard = index.read().unwrap();
        let idx = guard.as_ref().unwrap();
        assert!(idx.internal_id("new.md").is_some());
        drop(guard);

        assert_eq!(listener.removals.lock().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_in_batch_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("exists.md"), "here").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Created(PathBuf::from("exists.md")));
        manager.handle_event(VaultEvent::Created(PathBuf::from("ghost.md")));
        wait_for_flush();

        assert_eq!(doc_count(&index), 1);
        let batches = listener.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["exists.md".to_string()]);
    }

    #[test]
    fn shutdown_drops_pending_updates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "content").unwrap();
        let (manager, index, listener) = setup(&temp);

        manager.handle_event(VaultEvent::Modified(PathBuf::from("note.md")));
        manager.shutdown();
        wait_for_flush();

        assert_eq!(doc_count(&index), 0);
        assert!(listener.batches.lock().unwrap().is_empty());
    }

    #[test]
    fn flush_now_skips_the_window() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "content").unwrap();
        let (manager, index, _listener) = setup(&temp);

        manager.handle_event(VaultEvent::Modified(PathBuf::from("note.md")));
        manager.flush_now();

        assert_eq!(doc_count(&index), 1);
    }

    #[test]
    fn events_before_initialization_are_dropped_quietly() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.md"), "content").unwrap();

        let mut config = Config::with_root(temp.path());
        config.sync.debounce_ms = 20;
        config.cache.persist = false;

        let index = shared_index(); // stays None
        let cache = Arc::new(CacheManager::new(&config));
        let manager = SyncManager::new(&config, Arc::clone(&index), cache, Box::new(NullListener));

        manager.handle_event(VaultEvent::Modified(PathBuf::from("note.md")));
        manager.handle_event(VaultEvent::Deleted(PathBuf::from("note.md")));
        wait_for_flush();

        assert!(index.read().unwrap().is_none());
    }

    #[test]
    fn vault_relative_strips_root() {
        let root = Path::new("/vault");
        assert_eq!(
            vault_relative(root, Path::new("/vault/work/a.md")),
            Some(PathBuf::from("work/a.md"))
        );
        assert_eq!(vault_relative(root, Path::new("/elsewhere/a.md")), None);
    }
}
