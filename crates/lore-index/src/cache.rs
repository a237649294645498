//! Index lifecycle: load-from-snapshot-or-rebuild, staleness detection,
//! streaming full rebuild, and best-effort persistence.
//!
//! Initialization prefers the persisted snapshot; any reason it cannot be
//! trusted (missing, corrupt, wrong schema version, stale against the live
//! file count) is logged and falls through to a full rebuild. Persistence
//! failures are never fatal - the in-memory index stays usable, only
//! durability is lost until the next successful persist.

use std::{
    fs,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use lore_config::{CompiledPatterns, Config};
use lore_document::extract;

use crate::{
    IndexError, NoteIndex,
    discovery::discover_notes,
    snapshot::{IndexFingerprint, SCHEMA_VERSION, Snapshot},
};

/// Cooperative cancellation flag for long-running rebuilds.
///
/// Checked between files, not preemptive: a rebuild may complete a few
/// extra units after cancellation is requested.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Statistics from a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of notes extracted and inserted.
    pub files_indexed: usize,
    /// Number of files skipped due to extraction errors.
    pub files_skipped: usize,
}

/// How the index was initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A trusted snapshot was loaded.
    LoadedSnapshot,
    /// The index was rebuilt from the vault.
    Rebuilt(BuildStats),
}

/// Owns the index lifecycle for a vault.
pub struct CacheManager {
    /// The vault configuration.
    config: Config,
    /// Directory holding the persisted index.
    index_dir: PathBuf,
    /// Epoch seconds of the last full build (loaded or performed).
    last_full_build: AtomicU64,
}

impl CacheManager {
    /// Creates a cache manager for the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            index_dir: config.index_dir(),
            last_full_build: AtomicU64::new(0),
        }
    }

    /// Initializes the index: loads the persisted snapshot when it can be
    /// trusted, otherwise performs a full rebuild.
    pub fn initialize(&self, cancel: &CancelFlag) -> Result<(NoteIndex, InitOutcome), IndexError> {
        let patterns = self.compile_patterns()?;
        let live_notes = discover_notes(&self.config.vault.root, &patterns)?;

        if self.config.cache.persist {
            match self.try_load(live_notes.len()) {
                Ok(Some(index)) => return Ok((index, InitOutcome::LoadedSnapshot)),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("discarding unusable index snapshot: {e}");
                }
            }
        }

        let mut index = if self.config.cache.persist {
            self.open_for_rebuild()?
        } else {
            NoteIndex::in_memory()?
        };

        let stats = self.rebuild_from(&mut index, &live_notes, cancel)?;
        self.persist(&index);

        Ok((index, InitOutcome::Rebuilt(stats)))
    }

    /// Attempts to load a trusted snapshot.
    ///
    /// Returns `Ok(None)` when no snapshot exists or it is stale; an error
    /// for a corrupt or incompatible one. Both outcomes mean "rebuild".
    fn try_load(&self, live_count: usize) -> Result<Option<NoteIndex>, IndexError> {
        let Some(snapshot) = Snapshot::load(&self.index_dir)? else {
            return Ok(None);
        };

        let fingerprint = IndexFingerprint::from_config(&self.config);
        if !snapshot.is_compatible(&fingerprint) {
            log::warn!("index snapshot was written by a different configuration, rebuilding");
            return Ok(None);
        }

        if is_stale(
            snapshot.doc_count,
            live_count,
            self.config.cache.staleness_fraction,
        ) {
            log::warn!(
                "index snapshot is stale ({} cached vs {} live files), rebuilding",
                snapshot.doc_count,
                live_count
            );
            return Ok(None);
        }

        let mut index = NoteIndex::open(&self.index_dir)?;
        if index.doc_count()? != snapshot.doc_count {
            log::warn!("index contents disagree with snapshot metadata, rebuilding");
            return Ok(None);
        }

        index.restore_identity(snapshot.id_map, snapshot.next_id);
        self.last_full_build
            .store(snapshot.last_full_build, Ordering::Relaxed);

        Ok(Some(index))
    }

    /// Opens the on-disk index for a rebuild. A directory the engine can no
    /// longer open (corrupt metadata) is recreated from scratch - the
    /// rebuild repopulates it anyway.
    fn open_for_rebuild(&self) -> Result<NoteIndex, IndexError> {
        match NoteIndex::open(&self.index_dir) {
            Ok(index) => Ok(index),
            Err(e) => {
                log::warn!("failed to open index directory, recreating: {e}");
                fs::remove_dir_all(&self.index_dir).ok();
                NoteIndex::open(&self.index_dir)
            }
        }
    }

    /// Performs a full rebuild: empties the engine and streams every
    /// trackable note through extraction into the index, one at a time.
    pub fn rebuild(
        &self,
        index: &mut NoteIndex,
        cancel: &CancelFlag,
    ) -> Result<BuildStats, IndexError> {
        let patterns = self.compile_patterns()?;
        let notes = discover_notes(&self.config.vault.root, &patterns)?;
        self.rebuild_from(index, &notes, cancel)
    }

    /// Rebuild over an already-discovered note list.
    fn rebuild_from(
        &self,
        index: &mut NoteIndex,
        notes: &[PathBuf],
        cancel: &CancelFlag,
    ) -> Result<BuildStats, IndexError> {
        index.clear()?;

        let mut stats = BuildStats::default();

        for rel_path in notes {
            if cancel.is_cancelled() {
                break;
            }

            match extract(&self.config.vault.root, rel_path) {
                Ok(doc) => {
                    index.stage(&doc)?;
                    stats.files_indexed += 1;
                }
                Err(e) => {
                    log::warn!("skipping {}: {e}", rel_path.display());
                    stats.files_skipped += 1;
                }
            }
        }

        index.commit()?;
        self.last_full_build.store(now_secs(), Ordering::Relaxed);

        Ok(stats)
    }

    /// Persists the snapshot sidecar. Best effort: failures are logged and
    /// swallowed, and nothing is attempted when persistence is disabled.
    pub fn persist(&self, index: &NoteIndex) {
        if !self.config.cache.persist {
            log::debug!("index persistence disabled, skipping");
            return;
        }

        let doc_count = match index.doc_count() {
            Ok(count) => count,
            Err(e) => {
                log::warn!("failed to read index for persistence: {e}");
                return;
            }
        };

        let (id_map, next_id) = index.identity();
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            index_hash: IndexFingerprint::from_config(&self.config).hash_string(),
            doc_count,
            last_full_build: self.last_full_build.load(Ordering::Relaxed),
            next_id,
            id_map: id_map.clone(),
        };

        if let Err(e) = snapshot.save(&self.index_dir) {
            log::warn!("failed to persist index snapshot: {e}");
        }
    }

    /// Compiles the vault patterns, mapping configuration errors.
    fn compile_patterns(&self) -> Result<CompiledPatterns, IndexError> {
        self.config
            .compile_patterns()
            .map_err(|e| IndexError::Config(e.to_string()))
    }
}

/// The staleness heuristic: a snapshot is stale when its document count has
/// fallen below the configured fraction of the live file count. An empty
/// vault never triggers staleness.
fn is_stale(cached_count: u64, live_count: usize, fraction: f64) -> bool {
    if live_count == 0 {
        return false;
    }
    (cached_count as f64) < (live_count as f64) * fraction
}

/// Current time as epoch seconds.
fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
