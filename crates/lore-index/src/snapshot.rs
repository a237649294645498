//! Snapshot sidecar for the persisted index.
//!
//! The engine serializes itself into the index directory; the sidecar
//! carries everything the engine does not persist: the path→internal-id
//! table, the next id, the document count, a schema version, and a hash of
//! the indexing configuration. A snapshot is only trusted when both the
//! version and the hash match the running build - anything else falls
//! through to a full rebuild.

use std::{
    fs,
    hash::{Hash, Hasher},
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher24;

use lore_config::Config;

use crate::IndexError;

/// Current schema version. Bump this when index field definitions change.
pub const SCHEMA_VERSION: u32 = 1;

/// Filename of the snapshot sidecar inside the index directory.
pub const SNAPSHOT_FILENAME: &str = "snapshot.json";

/// Settings that affect index contents and are included in the index hash.
///
/// Changes to any of these invalidate a persisted snapshot.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct IndexFingerprint {
    /// Schema version - changes when index structure changes.
    pub schema_version: u32,
    /// Include patterns that select indexable files.
    pub include: Vec<String>,
    /// Exclude patterns.
    pub exclude: Vec<String>,
}

impl IndexFingerprint {
    /// Extracts the indexing-relevant settings from a config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            include: config.vault.include.clone(),
            exclude: config.vault.exclude.clone(),
        }
    }

    /// Computes the fingerprint hash as a hex string.
    pub fn hash_string(&self) -> String {
        let mut hasher = SipHasher24::new();
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// The persisted snapshot metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version the snapshot was written with.
    pub schema_version: u32,
    /// Hash of the indexing configuration at write time.
    pub index_hash: String,
    /// Number of documents in the engine at write time.
    pub doc_count: u64,
    /// Time of the last full build, epoch seconds.
    pub last_full_build: u64,
    /// Next internal id to mint.
    pub next_id: u64,
    /// Path → live internal id table.
    pub id_map: std::collections::HashMap<String, u64>,
}

impl Snapshot {
    /// Loads a snapshot sidecar from an index directory.
    ///
    /// Returns `Ok(None)` when no sidecar exists. A sidecar that exists but
    /// cannot be parsed is an error - callers treat it as "no usable
    /// snapshot".
    pub fn load(index_dir: &Path) -> Result<Option<Self>, IndexError> {
        let path = sidecar_path(index_dir);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents).map(Some).map_err(|e| {
            IndexError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to parse snapshot: {e}"),
            ))
        })
    }

    /// Writes the snapshot sidecar into an index directory.
    pub fn save(&self, index_dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(index_dir)?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            IndexError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize snapshot: {e}"),
            ))
        })?;

        fs::write(sidecar_path(index_dir), contents)?;
        Ok(())
    }

    /// Returns true if this snapshot was written by the running build.
    pub fn is_compatible(&self, fingerprint: &IndexFingerprint) -> bool {
        self.schema_version == SCHEMA_VERSION && self.index_hash == fingerprint.hash_string()
    }
}

/// Path of the snapshot sidecar within an index directory.
pub fn sidecar_path(index_dir: &Path) -> PathBuf {
    index_dir.join(SNAPSHOT_FILENAME)
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            schema_version: SCHEMA_VERSION,
            index_hash: IndexFingerprint::from_config(&Config::default()).hash_string(),
            doc_count: 2,
            last_full_build: 1_700_000_000,
            next_id: 3,
            id_map: HashMap::from([("a.md".to_string(), 1), ("b.md".to_string(), 2)]),
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let temp = TempDir::new().unwrap();

        snapshot().save(temp.path()).unwrap();
        let loaded = Snapshot::load(temp.path()).unwrap().unwrap();

        assert_eq!(loaded.doc_count, 2);
        assert_eq!(loaded.next_id, 3);
        assert_eq!(loaded.id_map.len(), 2);
        assert_eq!(loaded.id_map.get("a.md"), Some(&1));
    }

    #[test]
    fn missing_sidecar_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(Snapshot::load(temp.path()).unwrap().is_none());
    }

    #[test]
    fn corrupt_sidecar_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::write(sidecar_path(temp.path()), "{not json").unwrap();

        assert!(Snapshot::load(temp.path()).is_err());
    }

    #[test]
    fn compatibility_requires_matching_version() {
        let fingerprint = IndexFingerprint::from_config(&Config::default());
        let mut snap = snapshot();
        assert!(snap.is_compatible(&fingerprint));

        snap.schema_version = SCHEMA_VERSION + 1;
        assert!(!snap.is_compatible(&fingerprint));
    }

    #[test]
    fn compatibility_requires_matching_hash() {
        let fingerprint = IndexFingerprint::from_config(&Config::default());
        let mut snap = snapshot();
        snap.index_hash = "0000000000000000".to_string();
        assert!(!snap.is_compatible(&fingerprint));
    }

    #[test]
    fn fingerprint_changes_with_patterns() {
        let config1 = Config::default();
        let mut config2 = Config::default();
        config2.vault.include.push("**/*.txt".to_string());

        let h1 = IndexFingerprint::from_config(&config1).hash_string();
        let h2 = IndexFingerprint::from_config(&config2).hash_string();
        assert_ne!(h1, h2);
    }

    #[test]
    fn hash_is_hex_string() {
        let hash = IndexFingerprint::from_config(&Config::default()).hash_string();
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
