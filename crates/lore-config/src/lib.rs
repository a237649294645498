//! Configuration system for lore.
//!
//! lore uses a TOML configuration file named `.lore.toml` at the vault root.
//! Configuration is resolved by walking up the directory tree from the
//! current working directory until a `.lore.toml` is found; the directory
//! containing it is the vault root unless `[vault] root` overrides it.

#![warn(missing_docs)]

mod error;
mod patterns;

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::UserDirs;
pub use error::ConfigError;
pub use patterns::CompiledPatterns;
use serde::{Deserialize, Serialize};

/// Name of the configuration file that marks a vault root.
pub const CONFIG_FILENAME: &str = ".lore.toml";

/// Name of the directory under the vault root holding index state.
pub const STATE_DIRNAME: &str = ".lore";

/// Top-level configuration for lore.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Vault location and file patterns.
    pub vault: VaultSettings,
    /// Search behavior settings.
    pub search: SearchSettings,
    /// Incremental sync settings.
    pub sync: SyncSettings,
    /// Index cache settings.
    pub cache: CacheSettings,
}

impl Config {
    /// Loads configuration from a specific `.lore.toml` file.
    ///
    /// A relative `[vault] root` is resolved against the directory containing
    /// the config file; when `root` is unset, that directory is the vault.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(config_path).map_err(|e| ConfigError::ReadFile {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let mut config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseToml {
                path: config_path.to_path_buf(),
                source: e,
            })?;

        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        if config.vault.root.as_os_str().is_empty() {
            config.vault.root = config_dir.to_path_buf();
        } else if config.vault.root.is_relative() {
            config.vault.root = config_dir.join(&config.vault.root);
        }

        Ok(config)
    }

    /// Discovers and loads configuration starting from `cwd`.
    ///
    /// Walks up the directory tree looking for a `.lore.toml`. Returns
    /// `Ok(None)` when no configuration file exists anywhere above `cwd`.
    pub fn discover(cwd: &Path) -> Result<Option<Self>, ConfigError> {
        match discover_config_file(cwd) {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Creates a default configuration rooted at the given vault directory.
    pub fn with_root(root: &Path) -> Self {
        Self {
            vault: VaultSettings {
                root: root.to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Compiles the vault's include/exclude patterns.
    pub fn compile_patterns(&self) -> Result<CompiledPatterns, ConfigError> {
        CompiledPatterns::compile(&self.vault)
    }

    /// Returns the directory holding the persisted index for this vault.
    pub fn index_dir(&self) -> PathBuf {
        self.vault.root.join(STATE_DIRNAME).join("index")
    }
}

/// Vault location and file selection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VaultSettings {
    /// Vault root directory. Empty means "directory of the config file".
    pub root: PathBuf,
    /// Include patterns for files to index.
    pub include: Vec<String>,
    /// Exclude patterns for files to skip.
    pub exclude: Vec<String>,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            include: vec!["**/*.md".to_string()],
            exclude: Vec::new(),
        }
    }
}

/// Search behavior settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum results per query.
    pub default_limit: usize,
    /// Excerpt length in characters.
    pub excerpt_len: usize,
    /// Whether fuzzy matching is applied to longer single-term queries.
    pub fuzzy: bool,
    /// Whether phrase and term post-filters are case sensitive.
    pub case_sensitive: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            excerpt_len: 200,
            fuzzy: true,
            case_sensitive: false,
        }
    }
}

/// Incremental sync settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Trailing debounce delay for batching file changes, in milliseconds.
    pub debounce_ms: u64,
    /// Delay for coalescing index persistence after changes, in seconds.
    pub persist_debounce_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            persist_debounce_secs: 30,
        }
    }
}

/// Index cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether the index is persisted to disk at all.
    pub persist: bool,
    /// Minimum ratio of cached to live document count below which a
    /// persisted snapshot is discarded and the index rebuilt.
    pub staleness_fraction: f64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            persist: true,
            staleness_fraction: 0.8,
        }
    }
}

/// Finds the nearest `.lore.toml` at or above the given directory.
pub fn discover_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

/// Returns the path of the per-user global `.lore.toml`, if a home
/// directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}
