//! Error types for the lore-sync crate.

use thiserror::Error;

/// Errors that can occur while setting up incremental sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The filesystem watcher could not be started.
    #[error("failed to start file watcher: {0}")]
    Watch(#[from] notify::Error),

    /// The vault patterns could not be compiled.
    #[error("invalid vault patterns: {0}")]
    Patterns(String),
}
