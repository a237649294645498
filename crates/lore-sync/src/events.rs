//! Typed vault file lifecycle events.
//!
//! The sync manager consumes these without knowing how they were delivered;
//! the notify-backed watcher is one producer, tests are another.

use std::path::PathBuf;

/// A file lifecycle event, with vault-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// A trackable file appeared.
    Created(PathBuf),
    /// A trackable file's content changed.
    Modified(PathBuf),
    /// A trackable file disappeared.
    Deleted(PathBuf),
    /// A trackable file moved.
    Renamed {
        /// Previous vault-relative path.
        from: PathBuf,
        /// New vault-relative path.
        to: PathBuf,
    },
}
