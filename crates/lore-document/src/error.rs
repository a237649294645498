//! Error types for the lore-document crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while extracting a note.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read the note file.
    #[error("failed to read note {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to read file metadata (timestamps).
    #[error("failed to read metadata for {path}: {source}")]
    Metadata {
        /// Path to the file whose metadata could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}
