//! Incremental index maintenance for lore.
//!
//! Keeps the search index consistent as vault files change:
//! - [`VaultEvent`]: typed file lifecycle events with vault-relative paths
//! - [`Debouncer`]: trailing debounce with explicit `reset()`/`cancel()`
//! - [`SyncManager`]: coalesces rapid changes per path, applies deletes
//!   immediately, batches re-extraction, and schedules debounced
//!   persistence
//! - [`VaultWatcher`]: notify-backed producer of vault events
//!
//! Ordering guarantees: events for the same path are applied in order
//! (deletes cancel the queued re-index synchronously); there is no
//! cross-path ordering. Searches running during a debounce window simply
//! miss the newest edit - an accepted staleness window.

#![warn(missing_docs)]

mod debounce;
mod error;
mod events;
mod manager;
mod watcher;

pub use debounce::Debouncer;
pub use error::SyncError;
pub use events::VaultEvent;
pub use manager::{ChangeListener, NullListener, SyncManager, vault_relative};
pub use watcher::VaultWatcher;
