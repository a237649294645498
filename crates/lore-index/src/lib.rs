//! Tantivy-based search index and retrieval engine for lore.
//!
//! This crate is the stateful core of lore:
//! - [`NoteIndex`]: the index engine wrapper owning the Tantivy index and
//!   the path→internal-id table that makes upserts safe
//! - [`NativeFilter`]: the tagged union of filters the engine evaluates
//!   natively (tags, timestamp ranges)
//! - [`Searcher`] / [`search_index`]: two-phase ranked retrieval - native
//!   search plus application-level post-filters
//! - [`CacheManager`]: index lifecycle - snapshot load with staleness
//!   detection, streaming full rebuild, best-effort persistence
//!
//! # Example
//!
//! ```
//! use lore_document::NoteDocument;
//! use lore_index::{NoteIndex, SearchOptions, search_index};
//! use lore_query::parse;
//!
//! let mut index = NoteIndex::in_memory().unwrap();
//! index
//!     .upsert(&NoteDocument {
//!         path: "work/plan.md".to_string(),
//!         title: "Plan".to_string(),
//!         body: "quarterly planning meeting".to_string(),
//!         tags: vec!["project".to_string()],
//!         folder: "work".to_string(),
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let hits = search_index(&index, &parse("#project planning"), &SearchOptions::default()).unwrap();
//! assert_eq!(hits[0].path, "work/plan.md");
//! ```

#![warn(missing_docs)]

mod cache;
mod discovery;
mod engine;
mod error;
mod filters;
mod post_filter;
mod schema;
mod search;
mod snapshot;

pub use cache::{BuildStats, CacheManager, CancelFlag, InitOutcome};
pub use discovery::discover_notes;
pub use engine::{NoteIndex, ScoredNote};
pub use error::IndexError;
pub use filters::{DateFieldKind, NativeFilter, native_filters};
pub use schema::{NoteSchema, boost};
pub use search::{
    SearchHit, SearchOptions, Searcher, SharedIndex, search_index, shared_index,
};
pub use snapshot::{IndexFingerprint, SCHEMA_VERSION, Snapshot};
