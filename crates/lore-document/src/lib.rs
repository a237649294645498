//! Note extraction and text utilities for lore.
//!
//! This crate converts raw markdown files into flat, index-ready
//! [`NoteDocument`]s:
//! - YAML frontmatter parsing (generic: every key is kept and flattened)
//! - markdown stripping to plain body text
//! - heading and inline-tag extraction
//! - excerpt generation for search result display
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use lore_document::extract_from_parts;
//!
//! let content = "---\ntitle: Plan\ntags: [work]\n---\n\n# Goals\n\nShip it.";
//! let doc = extract_from_parts(Path::new("work/plan.md"), content, 0, 0);
//! assert_eq!(doc.title, "Plan");
//! assert_eq!(doc.folder, "work");
//! assert_eq!(doc.headings, vec!["Goals"]);
//! ```

#![warn(missing_docs)]

mod error;
mod excerpt;
mod extract;
mod frontmatter;
mod markdown;

pub use error::DocumentError;
pub use excerpt::make_excerpt;
pub use extract::{NoteDocument, extract, extract_from_parts, rel_path_string};
pub use frontmatter::{Frontmatter, parse_frontmatter};
pub use markdown::{collapse_whitespace, extract_headings, extract_inline_tags, strip_markdown};
