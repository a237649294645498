//! Query parsing for lore note search.
//!
//! This crate turns a raw query string into a structured [`ParsedQuery`]:
//!
//! - **Free text**: `quarterly planning` - ranked full-text terms
//! - **Phrases**: `"error handling"` - exact sequences, matched verbatim
//! - **Tags**: `#project`, `-#old`, `tag:project` - include/exclude by tag
//! - **Paths**: `path:work`, `folder:work` - prefix match on folder or path
//! - **Titles**: `title:plan`, `file:plan` - title containment
//! - **Headings**: `heading:setup`, `heading:(setup guide)` - heading terms
//! - **Dates**: `created:>2024-01-01`, `modified:<2024-06-30` - day filters
//! - **Frontmatter**: `status:draft`, `[tag]:literal` - property equality
//! - **Exclusions**: `-word` - terms that must not appear
//!
//! Parsing is total: there is no error type, and malformed fragments fall
//! back to literal free text.
//!
//! # Example
//!
//! ```
//! use lore_query::parse;
//!
//! let query = parse("#project path:work \"exact phrase\" plan");
//! assert_eq!(query.tags, vec!["project"]);
//! assert_eq!(query.paths, vec!["work"]);
//! assert_eq!(query.phrases, vec!["exact phrase"]);
//! assert_eq!(query.text, "plan");
//! ```

#![warn(missing_docs)]

mod lexer;
mod parser;
mod query;

pub use lexer::{RawToken, tokenize};
pub use parser::parse;
pub use query::{DateField, DateFilter, DateOp, ParsedQuery};
