//! The parsed query value type.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Which document timestamp a date filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    /// The document creation time.
    Created,
    /// The document modification time.
    Modified,
}

/// How a date filter compares against its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOp {
    /// Strictly before the given calendar day.
    Before,
    /// Strictly after the given calendar day.
    After,
    /// Anywhere within the given calendar day.
    On,
}

/// A single date constraint extracted from the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateFilter {
    /// Timestamp field the filter applies to.
    pub field: DateField,
    /// Comparison operator.
    pub op: DateOp,
    /// The calendar day being compared against.
    pub date: NaiveDate,
}

/// A structured query produced by [`parse`](crate::parse).
///
/// Every token of the raw query string ends up in exactly one field:
/// either consumed by a structured extraction rule, or left in the
/// residual free [`text`](Self::text).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedQuery {
    /// Residual free text after all structured tokens were removed,
    /// whitespace-collapsed.
    pub text: String,
    /// Exact phrases from `"..."` tokens, in query order.
    pub phrases: Vec<String>,
    /// Included tags from `#name` and `tag:name` tokens. Duplicates kept.
    pub tags: Vec<String>,
    /// Excluded tags from `-#name` tokens.
    pub excluded_tags: Vec<String>,
    /// Excluded free-text terms from `-word` tokens.
    pub excluded_terms: Vec<String>,
    /// Path prefix filters from `path:` and `folder:` tokens, in query order.
    pub paths: Vec<String>,
    /// Title filters from `file:` and `title:` tokens.
    pub titles: Vec<String>,
    /// Heading-content filters from `heading:` tokens (grouped or single).
    pub headings: Vec<String>,
    /// Frontmatter equality filters from `[key]:value` and generic
    /// `key:value` tokens. Keys are unique; a repeated key overwrites.
    pub properties: BTreeMap<String, String>,
    /// Date filters from `created:` and `modified:` tokens.
    pub dates: Vec<DateFilter>,
}

impl ParsedQuery {
    /// Returns true if the query carries no text, phrases, or filters at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.has_filters() && self.phrases.is_empty()
    }

    /// Returns true if any structured filter was extracted.
    pub fn has_filters(&self) -> bool {
        !self.tags.is_empty()
            || !self.excluded_tags.is_empty()
            || !self.excluded_terms.is_empty()
            || !self.paths.is_empty()
            || !self.titles.is_empty()
            || !self.headings.is_empty()
            || !self.properties.is_empty()
            || !self.dates.is_empty()
    }
}
