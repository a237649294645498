//! Search execution: two-phase ranked retrieval.
//!
//! Phase one asks the engine for candidates using only the filters it can
//! evaluate natively (free-text relevance, tag containment, timestamp
//! ranges). Phase two applies the post-filters the engine cannot express
//! and truncates to the requested limit. Because post-filtering only
//! shrinks the candidate set, the engine is over-fetched by a fixed factor
//! whenever any post-filter is active.

use std::{
    ops::Range,
    sync::{Arc, RwLock},
};

use chrono::DateTime;
use lore_config::SearchSettings;
use lore_document::make_excerpt;
use lore_query::ParsedQuery;

use crate::{
    IndexError, NoteIndex,
    engine::ScoredNote,
    filters::native_filters,
    post_filter,
};

/// Over-fetch factor applied when any post-filter is active.
const OVERFETCH_FACTOR: usize = 10;

/// Minimum length of a phrase word worth sending to the engine.
const MIN_PHRASE_WORD_LEN: usize = 3;

/// Term length above which fuzzy matching may engage.
const FUZZY_MIN_TERM_LEN: usize = 5;

/// Score provenance for engine text relevance.
const PROVENANCE_TEXT: &str = "text";

/// The shared, possibly not-yet-initialized index.
///
/// `None` means the engine is not ready: searches return empty results
/// rather than failing.
pub type SharedIndex = Arc<RwLock<Option<NoteIndex>>>;

/// Creates an empty (not ready) shared index handle.
pub fn shared_index() -> SharedIndex {
    Arc::new(RwLock::new(None))
}

/// Options controlling a single search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results. Must be positive.
    pub limit: usize,
    /// Excerpt length in characters. Must be positive.
    pub excerpt_len: usize,
    /// Whether fuzzy matching may be applied.
    pub fuzzy: bool,
    /// Whether phrase and term post-filters are case sensitive.
    pub case_sensitive: bool,
}

impl SearchOptions {
    /// Builds options from configured search settings.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self {
            limit: settings.default_limit,
            excerpt_len: settings.excerpt_len,
            fuzzy: settings.fuzzy,
            case_sensitive: settings.case_sensitive,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_settings(&SearchSettings::default())
    }
}

/// A single ranked search result. Ephemeral: recomputed per query.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    /// Vault-relative path of the note.
    pub path: String,
    /// Note title.
    pub title: String,
    /// Engine-native relevance score.
    pub score: f32,
    /// Where the score came from.
    pub provenance: String,
    /// Display excerpt from the full stored body.
    pub excerpt: String,
    /// Query tags the note actually carries.
    pub matched_tags: Vec<String>,
    /// Parent folder of the note.
    pub folder: String,
    /// Creation day as `YYYY-MM-DD`.
    pub created: String,
    /// Modification day as `YYYY-MM-DD`.
    pub modified: String,
    /// Byte ranges within the excerpt where query terms match, sorted and
    /// non-overlapping.
    pub highlights: Vec<Range<usize>>,
}

/// Searches the shared index.
///
/// This is the query-side facade: it holds the same index handle the sync
/// pipeline mutates, and treats a not-yet-initialized engine as "no
/// results yet".
pub struct Searcher {
    /// Shared handle to the index.
    index: SharedIndex,
}

impl Searcher {
    /// Creates a searcher over a shared index handle.
    pub fn new(index: SharedIndex) -> Self {
        Self { index }
    }

    /// Executes a search, returning at most `options.limit` ranked hits.
    ///
    /// Returns an empty list when the engine is not initialized yet.
    pub fn search(
        &self,
        query: &ParsedQuery,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>, IndexError> {
        let guard = match self.index.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match guard.as_ref() {
            Some(index) => search_index(index, query, options),
            None => Ok(Vec::new()),
        }
    }
}

/// Executes a search directly against an index.
pub fn search_index(
    index: &NoteIndex,
    query: &ParsedQuery,
    options: &SearchOptions,
) -> Result<Vec<SearchHit>, IndexError> {
    if options.limit == 0 {
        return Err(IndexError::InvalidArgument("limit must be positive".into()));
    }
    if options.excerpt_len == 0 {
        return Err(IndexError::InvalidArgument(
            "excerpt length must be positive".into(),
        ));
    }

    if query.is_empty() {
        return Ok(Vec::new());
    }

    let term = engine_term(query);
    let filters = native_filters(&query.tags, &query.dates);

    let post_filtering = has_post_filters(query, options.case_sensitive);
    let fetch_limit = if post_filtering {
        options.limit * OVERFETCH_FACTOR
    } else {
        options.limit
    };

    let fuzzy_distance = if options.fuzzy
        && query.phrases.is_empty()
        && term.chars().count() >= FUZZY_MIN_TERM_LEN
    {
        1
    } else {
        0
    };

    let mut candidates = index.search_native(&term, &filters, fuzzy_distance, fetch_limit)?;

    // A fuzzy search that comes back empty is retried exactly once with
    // exact matching - never silently empty when an exact match exists.
    if fuzzy_distance > 0 && candidates.is_empty() {
        candidates = index.search_native(&term, &filters, 0, fetch_limit)?;
    }

    let hits = candidates
        .into_iter()
        .filter(|c| post_filter::passes(&c.note, query, options.case_sensitive))
        .take(options.limit)
        .map(|c| shape_hit(c, query, options))
        .collect();

    Ok(hits)
}

/// Builds the term string sent to the engine: the residual free text plus,
/// per phrase, only its single longest non-trivial word. The engine's
/// tokenizer is not phrase-aware; exact phrase matching is entirely the
/// post-filter's job.
fn engine_term(query: &ParsedQuery) -> String {
    let mut term = query.text.clone();

    for phrase in &query.phrases {
        let longest = phrase
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_PHRASE_WORD_LEN)
            .max_by_key(|w| w.chars().count());
        if let Some(word) = longest {
            if !term.is_empty() {
                term.push(' ');
            }
            term.push_str(word);
        }
    }

    term
}

/// Whether any application-level filter is active for this query.
fn has_post_filters(query: &ParsedQuery, case_sensitive: bool) -> bool {
    case_sensitive
        || !query.phrases.is_empty()
        || !query.paths.is_empty()
        || !query.titles.is_empty()
        || !query.headings.is_empty()
        || !query.properties.is_empty()
        || !query.excluded_terms.is_empty()
        || !query.excluded_tags.is_empty()
}

/// Maps an engine candidate to a display-ready hit.
fn shape_hit(candidate: ScoredNote, query: &ParsedQuery, options: &SearchOptions) -> SearchHit {
    let note = candidate.note;

    let mut excerpt_terms: Vec<&str> = query.text.split_whitespace().collect();
    excerpt_terms.extend(query.phrases.iter().map(String::as_str));

    // Always computed from the full stored body, so the configured excerpt
    // length is honored regardless of what the engine previewed.
    let excerpt = make_excerpt(&note.body, &excerpt_terms, options.excerpt_len);
    let highlights = term_ranges(&excerpt, &excerpt_terms);

    let matched_tags = query
        .tags
        .iter()
        .filter(|t| note.tags.iter().any(|tag| tag.eq_ignore_ascii_case(t)))
        .cloned()
        .collect();

    SearchHit {
        path: note.path,
        title: note.title,
        score: candidate.score,
        provenance: PROVENANCE_TEXT.to_string(),
        excerpt,
        matched_tags,
        folder: note.folder,
        created: display_day(note.created_ms),
        modified: display_day(note.modified_ms),
        highlights,
    }
}

/// Formats epoch millis as a `YYYY-MM-DD` display string.
fn display_day(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Finds the byte ranges of every term occurrence in the excerpt
/// (ASCII-case-insensitive), merged and sorted.
fn term_ranges(excerpt: &str, terms: &[&str]) -> Vec<Range<usize>> {
    let haystack = excerpt.to_ascii_lowercase();
    let mut ranges = Vec::new();

    for term in terms {
        if term.is_empty() {
            continue;
        }
        let needle = term.to_ascii_lowercase();
        let mut offset = 0;
        while let Some(pos) = haystack[offset..].find(&needle) {
            let start = offset + pos;
            ranges.push(start..start + needle.len());
            offset = start + needle.len();
        }
    }

    merge_ranges(ranges)
}

/// Merges overlapping or adjacent byte ranges, sorted by start.
fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    if ranges.is_empty() {
        return ranges;
    }

    ranges.sort_by_key(|r| r.start);

    let mut merged = Vec::with_capacity(ranges.len());
    let mut current = ranges[0].clone();

    for range in ranges.into_iter().skip(1) {
        if range.start <= current.end {
            current.end = current.end.max(range.end);
        } else {
            merged.push(current);
            current = range;
        }
    }
    merged.push(current);

    merged
}
