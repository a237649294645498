//! Application-level post-filters.
//!
//! The engine can natively filter on tags and timestamp ranges; everything
//! else a query expresses - phrase exactness, path prefixes, case
//! sensitivity, exclusions, heading terms, frontmatter equality - is
//! enforced here, as pure predicates over the engine's candidate set.
//! Post-filtering only shrinks the candidate list, so callers over-fetch
//! before truncating.

use lore_document::NoteDocument;
use lore_query::ParsedQuery;

/// Returns true when a candidate note satisfies every post-filter of the
/// query. The individual passes are order-independent.
pub fn passes(note: &NoteDocument, query: &ParsedQuery, case_sensitive: bool) -> bool {
    matches_paths(note, &query.paths)
        && matches_phrases(note, &query.phrases, case_sensitive)
        && matches_case_sensitive_terms(note, &query.text, case_sensitive)
        && excludes_terms(note, &query.excluded_terms)
        && excludes_tags(note, &query.excluded_tags)
        && matches_titles(note, &query.titles)
        && matches_headings(note, &query.headings)
        && matches_properties(note, query)
}

/// Path/folder prefix matching, case-insensitive.
///
/// A note matches filter `p` when its folder equals `p`, its folder starts
/// with `p/`, its path starts with `p/`, or its path equals `p`.
fn matches_paths(note: &NoteDocument, paths: &[String]) -> bool {
    paths.iter().all(|p| {
        let p = p.to_lowercase();
        let folder = note.folder.to_lowercase();
        let path = note.path.to_lowercase();
        let prefix = format!("{p}/");

        folder == p || folder.starts_with(&prefix) || path.starts_with(&prefix) || path == p
    })
}

/// Exact phrase containment over title, headings, and body.
fn matches_phrases(note: &NoteDocument, phrases: &[String], case_sensitive: bool) -> bool {
    if phrases.is_empty() {
        return true;
    }

    let haystack = full_text(note);
    phrases.iter().all(|phrase| {
        if case_sensitive {
            haystack.contains(phrase.as_str())
        } else {
            haystack.to_lowercase().contains(&phrase.to_lowercase())
        }
    })
}

/// Case-sensitive term containment, engaged only when the flag is set
/// (the engine itself matches case-insensitively).
fn matches_case_sensitive_terms(note: &NoteDocument, text: &str, case_sensitive: bool) -> bool {
    if !case_sensitive {
        return true;
    }

    let haystack = full_text(note);
    text.split_whitespace().all(|term| haystack.contains(term))
}

/// Every excluded term must be absent (case-insensitive).
fn excludes_terms(note: &NoteDocument, excluded: &[String]) -> bool {
    if excluded.is_empty() {
        return true;
    }

    let haystack = full_text(note).to_lowercase();
    excluded
        .iter()
        .all(|term| !haystack.contains(&term.to_lowercase()))
}

/// Every excluded tag must be absent.
fn excludes_tags(note: &NoteDocument, excluded: &[String]) -> bool {
    excluded.iter().all(|ex| {
        !note
            .tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(ex))
    })
}

/// Every title filter must be contained in the title (case-insensitive).
fn matches_titles(note: &NoteDocument, titles: &[String]) -> bool {
    let title = note.title.to_lowercase();
    titles.iter().all(|t| title.contains(&t.to_lowercase()))
}

/// For each heading term, at least one heading must contain it.
fn matches_headings(note: &NoteDocument, headings: &[String]) -> bool {
    headings.iter().all(|term| {
        let term = term.to_lowercase();
        note.headings
            .iter()
            .any(|h| h.to_lowercase().contains(&term))
    })
}

/// Frontmatter equality: each `key:value` filter must appear in the note's
/// flattened frontmatter blob (substring containment, case-insensitive).
fn matches_properties(note: &NoteDocument, query: &ParsedQuery) -> bool {
    if query.properties.is_empty() {
        return true;
    }

    let blob = note.properties.to_lowercase();
    query
        .properties
        .iter()
        .all(|(key, value)| blob.contains(&format!("{key}:{value}").to_lowercase()))
}

/// Concatenated title, headings, and body - the haystack for phrase and
/// term containment checks.
fn full_text(note: &NoteDocument) -> String {
    let mut text = String::with_capacity(
        note.title.len() + note.body.len() + note.headings.iter().map(String::len).sum::<usize>(),
    );
    text.push_str(&note.title);
    for heading in &note.headings {
        text.push(' ');
        text.push_str(heading);
    }
    text.push(' ');
    text.push_str(&note.body);
    text
}
