//! Query parser.
//!
//! Classifies the raw token stream into the structured fields of a
//! [`ParsedQuery`]. Classification precedence follows the extraction order
//! of the query language, so a generic `key:value` catch-all can never
//! consume a token a more specific rule handles:
//!
//! 1. quoted phrases
//! 2. negated tags `-#name`
//! 3. tags `#name` (nested `parent/child` allowed)
//! 4. bracketed frontmatter filters `[key]:value`
//! 5. reserved prefixes: `path:`/`folder:`, `file:`/`title:`, `tag:`,
//!    `heading:` (single term or `heading:(a b)` group),
//!    `created:`/`modified:` with an optional `>`/`<` operator
//! 6. generic `key:value` frontmatter catch-all (reserved keys excluded)
//! 7. negated bare terms `-word`
//! 8. everything else: residual free text
//!
//! Parsing is total. Malformed fragments (bad dates, reserved prefixes with
//! no rule, stray punctuation) degrade to literal free text, never errors.

use chrono::NaiveDate;

use crate::{
    DateField, DateFilter, DateOp, ParsedQuery,
    lexer::{RawToken, tokenize},
};

/// Prefix keys with a reserved meaning.
///
/// The generic frontmatter catch-all must skip these even when no specific
/// rule consumed the token (`line:` and `section:` are reserved without a
/// filter rule here and degrade to free text).
const RESERVED_KEYS: &[&str] = &[
    "path", "folder", "created", "modified", "title", "heading", "file", "tag", "line", "section",
];

/// Parses a raw query string into a [`ParsedQuery`].
///
/// This is a total function: every input produces a query, and every
/// non-whitespace fragment of the input lands either in a structured field
/// or in the residual free text.
pub fn parse(raw: &str) -> ParsedQuery {
    let mut query = ParsedQuery::default();
    let mut residual: Vec<String> = Vec::new();

    for token in tokenize(raw) {
        match token {
            RawToken::Phrase(content) => {
                if !content.trim().is_empty() {
                    query.phrases.push(content);
                }
            }
            RawToken::Word(word) => classify_word(word, &mut query, &mut residual),
        }
    }

    query.text = residual.join(" ");
    query
}

/// Routes a single word token into the right query field.
fn classify_word(word: String, query: &mut ParsedQuery, residual: &mut Vec<String>) {
    // Negated tag, before plain tags and before bare negation.
    if let Some(name) = word.strip_prefix("-#") {
        if name.is_empty() {
            residual.push(word);
        } else {
            query.excluded_tags.push(name.to_string());
        }
        return;
    }

    // Plain tag, including nested `parent/child` names.
    if let Some(name) = word.strip_prefix('#') {
        if name.is_empty() {
            residual.push(word);
        } else {
            query.tags.push(name.to_string());
        }
        return;
    }

    // Bracketed frontmatter filter: `[key]:value`.
    if word.starts_with('[') {
        if let Some((key, value)) = split_bracketed(&word) {
            query.properties.insert(key.to_string(), value.to_string());
            return;
        }
    }

    // Prefix filters: `key:value` with a well-formed key.
    if let Some((key, value)) = split_prefix(&word) {
        if classify_prefix(key, value, query) {
            return;
        }
        if !RESERVED_KEYS.contains(&key) {
            query.properties.insert(key.to_string(), value.to_string());
            return;
        }
        // Reserved key whose rule rejected the value (bad date) or that has
        // no rule at all (`line:`, `section:`): literal text.
        residual.push(word);
        return;
    }

    // Bare negated term, last among the structured rules.
    if let Some(term) = word.strip_prefix('-') {
        if !term.is_empty() {
            query.excluded_terms.push(term.to_string());
            return;
        }
    }

    residual.push(word);
}

/// Applies the rule for a reserved prefix key.
///
/// Returns `true` when the token was consumed. A reserved key with an
/// unusable value (e.g. a malformed date) returns `false` so the caller can
/// degrade the whole token to free text.
fn classify_prefix(key: &str, value: &str, query: &mut ParsedQuery) -> bool {
    match key {
        "path" | "folder" => {
            query.paths.push(value.to_string());
            true
        }
        "file" | "title" => {
            query.titles.push(value.to_string());
            true
        }
        "tag" => {
            let name = value.strip_prefix('#').unwrap_or(value);
            query.tags.push(name.to_string());
            true
        }
        "heading" => {
            match split_group(value) {
                Some(terms) => query.headings.extend(terms),
                None => query.headings.push(value.to_string()),
            }
            true
        }
        "created" => push_date(DateField::Created, value, query),
        "modified" => push_date(DateField::Modified, value, query),
        _ => false,
    }
}

/// Parses a date filter value (`>2024-01-01`, `<2024-01-01`, `2024-01-01`).
fn push_date(field: DateField, value: &str, query: &mut ParsedQuery) -> bool {
    let (op, date_str) = match value.chars().next() {
        Some('>') => (DateOp::After, &value[1..]),
        Some('<') => (DateOp::Before, &value[1..]),
        _ => (DateOp::On, value),
    };

    match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        Ok(date) => {
            query.dates.push(DateFilter { field, op, date });
            true
        }
        Err(_) => false,
    }
}

/// Splits a `key:value` token at the first colon.
///
/// Returns `None` when the key is empty or contains characters that cannot
/// start a prefix (anything other than ASCII alphanumerics, `_`, or an
/// interior `-`), so tokens like `-path:x` or `::x` stay available for the
/// later rules.
fn split_prefix(word: &str) -> Option<(&str, &str)> {
    let (key, value) = word.split_once(':')?;
    if key.is_empty() || key.starts_with('-') {
        return None;
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some((key, value))
}

/// Splits a `[key]:value` token into key and value.
fn split_bracketed(word: &str) -> Option<(&str, &str)> {
    let (bracketed, value) = word.split_once(':')?;
    let key = bracketed.strip_prefix('[')?.strip_suffix(']')?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Splits a parenthesized group value into its whitespace-separated terms.
fn split_group(value: &str) -> Option<Vec<String>> {
    let inner = value.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split_whitespace().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_query() {
        let query = parse("");
        assert!(query.is_empty());

        let query = parse("   ");
        assert!(query.is_empty());
    }

    #[test]
    fn plain_text_stays_residual() {
        let query = parse("quarterly   planning meeting");
        assert_eq!(query.text, "quarterly planning meeting");
        assert!(!query.has_filters());
    }

    #[test]
    fn phrases_are_extracted() {
        let query = parse("\"error handling\" rust");
        assert_eq!(query.phrases, vec!["error handling"]);
        assert_eq!(query.text, "rust");
    }

    #[test]
    fn empty_phrase_is_dropped() {
        let query = parse("\"\" \"  \" rust");
        assert!(query.phrases.is_empty());
        assert_eq!(query.text, "rust");
    }

    #[test]
    fn tags_and_negated_tags() {
        let query = parse("#project -#old notes");
        assert_eq!(query.tags, vec!["project"]);
        assert_eq!(query.excluded_tags, vec!["old"]);
        assert_eq!(query.text, "notes");
    }

    #[test]
    fn nested_tags_keep_segments() {
        let query = parse("#work/projects/alpha");
        assert_eq!(query.tags, vec!["work/projects/alpha"]);
    }

    #[test]
    fn bare_hash_is_literal() {
        let query = parse("# -#");
        assert!(query.tags.is_empty());
        assert!(query.excluded_tags.is_empty());
        assert_eq!(query.text, "# -#");
    }

    #[test]
    fn path_and_folder_are_aliases() {
        let query = parse("path:work folder:personal/journal");
        assert_eq!(query.paths, vec!["work", "personal/journal"]);
    }

    #[test]
    fn file_and_title_are_aliases() {
        let query = parse("file:readme title:plan");
        assert_eq!(query.titles, vec!["readme", "plan"]);
    }

    #[test]
    fn tag_prefix_strips_leading_hash() {
        let query = parse("tag:#project tag:inbox");
        assert_eq!(query.tags, vec!["project", "inbox"]);
    }

    #[test]
    fn heading_single_term() {
        let query = parse("heading:setup");
        assert_eq!(query.headings, vec!["setup"]);
    }

    #[test]
    fn heading_group_splits_terms() {
        let query = parse("heading:(setup guide) rust");
        assert_eq!(query.headings, vec!["setup", "guide"]);
        assert_eq!(query.text, "rust");
    }

    #[test]
    fn created_date_operators() {
        let query = parse("created:>2024-01-01 created:<2024-06-30 created:2024-03-15");
        assert_eq!(
            query.dates,
            vec![
                DateFilter {
                    field: DateField::Created,
                    op: DateOp::After,
                    date: date(2024, 1, 1)
                },
                DateFilter {
                    field: DateField::Created,
                    op: DateOp::Before,
                    date: date(2024, 6, 30)
                },
                DateFilter {
                    field: DateField::Created,
                    op: DateOp::On,
                    date: date(2024, 3, 15)
                },
            ]
        );
    }

    #[test]
    fn modified_date_filter() {
        let query = parse("modified:>2023-12-31");
        assert_eq!(query.dates.len(), 1);
        assert_eq!(query.dates[0].field, DateField::Modified);
        assert_eq!(query.dates[0].op, DateOp::After);
    }

    #[test]
    fn malformed_date_degrades_to_text() {
        let query = parse("created:yesterday modified:2024-13-99 created:");
        assert!(query.dates.is_empty());
        assert_eq!(query.text, "created:yesterday modified:2024-13-99 created:");
    }

    #[test]
    fn generic_key_value_becomes_property_filter() {
        let query = parse("status:draft author:someone");
        assert_eq!(query.properties.get("status"), Some(&"draft".to_string()));
        assert_eq!(query.properties.get("author"), Some(&"someone".to_string()));
        assert!(query.text.is_empty());
    }

    #[test]
    fn bracketed_key_escapes_reserved_names() {
        let query = parse("[tag]:literal [status]:done");
        assert_eq!(query.properties.get("tag"), Some(&"literal".to_string()));
        assert_eq!(query.properties.get("status"), Some(&"done".to_string()));
        assert!(query.tags.is_empty());
    }

    #[test]
    fn reserved_keys_never_reach_the_catch_all() {
        // `line:` and `section:` are reserved but have no filter rule.
        let query = parse("line:42 section:intro");
        assert!(query.properties.is_empty());
        assert_eq!(query.text, "line:42 section:intro");
    }

    #[test]
    fn repeated_property_key_overwrites() {
        let query = parse("status:draft status:final");
        assert_eq!(query.properties.get("status"), Some(&"final".to_string()));
        assert_eq!(query.properties.len(), 1);
    }

    #[test]
    fn negated_bare_terms() {
        let query = parse("meeting -dentist -draft");
        assert_eq!(query.excluded_terms, vec!["dentist", "draft"]);
        assert_eq!(query.text, "meeting");
    }

    #[test]
    fn lone_dash_is_literal() {
        let query = parse("a - b");
        assert_eq!(query.text, "a - b");
        assert!(query.excluded_terms.is_empty());
    }

    #[test]
    fn negated_prefix_token_is_an_excluded_term() {
        let query = parse("-path:work");
        assert!(query.paths.is_empty());
        assert_eq!(query.excluded_terms, vec!["path:work"]);
    }

    #[test]
    fn empty_prefix_value_is_accepted() {
        let query = parse("path: tag:");
        assert_eq!(query.paths, vec![""]);
        assert_eq!(query.tags, vec![""]);
    }

    #[test]
    fn duplicate_tags_and_paths_are_kept() {
        let query = parse("#a #a path:x path:x");
        assert_eq!(query.tags, vec!["a", "a"]);
        assert_eq!(query.paths, vec!["x", "x"]);
    }

    #[test]
    fn colon_leading_token_is_literal() {
        let query = parse(":foo ::bar");
        assert_eq!(query.text, ":foo ::bar");
        assert!(query.properties.is_empty());
    }

    #[test]
    fn mixed_query_routes_every_token() {
        let query = parse(
            "\"exact phrase\" #project -#old path:work created:>2024-01-01 status:open -noise plan",
        );
        assert_eq!(query.phrases, vec!["exact phrase"]);
        assert_eq!(query.tags, vec!["project"]);
        assert_eq!(query.excluded_tags, vec!["old"]);
        assert_eq!(query.paths, vec!["work"]);
        assert_eq!(query.dates.len(), 1);
        assert_eq!(query.properties.get("status"), Some(&"open".to_string()));
        assert_eq!(query.excluded_terms, vec!["noise"]);
        assert_eq!(query.text, "plan");
    }

    /// Reconstructs a query from its parsed fields using canonical syntax.
    ///
    /// Only valid for queries that use canonical (non-alias) prefixes.
    fn reconstruct(query: &ParsedQuery) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(query.phrases.iter().map(|p| format!("\"{p}\"")));
        parts.extend(query.tags.iter().map(|t| format!("#{t}")));
        parts.extend(query.excluded_tags.iter().map(|t| format!("-#{t}")));
        parts.extend(query.paths.iter().map(|p| format!("path:{p}")));
        parts.extend(query.properties.iter().map(|(k, v)| format!("{k}:{v}")));
        parts.extend(query.excluded_terms.iter().map(|t| format!("-{t}")));
        if !query.text.is_empty() {
            parts.push(query.text.clone());
        }
        parts.join(" ")
    }

    /// Multiset of non-whitespace characters.
    fn char_counts(s: &str) -> std::collections::BTreeMap<char, usize> {
        let mut counts = std::collections::BTreeMap::new();
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            *counts.entry(c).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn no_token_is_silently_lost() {
        // Every non-whitespace character of the input must be accounted for
        // by some parsed field (canonical prefixes only, so the
        // reconstruction is exact).
        let samples = [
            "plain text query",
            "\"a phrase\" trailing",
            "#tag -#other -excluded path:work/sub",
            "status:open weird-token#notatag",
            "path: -x #a #a",
            "created:not-a-date leftovers",
        ];

        for sample in samples {
            let query = parse(sample);
            assert_eq!(
                char_counts(&reconstruct(&query)),
                char_counts(sample),
                "characters lost or invented for {sample:?}"
            );
        }
    }
}
