//! Excerpt generation.
//!
//! Builds a short display excerpt from the full stored body of a note,
//! centered on the first occurrence of a search term.

/// Maximum share of the excerpt placed before the matched term.
const LEAD_FRACTION: usize = 3;

/// Builds an excerpt of at most `max_chars` characters from `body`.
///
/// The window is positioned around the first case-insensitive occurrence of
/// any of `terms` (earliest match wins); with no match the excerpt is the
/// start of the body. Cut edges are marked with `…`.
pub fn make_excerpt(body: &str, terms: &[&str], max_chars: usize) -> String {
    let chars: Vec<char> = body.chars().collect();
    if chars.len() <= max_chars {
        return body.to_string();
    }

    let match_pos = first_match(body, terms);

    // Lead-in: a third of the window before the match, the rest after.
    let start = match match_pos {
        Some(pos) => pos.saturating_sub(max_chars / LEAD_FRACTION),
        None => 0,
    };
    let start = start.min(chars.len().saturating_sub(max_chars));
    let end = (start + max_chars).min(chars.len());

    let mut excerpt: String = chars[start..end].iter().collect();
    if start > 0 {
        excerpt = format!("…{}", excerpt.trim_start());
    }
    if end < chars.len() {
        excerpt = format!("{}…", excerpt.trim_end());
    }
    excerpt
}

/// Finds the character position of the earliest case-insensitive occurrence
/// of any term.
fn first_match(body: &str, terms: &[&str]) -> Option<usize> {
    let lower_body = body.to_lowercase();
    terms
        .iter()
        .filter(|t| !t.is_empty())
        .filter_map(|term| {
            lower_body
                .find(&term.to_lowercase())
                .map(|byte_pos| lower_body[..byte_pos].chars().count())
        })
        .min()
}
