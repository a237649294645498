//! Markdown text utilities.
//!
//! Converts markdown to the plain text that gets indexed: formatting
//! markers removed, link targets dropped, code kept as text. Also extracts
//! heading texts and Obsidian-style inline `#tags`.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Strips markdown syntax from content, returning whitespace-collapsed
/// plain text.
///
/// Link and image destinations are dropped (only the visible text is kept);
/// inline and fenced code is kept verbatim.
pub fn strip_markdown(content: &str) -> String {
    let parser = Parser::new(content);
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => {
                text.push_str(&t);
                text.push(' ');
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            _ => {}
        }
    }

    collapse_whitespace(&text)
}

/// Extracts heading texts in document order.
pub fn extract_headings(content: &str) -> Vec<String> {
    let parser = Parser::new(content);
    let mut headings = Vec::new();
    let mut current: Option<String> = None;

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current = Some(String::new());
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(ref mut heading) = current {
                    heading.push_str(&t);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    let heading = heading.trim().to_string();
                    if !heading.is_empty() {
                        headings.push(heading);
                    }
                }
            }
            _ => {}
        }
    }

    headings
}

/// Extracts inline `#tag` occurrences from markdown content.
///
/// A tag starts with `#` at the beginning of the text or after whitespace,
/// continues over alphanumerics, `_`, `-`, and `/` (nested tags), and must
/// contain at least one non-digit character (so `#123` and `# heading`
/// markers are not tags).
pub fn extract_inline_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut prev_is_boundary = true;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '#' && prev_is_boundary {
            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' || next == '-' || next == '/' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if !name.is_empty() && name.chars().any(|c| !c.is_ascii_digit()) {
                tags.push(name);
            }
            prev_is_boundary = false;
        } else {
            prev_is_boundary = ch.is_whitespace();
        }
    }

    tags
}

/// Collapses all runs of whitespace into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
