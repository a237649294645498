//! YAML frontmatter parsing for markdown notes.
//!
//! Frontmatter is optional metadata at the start of a note, delimited by
//! `---`:
//!
//! ```markdown
//! ---
//! title: My Note
//! tags: [work, project]
//! status: draft
//! ---
//!
//! # Content starts here
//! ```
//!
//! Unlike a typed frontmatter struct, this keeps every key: arbitrary
//! properties are flattened to `key:value` lines so they can be matched by
//! property filters.

use std::collections::BTreeMap;

/// Parsed frontmatter: every top-level key of the YAML mapping.
#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    /// Top-level keys in deterministic order.
    map: BTreeMap<String, serde_yaml::Value>,
}

/// Frontmatter keys that are indexed on their own and excluded from the
/// flattened property blob.
const STRUCTURAL_KEYS: &[&str] = &["title", "tags"];

impl Frontmatter {
    /// Returns the `title` value, if it is a string.
    pub fn title(&self) -> Option<&str> {
        self.map.get("title").and_then(|v| v.as_str())
    }

    /// Returns the tags declared in frontmatter.
    ///
    /// Accepts both a YAML sequence (`tags: [a, b]`) and a comma-separated
    /// string (`tags: a, b`). A leading `#` on any tag is stripped.
    pub fn tags(&self) -> Vec<String> {
        let Some(value) = self.map.get("tags") else {
            return Vec::new();
        };

        let raw: Vec<String> = if let Some(seq) = value.as_sequence() {
            seq.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        } else if let Some(s) = value.as_str() {
            s.split(',').map(|t| t.trim().to_string()).collect()
        } else {
            Vec::new()
        };

        raw.into_iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.trim_start_matches('#').to_string())
            .collect()
    }

    /// Flattens all non-structural keys to newline-joined `key:value` lines.
    ///
    /// Sequences are rendered comma-separated; non-scalar values other than
    /// sequences are skipped.
    pub fn flatten(&self) -> String {
        let mut lines = Vec::new();
        for (key, value) in &self.map {
            if STRUCTURAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(rendered) = render_value(value) {
                lines.push(format!("{key}:{rendered}"));
            }
        }
        lines.join("\n")
    }

    /// Returns true if no keys were parsed.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Renders a YAML value to its flattened string form.
fn render_value(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Sequence(seq) => {
            let items: Vec<String> = seq.iter().filter_map(render_value).collect();
            Some(items.join(","))
        }
        _ => None,
    }
}

/// Splits and parses YAML frontmatter from note content.
///
/// Returns the parsed frontmatter and the remaining body. When no
/// frontmatter is present, the delimiter never closes, or the YAML is
/// malformed, returns an empty frontmatter and the original content -
/// extraction never fails on bad metadata.
pub fn parse_frontmatter(content: &str) -> (Frontmatter, &str) {
    let content = content.trim_start_matches('\u{feff}');
    if !content.starts_with("---") {
        return (Frontmatter::default(), content);
    }

    let after_opening = &content[3..];
    let after_opening = after_opening
        .strip_prefix("\r\n")
        .or_else(|| after_opening.strip_prefix('\n'))
        .unwrap_or(after_opening);

    let Some(closing_pos) = find_closing_delimiter(after_opening) else {
        return (Frontmatter::default(), content);
    };

    let yaml_content = &after_opening[..closing_pos];
    let remaining = &after_opening[closing_pos..];
    let remaining = remaining.strip_prefix("---").unwrap_or(remaining);
    let remaining = remaining
        .strip_prefix("\r\n")
        .or_else(|| remaining.strip_prefix('\n'))
        .unwrap_or(remaining);

    match serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(yaml_content) {
        Ok(map) => (Frontmatter { map }, remaining),
        Err(_) => (Frontmatter::default(), content),
    }
}

/// Finds the position of the closing `---` delimiter at the start of a line.
fn find_closing_delimiter(content: &str) -> Option<usize> {
    let mut pos = 0;
    for line in content.lines() {
        if line == "---" {
            return Some(pos);
        }
        pos += line.len() + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_frontmatter() {
        let content = "---\ntitle: Planning\ntags: [work, project]\nstatus: draft\n---\n\nBody";

        let (fm, body) = parse_frontmatter(content);
        assert_eq!(fm.title(), Some("Planning"));
        assert_eq!(fm.tags(), vec!["work", "project"]);
        assert!(body.trim_start().starts_with("Body"));
    }

    #[test]
    fn no_frontmatter_returns_original() {
        let content = "# Heading\n\nText";
        let (fm, body) = parse_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn malformed_yaml_returns_original() {
        let content = "---\ntitle: [unclosed\n---\n\nBody";
        let (fm, body) = parse_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn missing_closing_delimiter_returns_original() {
        let content = "---\ntitle: Never closed\n\nBody";
        let (fm, body) = parse_frontmatter(content);
        assert!(fm.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn tags_as_comma_string() {
        let content = "---\ntags: work, project\n---\nBody";
        let (fm, _) = parse_frontmatter(content);
        assert_eq!(fm.tags(), vec!["work", "project"]);
    }

    #[test]
    fn tags_strip_leading_hash() {
        let content = "---\ntags: [\"#work\", project]\n---\nBody";
        let (fm, _) = parse_frontmatter(content);
        assert_eq!(fm.tags(), vec!["work", "project"]);
    }

    #[test]
    fn flatten_skips_structural_keys() {
        let content =
            "---\ntitle: Doc\ntags: [a]\nstatus: draft\npriority: 2\nreviewed: true\n---\nBody";
        let (fm, _) = parse_frontmatter(content);

        let flat = fm.flatten();
        assert!(flat.contains("status:draft"));
        assert!(flat.contains("priority:2"));
        assert!(flat.contains("reviewed:true"));
        assert!(!flat.contains("title:"));
        assert!(!flat.contains("tags:"));
    }

    #[test]
    fn flatten_renders_sequences_comma_separated() {
        let content = "---\naliases: [plan, roadmap]\n---\nBody";
        let (fm, _) = parse_frontmatter(content);
        assert_eq!(fm.flatten(), "aliases:plan,roadmap");
    }

    #[test]
    fn bom_is_stripped() {
        let content = "\u{feff}---\ntitle: With BOM\n---\nBody";
        let (fm, _) = parse_frontmatter(content);
        assert_eq!(fm.title(), Some("With BOM"));
    }

    #[test]
    fn windows_line_endings() {
        let content = "---\r\ntitle: Windows\r\n---\r\nBody";
        let (fm, body) = parse_frontmatter(content);
        assert_eq!(fm.title(), Some("Windows"));
        assert!(body.contains("Body"));
    }
}
