//! Note extraction.
//!
//! Converts a raw markdown file into a [`NoteDocument`]: the flat,
//! index-ready representation of a note (title, cleaned body, tags,
//! headings, folder, flattened frontmatter, timestamps).

use std::{
    fs,
    path::{Component, Path},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{
    DocumentError,
    frontmatter::parse_frontmatter,
    markdown::{extract_headings, extract_inline_tags, strip_markdown},
};

/// The flat, index-ready representation of a note.
///
/// The `path` is the note's stable identity: it only changes on rename.
/// Every re-extraction of the same path supersedes the previous document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDocument {
    /// Vault-relative path with `/` separators. Unique identifier.
    pub path: String,
    /// Note title: frontmatter `title`, else the file stem.
    pub title: String,
    /// Markdown-stripped body text.
    pub body: String,
    /// Tags from frontmatter and inline `#tag` occurrences, deduplicated.
    pub tags: Vec<String>,
    /// Parent folder of the note (`""` for the vault root).
    pub folder: String,
    /// Heading texts in document order.
    pub headings: Vec<String>,
    /// Creation time, epoch milliseconds.
    pub created_ms: i64,
    /// Modification time, epoch milliseconds.
    pub modified_ms: i64,
    /// Flattened frontmatter: newline-joined `key:value` lines, structural
    /// keys excluded.
    pub properties: String,
}

/// Extracts a note from disk.
///
/// `rel_path` is the vault-relative path; timestamps come from file
/// metadata. On platforms without a file birth time, creation falls back to
/// the modification time.
pub fn extract(vault_root: &Path, rel_path: &Path) -> Result<NoteDocument, DocumentError> {
    let abs_path = vault_root.join(rel_path);

    let content = fs::read_to_string(&abs_path).map_err(|source| DocumentError::ReadFile {
        path: abs_path.clone(),
        source,
    })?;

    let metadata = fs::metadata(&abs_path).map_err(|source| DocumentError::Metadata {
        path: abs_path.clone(),
        source,
    })?;

    let modified_ms = metadata.modified().map_or(0, system_time_to_ms);
    let created_ms = metadata.created().map_or(modified_ms, system_time_to_ms);

    Ok(extract_from_parts(rel_path, &content, created_ms, modified_ms))
}

/// Builds a [`NoteDocument`] from already-read content and timestamps.
///
/// This is the pure core of [`extract`]; it never fails.
pub fn extract_from_parts(
    rel_path: &Path,
    content: &str,
    created_ms: i64,
    modified_ms: i64,
) -> NoteDocument {
    let (frontmatter, body_md) = parse_frontmatter(content);

    let title = frontmatter
        .title()
        .map(String::from)
        .unwrap_or_else(|| file_stem(rel_path));

    let mut tags = frontmatter.tags();
    for tag in extract_inline_tags(body_md) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    NoteDocument {
        path: rel_path_string(rel_path),
        title,
        body: strip_markdown(body_md),
        tags,
        folder: folder_string(rel_path),
        headings: extract_headings(body_md),
        created_ms,
        modified_ms,
        properties: frontmatter.flatten(),
    }
}

/// Converts a `SystemTime` to epoch milliseconds.
fn system_time_to_ms(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Renders a relative path with `/` separators regardless of platform.
///
/// This is the canonical form of a note's identity as used by the index.
pub fn rel_path_string(rel_path: &Path) -> String {
    let parts: Vec<String> = rel_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Returns the `/`-separated parent folder of a relative path.
fn folder_string(rel_path: &Path) -> String {
    rel_path.parent().map(rel_path_string).unwrap_or_default()
}

/// Returns the file stem of a path, or "Untitled" when there is none.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const NOTE: &str = "---\ntitle: Quarterly Plan\ntags: [work, planning]\nstatus: draft\n---\n\n# Goals\n\nShip the *search* feature. #priority\n\n## Timeline\n\nQ1 and Q2.\n";

    #[test]
    fn extracts_all_fields() {
        let doc = extract_from_parts(Path::new("work/plan.md"), NOTE, 1_000, 2_000);

        assert_eq!(doc.path, "work/plan.md");
        assert_eq!(doc.title, "Quarterly Plan");
        assert_eq!(doc.folder, "work");
        assert_eq!(doc.tags, vec!["work", "planning", "priority"]);
        assert_eq!(doc.headings, vec!["Goals", "Timeline"]);
        assert!(doc.body.contains("Ship the search feature."));
        assert_eq!(doc.properties, "status:draft");
        assert_eq!(doc.created_ms, 1_000);
        assert_eq!(doc.modified_ms, 2_000);
    }

    #[test]
    fn title_falls_back_to_file_stem() {
        let doc = extract_from_parts(Path::new("inbox/scratch.md"), "no frontmatter", 0, 0);
        assert_eq!(doc.title, "scratch");
    }

    #[test]
    fn root_note_has_empty_folder() {
        let doc = extract_from_parts(Path::new("note.md"), "text", 0, 0);
        assert_eq!(doc.folder, "");
        assert_eq!(doc.path, "note.md");
    }

    #[test]
    fn nested_folder_uses_forward_slashes() {
        let doc = extract_from_parts(Path::new("work/projects/alpha.md"), "text", 0, 0);
        assert_eq!(doc.folder, "work/projects");
    }

    #[test]
    fn inline_tags_are_deduplicated_against_frontmatter() {
        let content = "---\ntags: [project]\n---\nAbout #project and #extra.";
        let doc = extract_from_parts(Path::new("a.md"), content, 0, 0);
        assert_eq!(doc.tags, vec!["project", "extra"]);
    }

    #[test]
    fn extract_reads_from_disk() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("work")).unwrap();
        fs::write(temp.path().join("work/plan.md"), NOTE).unwrap();

        let doc = extract(temp.path(), Path::new("work/plan.md")).unwrap();
        assert_eq!(doc.title, "Quarterly Plan");
        assert!(doc.modified_ms > 0);
        assert!(doc.created_ms > 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(extract(temp.path(), Path::new("missing.md")).is_err());
    }
}
