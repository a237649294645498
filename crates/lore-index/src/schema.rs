//! Index schema definition for the lore search index.
//!
//! Defines the Tantivy schema with all fields needed for note indexing:
//! - `doc_id`: Internal document id (u64, indexed, fast) - deletion handle
//! - `path`: Vault-relative path (string, stored)
//! - `title`: Note title (text, stored, boosted 3.0x)
//! - `body`: Cleaned body text (text, stored)
//! - `headings`: Heading texts (text, stored, multi-valued, boosted 1.5x)
//! - `tags`: Note tags (string, stored, multi-valued - exact term filter)
//! - `folder`: Parent folder (string, stored)
//! - `created` / `modified`: Timestamps in epoch millis (i64, indexed, fast)
//! - `properties`: Flattened frontmatter (stored only - post-filter data)

use tantivy::schema::{FAST, Field, INDEXED, STORED, STRING, Schema, TEXT};

/// Field boost weights for search ranking.
pub mod boost {
    /// Title field boost (3.0x).
    pub const TITLE: f32 = 3.0;
    /// Headings field boost (1.5x).
    pub const HEADINGS: f32 = 1.5;
    /// Body field boost (1.0x).
    pub const BODY: f32 = 1.0;
}

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct NoteSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Internal document id, the deletion handle for upserts.
    pub doc_id: Field,
    /// Vault-relative path.
    pub path: Field,
    /// Note title.
    pub title: Field,
    /// Cleaned body text.
    pub body: Field,
    /// Heading texts (one value per heading).
    pub headings: Field,
    /// Tags (one value per tag, matched exactly).
    pub tags: Field,
    /// Parent folder.
    pub folder: Field,
    /// Creation time, epoch millis.
    pub created: Field,
    /// Modification time, epoch millis.
    pub modified: Field,
    /// Flattened frontmatter blob.
    pub properties: Field,
}

impl NoteSchema {
    /// Creates the note schema with all fields configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        let doc_id = builder.add_u64_field("doc_id", INDEXED | FAST | STORED);
        let path = builder.add_text_field("path", STRING | STORED);
        let title = builder.add_text_field("title", TEXT | STORED);
        let body = builder.add_text_field("body", TEXT | STORED);
        let headings = builder.add_text_field("headings", TEXT | STORED);
        let tags = builder.add_text_field("tags", STRING | STORED);
        let folder = builder.add_text_field("folder", STRING | STORED);
        let created = builder.add_i64_field("created", INDEXED | FAST | STORED);
        let modified = builder.add_i64_field("modified", INDEXED | FAST | STORED);
        let properties = builder.add_text_field("properties", STORED);

        let schema = builder.build();

        Self {
            schema,
            doc_id,
            path,
            title,
            body,
            headings,
            tags,
            folder,
            created,
            modified,
            properties,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The text fields searched for free-text terms, with their boosts.
    pub fn searchable_fields(&self) -> [(Field, f32); 3] {
        [
            (self.title, boost::TITLE),
            (self.headings, boost::HEADINGS),
            (self.body, boost::BODY),
        ]
    }
}

impl Default for NoteSchema {
    fn default() -> Self {
        Self::new()
    }
}
