//! The index engine wrapper.
//!
//! [`NoteIndex`] owns the Tantivy index, its writer, and the path→internal-id
//! table. The table exists because the engine deletes by term, not by path
//! history: every insert mints a fresh internal id, and the previous id for
//! the same path is the deletion handle for the remove-before-reinsert
//! upsert. Invariant: at most one live internal id per path.
//!
//! All index mutation funnels through this type so the id table can never
//! drift from the engine's contents.

use std::{
    collections::HashMap,
    fs,
    path::Path,
};

use lore_document::NoteDocument;
use tantivy::{
    Index, IndexWriter, TantivyDocument, Term,
    collector::TopDocs,
    directory::MmapDirectory,
    query::{AllQuery, BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery},
    schema::{Field, IndexRecordOption, Value},
};

use crate::{IndexError, filters::NativeFilter, schema::NoteSchema};

/// Heap size for the index writer (50 MB).
const WRITER_HEAP_SIZE: usize = 50_000_000;

/// A note returned by the engine with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredNote {
    /// Engine-native relevance score.
    pub score: f32,
    /// The stored note fields.
    pub note: NoteDocument,
}

/// The mutable search index over a vault.
pub struct NoteIndex {
    /// The Tantivy index.
    index: Index,
    /// The underlying Tantivy writer.
    writer: IndexWriter,
    /// Schema with field handles.
    schema: NoteSchema,
    /// Path → live internal id.
    id_map: HashMap<String, u64>,
    /// Next internal id to mint.
    next_id: u64,
}

impl NoteIndex {
    /// Opens or creates an index at the given directory.
    ///
    /// The identity table starts empty; restore it from a snapshot with
    /// [`restore_identity`](Self::restore_identity) when loading.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let schema = NoteSchema::new();

        fs::create_dir_all(path)?;

        let dir = MmapDirectory::open(path).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(path.to_path_buf(), &err)
        })?;

        let index = Index::open_or_create(dir, schema.schema().clone())
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        Self::with_index(index, schema, path)
    }

    /// Creates a fresh in-memory index.
    ///
    /// Used for tests and for platforms where persistence is disabled.
    pub fn in_memory() -> Result<Self, IndexError> {
        let schema = NoteSchema::new();
        let index = Index::create_in_ram(schema.schema().clone());
        Self::with_index(index, schema, Path::new("<ram>"))
    }

    /// Finishes construction by attaching a writer.
    fn with_index(index: Index, schema: NoteSchema, path: &Path) -> Result<Self, IndexError> {
        let writer = index
            .writer(WRITER_HEAP_SIZE)
            .map_err(|e| IndexError::open_index(path.to_path_buf(), &e))?;

        Ok(Self {
            index,
            writer,
            schema,
            id_map: HashMap::new(),
            next_id: 1,
        })
    }

    /// Restores the identity table from a persisted snapshot.
    pub fn restore_identity(&mut self, id_map: HashMap<String, u64>, next_id: u64) {
        self.id_map = id_map;
        self.next_id = next_id;
    }

    /// Returns the identity table and the next id, for snapshot persistence.
    pub fn identity(&self) -> (&HashMap<String, u64>, u64) {
        (&self.id_map, self.next_id)
    }

    /// Returns the live internal id for a path, if the path is indexed.
    pub fn internal_id(&self, path: &str) -> Option<u64> {
        self.id_map.get(path).copied()
    }

    /// Inserts or replaces a single note and commits.
    pub fn upsert(&mut self, doc: &NoteDocument) -> Result<u64, IndexError> {
        let id = self.stage(doc)?;
        self.commit()?;
        Ok(id)
    }

    /// Inserts or replaces a batch of notes under a single commit.
    pub fn upsert_batch(&mut self, docs: &[NoteDocument]) -> Result<(), IndexError> {
        for doc in docs {
            self.stage(doc)?;
        }
        self.commit()
    }

    /// Stages an upsert without committing: removes the previous document
    /// for the path (when one exists), mints a new id, inserts.
    ///
    /// Used by streaming rebuilds; pair with [`commit`](Self::commit).
    pub fn stage(&mut self, doc: &NoteDocument) -> Result<u64, IndexError> {
        if let Some(&old_id) = self.id_map.get(&doc.path) {
            self.writer
                .delete_term(Term::from_field_u64(self.schema.doc_id, old_id));
        }

        let id = self.next_id;
        self.next_id += 1;

        self.writer
            .add_document(self.build_document(id, doc))
            .map_err(|e| IndexError::write(&e))?;
        self.id_map.insert(doc.path.clone(), id);

        Ok(id)
    }

    /// Removes a note by path and commits.
    ///
    /// Removing a path that is not indexed is treated as already removed.
    pub fn remove(&mut self, path: &str) -> Result<(), IndexError> {
        let Some(id) = self.id_map.remove(path) else {
            return Ok(());
        };

        self.writer
            .delete_term(Term::from_field_u64(self.schema.doc_id, id));
        self.commit()
    }

    /// Deletes everything: engine contents and the identity table.
    pub fn clear(&mut self) -> Result<(), IndexError> {
        self.writer
            .delete_all_documents()
            .map_err(|e| IndexError::write(&e))?;
        self.id_map.clear();
        self.next_id = 1;
        self.commit()
    }

    /// Commits all pending changes, making them visible to readers.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }

    /// Returns the number of committed documents.
    pub fn doc_count(&self) -> Result<u64, IndexError> {
        let reader = self.index.reader().map_err(|e| IndexError::search(&e))?;
        Ok(reader.searcher().num_docs())
    }

    /// Executes an engine-native search.
    ///
    /// `term` is tokenized on whitespace; terms are OR-combined (scored
    /// across title, headings, and body with field boosts) inside a single
    /// required clause. `filters` become additional required clauses. An
    /// empty term with filters matches every document the filters allow;
    /// an entirely empty query matches everything.
    ///
    /// `fuzzy_distance` applies Levenshtein tolerance to every term
    /// (0 = exact).
    pub fn search_native(
        &self,
        term: &str,
        filters: &[NativeFilter],
        fuzzy_distance: u8,
        limit: usize,
    ) -> Result<Vec<ScoredNote>, IndexError> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if let Some(text_query) = self.build_text_query(term, fuzzy_distance) {
            clauses.push((Occur::Must, text_query));
        }

        for filter in filters {
            clauses.push((Occur::Must, filter.to_query(&self.schema)));
        }

        let query: Box<dyn Query> = if clauses.is_empty() {
            Box::new(AllQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        };

        let reader = self.index.reader().map_err(|e| IndexError::search(&e))?;
        let searcher = reader.searcher();

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.max(1)))
            .map_err(|e| IndexError::search(&e))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| IndexError::search(&e))?;
            results.push(ScoredNote {
                score,
                note: self.doc_to_note(&doc),
            });
        }

        Ok(results)
    }

    /// Builds the free-text clause: each whitespace term scored across the
    /// searchable fields, terms OR-combined.
    fn build_text_query(&self, term: &str, fuzzy_distance: u8) -> Option<Box<dyn Query>> {
        let words: Vec<String> = term
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            return None;
        }

        let word_clauses: Vec<(Occur, Box<dyn Query>)> = words
            .iter()
            .map(|word| {
                let field_clauses: Vec<(Occur, Box<dyn Query>)> = self
                    .schema
                    .searchable_fields()
                    .into_iter()
                    .map(|(field, boost)| {
                        let term = Term::from_field_text(field, word);
                        let query: Box<dyn Query> = if fuzzy_distance > 0 {
                            Box::new(FuzzyTermQuery::new(term, fuzzy_distance, true))
                        } else {
                            Box::new(TermQuery::new(term, IndexRecordOption::Basic))
                        };
                        let boosted: Box<dyn Query> = Box::new(BoostQuery::new(query, boost));
                        (Occur::Should, boosted)
                    })
                    .collect();
                (
                    Occur::Should,
                    Box::new(BooleanQuery::new(field_clauses)) as Box<dyn Query>,
                )
            })
            .collect();

        Some(Box::new(BooleanQuery::new(word_clauses)))
    }

    /// Converts a note into an engine document.
    fn build_document(&self, id: u64, doc: &NoteDocument) -> TantivyDocument {
        let mut tantivy_doc = TantivyDocument::new();

        tantivy_doc.add_u64(self.schema.doc_id, id);
        tantivy_doc.add_text(self.schema.path, &doc.path);
        tantivy_doc.add_text(self.schema.title, &doc.title);
        tantivy_doc.add_text(self.schema.body, &doc.body);
        for heading in &doc.headings {
            tantivy_doc.add_text(self.schema.headings, heading);
        }
        for tag in &doc.tags {
            tantivy_doc.add_text(self.schema.tags, tag);
        }
        tantivy_doc.add_text(self.schema.folder, &doc.folder);
        tantivy_doc.add_i64(self.schema.created, doc.created_ms);
        tantivy_doc.add_i64(self.schema.modified, doc.modified_ms);
        tantivy_doc.add_text(self.schema.properties, &doc.properties);

        tantivy_doc
    }

    /// Reconstructs a note from its stored fields.
    fn doc_to_note(&self, doc: &TantivyDocument) -> NoteDocument {
        NoteDocument {
            path: self.get_text(doc, self.schema.path),
            title: self.get_text(doc, self.schema.title),
            body: self.get_text(doc, self.schema.body),
            tags: self.get_all_text(doc, self.schema.tags),
            folder: self.get_text(doc, self.schema.folder),
            headings: self.get_all_text(doc, self.schema.headings),
            created_ms: self.get_i64(doc, self.schema.created),
            modified_ms: self.get_i64(doc, self.schema.modified),
            properties: self.get_text(doc, self.schema.properties),
        }
    }

    /// Extracts a single stored text value.
    fn get_text(&self, doc: &TantivyDocument, field: Field) -> String {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }

    /// Extracts all stored text values of a multi-valued field.
    fn get_all_text(&self, doc: &TantivyDocument, field: Field) -> Vec<String> {
        doc.get_all(field)
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    }

    /// Extracts a stored i64 value.
    fn get_i64(&self, doc: &TantivyDocument, field: Field) -> i64 {
        doc.get_first(field).and_then(|v| v.as_i64()).unwrap_or(0)
    }
}
