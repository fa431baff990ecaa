//! Tantivy full-text index
//!
//! Backs the search surface's `Query(string)` interface: title and
//! body are tokenized, the identifier is the delete/update key, and
//! hits come back with a snippet fragment plus the highlighted terms
//! inside it.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value as _, STORED, STRING, TEXT};
use tantivy::snippet::SnippetGenerator;
use tantivy::{doc, Index, IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::debug;

use pagegraph_core::errors::{CoreError, Result as CoreResult};
use pagegraph_core::ident::{normalize, PageIdentifier};
use pagegraph_core::ports::{FullTextQueryer, SearchHit};

use crate::error::{Result, StorageError};

const WRITER_HEAP_BYTES: usize = 50_000_000;
const SEARCH_LIMIT: usize = 50;
const FRAGMENT_MAX_CHARS: usize = 150;

#[derive(Clone, Copy)]
struct Fields {
    identifier: Field,
    title: Field,
    body: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let identifier = builder.add_text_field("identifier", STRING | STORED);
    let title = builder.add_text_field("title", TEXT | STORED);
    let body = builder.add_text_field("body", TEXT | STORED);
    (
        builder.build(),
        Fields {
            identifier,
            title,
            body,
        },
    )
}

pub struct TantivyFullText {
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    fields: Fields,
}

impl TantivyFullText {
    /// RAM-backed index; throwaway wikis and tests.
    pub fn create_in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::finish(index, fields)
    }

    /// Directory-backed index, opened if it already exists.
    pub fn open_or_create(dir: &Path) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = if dir.exists() {
            Index::open_in_dir(dir).map_err(StorageError::index)?
        } else {
            std::fs::create_dir_all(dir)?;
            Index::create_in_dir(dir, schema).map_err(StorageError::index)?
        };
        Self::finish(index, fields)
    }

    fn finish(index: Index, fields: Fields) -> Result<Self> {
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(StorageError::index)?;
        let reader = index.reader().map_err(StorageError::index)?;
        Ok(Self {
            index,
            writer: Mutex::new(writer),
            reader,
            fields,
        })
    }

    /// (Re)index one page. The identifier is the update key.
    pub fn index_page(&self, page: &PageIdentifier, title: &str, body: &str) -> Result<()> {
        {
            let mut writer = self.writer.lock();
            writer.delete_term(Term::from_field_text(self.fields.identifier, page.as_str()));
            writer
                .add_document(doc!(
                    self.fields.identifier => page.as_str(),
                    self.fields.title => title,
                    self.fields.body => body,
                ))
                .map_err(StorageError::index)?;
            writer.commit().map_err(StorageError::index)?;
        }
        self.reader.reload().map_err(StorageError::index)?;
        Ok(())
    }

    pub fn remove_page(&self, page: &PageIdentifier) -> Result<()> {
        {
            let mut writer = self.writer.lock();
            writer.delete_term(Term::from_field_text(self.fields.identifier, page.as_str()));
            writer.commit().map_err(StorageError::index)?;
        }
        self.reader.reload().map_err(StorageError::index)?;
        Ok(())
    }

    /// Drop everything and index the given `(identifier, title, body)`
    /// triples in one commit.
    pub fn rebuild(&self, pages: Vec<(PageIdentifier, String, String)>) -> Result<()> {
        {
            let mut writer = self.writer.lock();
            writer.delete_all_documents().map_err(StorageError::index)?;
            let count = pages.len();
            for (id, title, body) in pages {
                writer
                    .add_document(doc!(
                        self.fields.identifier => id.as_str(),
                        self.fields.title => title,
                        self.fields.body => body,
                    ))
                    .map_err(StorageError::index)?;
            }
            writer.commit().map_err(StorageError::index)?;
            debug!(pages = count, "rebuilt full-text index");
        }
        self.reader.reload().map_err(StorageError::index)?;
        Ok(())
    }
}

#[async_trait]
impl FullTextQueryer for TantivyFullText {
    async fn query(&self, query: &str) -> CoreResult<Vec<SearchHit>> {
        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.fields.title, self.fields.body]);
        let parsed = parser
            .parse_query(query)
            .map_err(|e| CoreError::invalid_argument(format!("bad query: {}", e)))?;

        let top = searcher
            .search(&parsed, &TopDocs::with_limit(SEARCH_LIMIT))
            .map_err(|e| CoreError::Store(e.to_string()))?;

        let mut snippets = SnippetGenerator::create(&searcher, &*parsed, self.fields.body)
            .map_err(|e| CoreError::Store(e.to_string()))?;
        snippets.set_max_num_chars(FRAGMENT_MAX_CHARS);

        let mut hits = Vec::with_capacity(top.len());
        for (_score, address) in top {
            let document: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| CoreError::Store(e.to_string()))?;
            let identifier = document
                .get_first(self.fields.identifier)
                .and_then(|v| v.as_str())
                .map(normalize)
                .unwrap_or_default();
            if identifier.is_empty() {
                continue;
            }
            let title = document
                .get_first(self.fields.title)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let snippet = snippets.snippet_from_doc(&document);
            let fragment = snippet.fragment().to_string();
            let highlights = snippet
                .highlighted()
                .iter()
                .filter_map(|range| fragment.get(range.clone()))
                .map(str::to_string)
                .collect();

            hits.push(SearchHit {
                identifier,
                title,
                fragment,
                highlights,
            });
        }
        Ok(hits)
    }
}
