//! Ports: injected collaborators
//!
//! The core owns no I/O. Persistence, full-text search, the
//! frontmatter index, and markdown rendering are all consumed through
//! these traits; adapters live in pagegraph-storage and are wired at
//! server construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::errors::Result;
use crate::frontmatter::value::Value;
use crate::ident::PageIdentifier;

/// Store failure model. "Does not exist" must stay distinguishable
/// from every other failure; merge semantics depend on it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page '{0}' does not exist")]
    NotExist(String),

    #[error("store failure: {0}")]
    Other(String),
}

impl StoreError {
    pub fn other<E: fmt::Display>(e: E) -> Self {
        StoreError::Other(e.to_string())
    }

    pub fn is_not_exist(&self) -> bool {
        matches!(self, StoreError::NotExist(_))
    }
}

/// Page persistence: frontmatter and markdown, keyed by normalized
/// identifier. Writes are last-writer-wins; atomicity at page
/// granularity is the adapter's contract.
#[async_trait]
pub trait PageReaderMutator: Send + Sync {
    async fn read_frontmatter(&self, page: &PageIdentifier)
        -> std::result::Result<Value, StoreError>;

    async fn write_frontmatter(
        &self,
        page: &PageIdentifier,
        frontmatter: &Value,
    ) -> std::result::Result<(), StoreError>;

    async fn read_markdown(&self, page: &PageIdentifier)
        -> std::result::Result<String, StoreError>;

    async fn write_markdown(
        &self,
        page: &PageIdentifier,
        markdown: &str,
    ) -> std::result::Result<(), StoreError>;

    async fn delete_page(&self, page: &PageIdentifier) -> std::result::Result<(), StoreError>;
}

/// One full-text search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub identifier: PageIdentifier,
    pub title: String,
    pub fragment: String,
    pub highlights: Vec<String>,
}

/// Full-text index, consulted but not owned by the core.
#[async_trait]
pub trait FullTextQueryer: Send + Sync {
    async fn query(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// Frontmatter index over dotted paths. In-process and synchronous;
/// implementations may take shared locks. Read-only from the core's
/// perspective; an external indexing job keeps it current.
///
/// `get_value` renders scalars via their display form; sequence
/// elements are joined with `\n` so non-emptiness checks and tolerant
/// item listings both work over the same call.
pub trait FrontmatterIndexQueryer: Send + Sync {
    fn query_exact_match(&self, dotted_key: &str, value: &str) -> Vec<PageIdentifier>;

    fn query_key_existence(&self, dotted_key: &str) -> Vec<PageIdentifier>;

    fn query_prefix_match(&self, dotted_key: &str, prefix: &str) -> Vec<PageIdentifier>;

    fn get_value(&self, page: &PageIdentifier, dotted_key: &str) -> Option<String>;
}

/// Markdown-to-HTML rendering, consumed as a black box.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// Call-site tag threaded into expansion so timeout diagnostics are
/// actionable. Does not affect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionSource {
    Server,
    Indexing,
    Labels,
}

impl ExpansionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpansionSource::Server => "server",
            ExpansionSource::Indexing => "indexing",
            ExpansionSource::Labels => "labels",
        }
    }
}

impl fmt::Display for ExpansionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template expansion over a page's text. Implemented by the template
/// engine; injected into the renderer so a server without templating
/// still serves raw pages.
#[async_trait]
pub trait TemplateExecutor: Send + Sync {
    async fn execute(
        &self,
        page: &PageIdentifier,
        text: &str,
        source: ExpansionSource,
    ) -> Result<String>;
}
