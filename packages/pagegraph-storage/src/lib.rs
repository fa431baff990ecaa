//! Pagegraph storage adapters
//!
//! Infrastructure implementations of the pagegraph-core ports:
//!
//! - [`MemoryPageStore`]: lock-guarded in-memory page store, the test
//!   workhorse and the backend for throwaway wikis
//! - [`FsPageStore`]: one frontmatter-framed markdown file per page,
//!   atomic at page granularity (write-then-rename)
//! - [`MemoryFrontmatterIndex`]: dotted-path index over flattened
//!   frontmatter, rebuilt by the indexing job
//! - [`TantivyFullText`]: tantivy-backed full-text index with snippet
//!   fragments and highlights
//! - [`Reindexer`]: the indexing lifecycle that keeps both indexes
//!   current; the core only ever reads them
//!
//! The domain layer (the port traits) lives in pagegraph-core; this
//! crate is adapters only.

pub mod error;
pub mod infrastructure;

pub use error::{Result, StorageError};
pub use infrastructure::fm_index::MemoryFrontmatterIndex;
pub use infrastructure::fs::FsPageStore;
pub use infrastructure::memory::MemoryPageStore;
pub use infrastructure::reindex::Reindexer;
pub use infrastructure::tantivy_index::TantivyFullText;
