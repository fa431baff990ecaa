//! Reindexing
//!
//! The indexing lifecycle the core only observes: walk pages, rebuild
//! the frontmatter index from stored frontmatter, and rebuild the
//! full-text index from page bodies. Bodies are template-expanded
//! under the `indexing` source tag when an executor is wired, so
//! searchable text matches what readers see; an expansion failure
//! falls back to the raw body rather than skipping the page.

use std::sync::Arc;
use tracing::{debug, warn};

use pagegraph_core::frontmatter::value::Value;
use pagegraph_core::ident::{title_case, PageIdentifier};
use pagegraph_core::ports::{ExpansionSource, PageReaderMutator, StoreError, TemplateExecutor};

use crate::error::Result;
use crate::infrastructure::fm_index::MemoryFrontmatterIndex;
use crate::infrastructure::tantivy_index::TantivyFullText;

pub struct Reindexer {
    store: Arc<dyn PageReaderMutator>,
    fm_index: Arc<MemoryFrontmatterIndex>,
    full_text: Arc<TantivyFullText>,
    executor: Option<Arc<dyn TemplateExecutor>>,
}

impl Reindexer {
    pub fn new(
        store: Arc<dyn PageReaderMutator>,
        fm_index: Arc<MemoryFrontmatterIndex>,
        full_text: Arc<TantivyFullText>,
        executor: Option<Arc<dyn TemplateExecutor>>,
    ) -> Self {
        Self {
            store,
            fm_index,
            full_text,
            executor,
        }
    }

    /// Rebuild both indexes over the given pages.
    pub async fn reindex(&self, pages: Vec<PageIdentifier>) -> Result<()> {
        let mut fm_pages = Vec::with_capacity(pages.len());
        let mut ft_pages = Vec::with_capacity(pages.len());

        for id in pages {
            let Some((frontmatter, title, body)) = self.load(&id).await else {
                continue;
            };
            fm_pages.push((id.clone(), frontmatter));
            ft_pages.push((id, title, body));
        }

        let count = fm_pages.len();
        self.fm_index.rebuild(fm_pages);
        self.full_text.rebuild(ft_pages)?;
        debug!(pages = count, "reindex complete");
        Ok(())
    }

    /// Refresh both indexes for one page after a single-page mutation;
    /// a page that no longer exists is dropped from both.
    pub async fn reindex_page(&self, id: &PageIdentifier) -> Result<()> {
        match self.load(id).await {
            Some((frontmatter, title, body)) => {
                self.fm_index.index_page(id, &frontmatter);
                self.full_text.index_page(id, &title, &body)?;
            }
            None => {
                self.fm_index.remove_page(id);
                self.full_text.remove_page(id)?;
            }
        }
        Ok(())
    }

    async fn load(&self, id: &PageIdentifier) -> Option<(Value, String, String)> {
        let frontmatter = match self.store.read_frontmatter(id).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => return None,
            Err(e) => {
                warn!(page = %id, error = %e, "skipping unreadable page");
                return None;
            }
        };
        let markdown = match self.store.read_markdown(id).await {
            Ok(md) => md,
            Err(_) => String::new(),
        };
        let body = match &self.executor {
            Some(executor) => {
                match executor
                    .execute(id, &markdown, ExpansionSource::Indexing)
                    .await
                {
                    Ok(expanded) => expanded,
                    Err(e) => {
                        warn!(page = %id, error = %e,
                              "indexing raw body; template expansion failed");
                        markdown
                    }
                }
            }
            None => markdown,
        };
        let title = frontmatter
            .get_dotted("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| title_case(id.as_str()));
        Some((frontmatter, title, body))
    }
}
