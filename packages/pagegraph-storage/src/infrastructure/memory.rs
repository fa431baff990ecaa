//! In-memory page store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use pagegraph_core::frontmatter::value::Value;
use pagegraph_core::ident::PageIdentifier;
use pagegraph_core::ports::{PageReaderMutator, StoreError};

#[derive(Default, Clone)]
struct PageRecord {
    frontmatter: Option<Value>,
    markdown: Option<String>,
}

impl PageRecord {
    fn is_empty(&self) -> bool {
        self.frontmatter.is_none() && self.markdown.is_none()
    }
}

/// Page store held entirely in memory. Writes are atomic at page
/// granularity by construction; every record swap happens under the
/// write lock.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: RwLock<HashMap<String, PageRecord>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of every stored page, sorted; the indexing job
    /// walks this.
    pub fn page_identifiers(&self) -> Vec<PageIdentifier> {
        let mut ids: Vec<PageIdentifier> = self
            .pages
            .read()
            .keys()
            .map(|k| pagegraph_core::ident::normalize(k))
            .collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl PageReaderMutator for MemoryPageStore {
    async fn read_frontmatter(
        &self,
        page: &PageIdentifier,
    ) -> std::result::Result<Value, StoreError> {
        let pages = self.pages.read();
        let record = pages
            .get(page.as_str())
            .ok_or_else(|| StoreError::NotExist(page.as_str().to_string()))?;
        Ok(record
            .frontmatter
            .clone()
            .unwrap_or_else(Value::empty_mapping))
    }

    async fn write_frontmatter(
        &self,
        page: &PageIdentifier,
        frontmatter: &Value,
    ) -> std::result::Result<(), StoreError> {
        self.pages
            .write()
            .entry(page.as_str().to_string())
            .or_default()
            .frontmatter = Some(frontmatter.clone());
        Ok(())
    }

    async fn read_markdown(
        &self,
        page: &PageIdentifier,
    ) -> std::result::Result<String, StoreError> {
        let pages = self.pages.read();
        let record = pages
            .get(page.as_str())
            .ok_or_else(|| StoreError::NotExist(page.as_str().to_string()))?;
        Ok(record.markdown.clone().unwrap_or_default())
    }

    async fn write_markdown(
        &self,
        page: &PageIdentifier,
        markdown: &str,
    ) -> std::result::Result<(), StoreError> {
        self.pages
            .write()
            .entry(page.as_str().to_string())
            .or_default()
            .markdown = Some(markdown.to_string());
        Ok(())
    }

    async fn delete_page(&self, page: &PageIdentifier) -> std::result::Result<(), StoreError> {
        let mut pages = self.pages.write();
        let removed = pages.remove(page.as_str());
        if removed.map(|r| r.is_empty()).unwrap_or(true) {
            return Err(StoreError::NotExist(page.as_str().to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegraph_core::ident::normalize;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn missing_page_is_distinguishable() {
        let store = MemoryPageStore::new();
        let err = store.read_frontmatter(&normalize("ghost")).await.unwrap_err();
        assert!(err.is_not_exist());
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let store = MemoryPageStore::new();
        let page = normalize("p");
        let fm: Value = [("title".to_string(), Value::from("P"))].into_iter().collect();
        store.write_frontmatter(&page, &fm).await.unwrap();
        store.write_markdown(&page, "# P\n").await.unwrap();

        assert_eq!(store.read_frontmatter(&page).await.unwrap(), fm);
        assert_eq!(store.read_markdown(&page).await.unwrap(), "# P\n");

        store.delete_page(&page).await.unwrap();
        assert!(store.read_markdown(&page).await.unwrap_err().is_not_exist());
    }
}
