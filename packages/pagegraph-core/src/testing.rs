//! In-crate test doubles for the port traits.
//!
//! The real adapters live in pagegraph-storage; unit tests here only
//! need small in-memory stand-ins with observable write counts.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::frontmatter::value::Value;
use crate::ident::PageIdentifier;
use crate::ports::{FrontmatterIndexQueryer, PageReaderMutator, StoreError};

#[derive(Default)]
struct PageRecord {
    frontmatter: Option<Value>,
    markdown: Option<String>,
}

/// Minimal in-memory page store with a write counter.
#[derive(Default)]
pub struct MemStore {
    pages: Mutex<HashMap<String, PageRecord>>,
    writes: AtomicUsize,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn seed_frontmatter(&self, page: &PageIdentifier, fm: Value) {
        self.pages
            .lock()
            .unwrap()
            .entry(page.as_str().to_string())
            .or_default()
            .frontmatter = Some(fm);
    }

    pub fn seed_markdown(&self, page: &PageIdentifier, md: &str) {
        self.pages
            .lock()
            .unwrap()
            .entry(page.as_str().to_string())
            .or_default()
            .markdown = Some(md.to_string());
    }

    pub fn frontmatter(&self, page: &PageIdentifier) -> Option<Value> {
        self.pages
            .lock()
            .unwrap()
            .get(page.as_str())
            .and_then(|r| r.frontmatter.clone())
    }
}

#[async_trait]
impl PageReaderMutator for MemStore {
    async fn read_frontmatter(&self, page: &PageIdentifier) -> Result<Value, StoreError> {
        self.pages
            .lock()
            .unwrap()
            .get(page.as_str())
            .and_then(|r| r.frontmatter.clone())
            .ok_or_else(|| StoreError::NotExist(page.as_str().to_string()))
    }

    async fn write_frontmatter(&self, page: &PageIdentifier, fm: &Value) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .entry(page.as_str().to_string())
            .or_default()
            .frontmatter = Some(fm.clone());
        Ok(())
    }

    async fn read_markdown(&self, page: &PageIdentifier) -> Result<String, StoreError> {
        self.pages
            .lock()
            .unwrap()
            .get(page.as_str())
            .and_then(|r| r.markdown.clone())
            .ok_or_else(|| StoreError::NotExist(page.as_str().to_string()))
    }

    async fn write_markdown(&self, page: &PageIdentifier, md: &str) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .entry(page.as_str().to_string())
            .or_default()
            .markdown = Some(md.to_string());
        Ok(())
    }

    async fn delete_page(&self, page: &PageIdentifier) -> Result<(), StoreError> {
        self.pages
            .lock()
            .unwrap()
            .remove(page.as_str())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotExist(page.as_str().to_string()))
    }
}

/// Static frontmatter index stand-in: pages flattened to dotted keys.
#[derive(Default)]
pub struct MemIndex {
    // page -> dotted key -> values (sequences index per element)
    entries: Mutex<HashMap<String, BTreeMap<String, Vec<String>>>>,
}

impl MemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, page: &str, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .entry(page.to_string())
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }
}

impl FrontmatterIndexQueryer for MemIndex {
    fn query_exact_match(&self, key: &str, value: &str) -> Vec<PageIdentifier> {
        let entries = self.entries.lock().unwrap();
        let mut hits: Vec<PageIdentifier> = entries
            .iter()
            .filter(|(_, keys)| {
                keys.get(key)
                    .map(|vals| vals.iter().any(|v| v == value))
                    .unwrap_or(false)
            })
            .map(|(page, _)| crate::ident::normalize(page))
            .collect();
        hits.sort();
        hits
    }

    fn query_key_existence(&self, key: &str) -> Vec<PageIdentifier> {
        let entries = self.entries.lock().unwrap();
        let mut hits: Vec<PageIdentifier> = entries
            .iter()
            .filter(|(_, keys)| keys.contains_key(key))
            .map(|(page, _)| crate::ident::normalize(page))
            .collect();
        hits.sort();
        hits
    }

    fn query_prefix_match(&self, key: &str, prefix: &str) -> Vec<PageIdentifier> {
        let entries = self.entries.lock().unwrap();
        let mut hits: Vec<PageIdentifier> = entries
            .iter()
            .filter(|(_, keys)| {
                keys.get(key)
                    .map(|vals| vals.iter().any(|v| v.starts_with(prefix)))
                    .unwrap_or(false)
            })
            .map(|(page, _)| crate::ident::normalize(page))
            .collect();
        hits.sort();
        hits
    }

    fn get_value(&self, page: &PageIdentifier, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(page.as_str())
            .and_then(|keys| keys.get(key))
            .map(|vals| vals.join("\n"))
    }
}
