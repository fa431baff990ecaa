//! In-memory frontmatter index
//!
//! Flattens each page's frontmatter into dotted-path/value pairs and
//! answers exact-match, key-existence, and prefix queries over them.
//! Sequence elements index individually under the sequence's dotted
//! key, so exact-match over `inventory.items` works element-wise;
//! `get_value` joins them with `\n`. Kept current by the reindex job,
//! read-only for everything else.

use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use pagegraph_core::frontmatter::value::Value;
use pagegraph_core::ident::{normalize, PageIdentifier};
use pagegraph_core::ports::FrontmatterIndexQueryer;

type FlatPage = BTreeMap<String, Vec<String>>;

#[derive(Default)]
pub struct MemoryFrontmatterIndex {
    pages: DashMap<String, FlatPage>,
}

impl MemoryFrontmatterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)index one page's frontmatter.
    pub fn index_page(&self, page: &PageIdentifier, frontmatter: &Value) {
        let mut flat = FlatPage::new();
        flatten(None, frontmatter, &mut flat);
        self.pages.insert(page.as_str().to_string(), flat);
    }

    pub fn remove_page(&self, page: &PageIdentifier) {
        self.pages.remove(page.as_str());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Drop everything and index the given pages, flattening in
    /// parallel.
    pub fn rebuild(&self, pages: Vec<(PageIdentifier, Value)>) {
        self.pages.clear();
        let count = pages.len();
        pages.into_par_iter().for_each(|(id, fm)| {
            self.index_page(&id, &fm);
        });
        debug!(pages = count, "rebuilt frontmatter index");
    }
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut FlatPage) {
    match value {
        Value::Mapping(m) => {
            for (k, v) in m {
                let key = match prefix {
                    Some(p) => format!("{}.{}", p, k),
                    None => k.clone(),
                };
                flatten(Some(&key), v, out);
            }
        }
        Value::Sequence(items) => {
            if let Some(key) = prefix {
                let entry = out.entry(key.to_string()).or_default();
                for item in items {
                    if let Some(s) = item.scalar_string() {
                        entry.push(s);
                    }
                }
            }
        }
        scalar => {
            if let (Some(key), Some(s)) = (prefix, scalar.scalar_string()) {
                out.entry(key.to_string()).or_default().push(s);
            }
        }
    }
}

impl FrontmatterIndexQueryer for MemoryFrontmatterIndex {
    fn query_exact_match(&self, dotted_key: &str, value: &str) -> Vec<PageIdentifier> {
        let mut hits: Vec<PageIdentifier> = self
            .pages
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .get(dotted_key)
                    .map(|vals| vals.iter().any(|v| v == value))
                    .unwrap_or(false)
            })
            .map(|entry| normalize(entry.key()))
            .collect();
        hits.sort();
        hits
    }

    fn query_key_existence(&self, dotted_key: &str) -> Vec<PageIdentifier> {
        let mut hits: Vec<PageIdentifier> = self
            .pages
            .iter()
            .filter(|entry| entry.value().contains_key(dotted_key))
            .map(|entry| normalize(entry.key()))
            .collect();
        hits.sort();
        hits
    }

    fn query_prefix_match(&self, dotted_key: &str, prefix: &str) -> Vec<PageIdentifier> {
        let mut hits: Vec<PageIdentifier> = self
            .pages
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .get(dotted_key)
                    .map(|vals| vals.iter().any(|v| v.starts_with(prefix)))
                    .unwrap_or(false)
            })
            .map(|entry| normalize(entry.key()))
            .collect();
        hits.sort();
        hits
    }

    fn get_value(&self, page: &PageIdentifier, dotted_key: &str) -> Option<String> {
        self.pages
            .get(page.as_str())
            .and_then(|flat| flat.get(dotted_key).map(|vals| vals.join("\n")))
    }
}
