//! Search surface
//!
//! Forwards a query to the full-text index, then filters results
//! against the frontmatter index: include filters intersect
//! key-existence sets, exclude filters union them. Surviving results
//! can be decorated with frontmatter values and with the item's
//! ancestor chain so a hit can be shown in place ("fuse, in box, in
//! garage").

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::errors::{CoreError, Result};
use crate::ident::PageIdentifier;
use crate::ports::{FrontmatterIndexQueryer, FullTextQueryer, SearchHit};

/// Ancestor-chain cap; deeper hierarchies are truncated at the root
/// end.
const ANCESTOR_CAP: usize = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub include_filters: Vec<String>,
    pub exclude_filters: Vec<String>,
    pub keys_to_return: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorEntry {
    pub container: PageIdentifier,
    /// Root gets depth 0; depth grows toward the immediate container.
    pub depth: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub identifier: PageIdentifier,
    pub title: String,
    pub fragment: String,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub frontmatter: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_context: Vec<AncestorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Pre-filter result count, reported only when filters are active
    /// so the UI can warn about aggressive filtering; zero otherwise.
    pub total_unfiltered_count: usize,
}

pub struct SearchService {
    full_text: Arc<dyn FullTextQueryer>,
    index: Arc<dyn FrontmatterIndexQueryer>,
}

impl SearchService {
    pub fn new(
        full_text: Arc<dyn FullTextQueryer>,
        index: Arc<dyn FrontmatterIndexQueryer>,
    ) -> Self {
        Self { full_text, index }
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if request.query.trim().is_empty() {
            return Err(CoreError::invalid_argument("query cannot be empty"));
        }

        let hits = self.full_text.query(&request.query).await?;
        let unfiltered = hits.len();
        let filters_active =
            !request.include_filters.is_empty() || !request.exclude_filters.is_empty();

        let include_sets: Vec<BTreeSet<PageIdentifier>> = request
            .include_filters
            .iter()
            .map(|key| self.index.query_key_existence(key).into_iter().collect())
            .collect();
        let exclude_set: BTreeSet<PageIdentifier> = request
            .exclude_filters
            .iter()
            .flat_map(|key| self.index.query_key_existence(key))
            .collect();

        let mut results = Vec::new();
        for hit in hits {
            if !include_sets.iter().all(|set| set.contains(&hit.identifier)) {
                continue;
            }
            if exclude_set.contains(&hit.identifier) {
                continue;
            }
            results.push(self.decorate(hit, &request.keys_to_return));
        }

        Ok(SearchResponse {
            results,
            total_unfiltered_count: if filters_active { unfiltered } else { 0 },
        })
    }

    fn decorate(&self, hit: SearchHit, keys_to_return: &[String]) -> SearchResult {
        let mut frontmatter = BTreeMap::new();
        for key in keys_to_return {
            if let Some(value) = self.index.get_value(&hit.identifier, key) {
                if !value.is_empty() {
                    frontmatter.insert(key.clone(), value);
                }
            }
        }

        SearchResult {
            inventory_context: self.ancestor_chain(&hit.identifier),
            identifier: hit.identifier,
            title: hit.title,
            fragment: hit.fragment,
            highlights: hit.highlights,
            frontmatter,
        }
    }

    /// Root-to-immediate-container chain, cycle-safe, capped.
    fn ancestor_chain(&self, id: &PageIdentifier) -> Vec<AncestorEntry> {
        let mut chain: Vec<PageIdentifier> = Vec::new();
        let mut visited: BTreeSet<PageIdentifier> = BTreeSet::new();
        visited.insert(id.clone());

        let mut current = id.clone();
        while chain.len() < ANCESTOR_CAP {
            let parent = self
                .index
                .get_value(&current, "inventory.container")
                .map(|v| crate::ident::normalize(&v))
                .filter(|p| !p.is_empty());
            let Some(parent) = parent else { break };
            if !visited.insert(parent.clone()) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }

        chain
            .into_iter()
            .rev()
            .enumerate()
            .map(|(depth, container)| AncestorEntry {
                container,
                depth: depth as u32,
            })
            .collect()
    }
}
