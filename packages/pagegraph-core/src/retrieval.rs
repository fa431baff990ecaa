//! Retrieval orchestrator
//!
//! Client-side fan-out for a voice/LLM caller: one search, parallel
//! page fetches, results collated back into search order and admitted
//! against a token budget. Per-page failures drop the page; a search
//! failure aborts the whole operation. Structured parallelism: one
//! fan-out, one join point, no orphan tasks. Dropping the future
//! cancels every in-flight fetch.

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::frontmatter::{codec, value::Value};
use crate::ident::PageIdentifier;
use crate::ports::FullTextQueryer;
use crate::render::PageRenderer;
use crate::search::SearchService;

/// Reserved for the prompt scaffolding around retrieved pages.
const PROMPT_RESERVE: usize = 200;
/// Reserved for the model's response.
const RESPONSE_RESERVE: usize = 500;

/// Cap on cumulative estimated tokens across returned pages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenBudget {
    pub max_tokens: usize,
    pub prompt_reserve: usize,
    pub response_reserve: usize,
}

impl TokenBudget {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            prompt_reserve: PROMPT_RESERVE,
            response_reserve: RESPONSE_RESERVE,
        }
    }

    /// Tokens left for page content after both reserves.
    pub fn available(&self) -> usize {
        self.max_tokens
            .saturating_sub(self.prompt_reserve)
            .saturating_sub(self.response_reserve)
    }
}

/// Cheap deterministic token estimate: characters divided by four,
/// rounded up; empty text estimates to zero.
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    chars.div_ceil(4)
}

/// Ordered search results, identifiers only.
#[async_trait]
pub trait ContentSearcher: Send + Sync {
    async fn search_ordered(&self, query: &str) -> Result<Vec<PageIdentifier>>;
}

#[async_trait]
impl ContentSearcher for SearchService {
    async fn search_ordered(&self, query: &str) -> Result<Vec<PageIdentifier>> {
        let request = crate::search::SearchRequest {
            query: query.to_string(),
            ..Default::default()
        };
        Ok(self
            .search(&request)
            .await?
            .results
            .into_iter()
            .map(|r| r.identifier)
            .collect())
    }
}

/// A fetched page, reduced to what the client consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPage {
    pub identifier: PageIdentifier,
    /// Rendered markdown when templating is wired, raw markdown
    /// otherwise.
    pub markdown: String,
    /// Frontmatter as a flexible mapping, parsed from the page's TOML.
    pub frontmatter: Value,
    pub tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub pages: Vec<RetrievedPage>,
    pub total_tokens: usize,
    pub truncated: bool,
}

/// One page fetch, as the orchestrator sees it.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, page: &PageIdentifier) -> Result<RetrievedPage>;
}

#[async_trait]
impl PageFetcher for PageRenderer {
    async fn fetch(&self, page: &PageIdentifier) -> Result<RetrievedPage> {
        let rendered = self.read_page(page.as_str()).await?;
        let markdown = if rendered.rendered_markdown.is_empty() {
            rendered.markdown
        } else {
            rendered.rendered_markdown
        };
        let frontmatter = if rendered.frontmatter_toml.is_empty() {
            Value::empty_mapping()
        } else {
            codec::parse_toml(&rendered.frontmatter_toml)?
        };
        Ok(RetrievedPage {
            tokens: estimate_tokens(&markdown),
            identifier: rendered.identifier,
            markdown,
            frontmatter,
        })
    }
}

pub struct RetrievalOrchestrator {
    searcher: Arc<dyn ContentSearcher>,
    fetcher: Arc<dyn PageFetcher>,
    budget: TokenBudget,
}

impl RetrievalOrchestrator {
    pub fn new(
        searcher: Arc<dyn ContentSearcher>,
        fetcher: Arc<dyn PageFetcher>,
        budget: TokenBudget,
    ) -> Self {
        Self {
            searcher,
            fetcher,
            budget,
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<RetrievalResult> {
        // A search failure aborts; per-page failures below do not.
        let mut ids = self.searcher.search_ordered(query).await?;
        if let Some(max) = max_results {
            ids.truncate(max);
        }

        let fetches = ids.iter().map(|id| {
            let fetcher = self.fetcher.clone();
            let id = id.clone();
            async move { (id.clone(), fetcher.fetch(&id).await) }
        });
        let outcomes = join_all(fetches).await;

        let available = self.budget.available();
        let mut pages = Vec::new();
        let mut total_tokens = 0usize;
        let mut truncated = false;
        for (id, outcome) in outcomes {
            let page = match outcome {
                Ok(page) => page,
                Err(e) => {
                    debug!(page = %id, error = %e, "dropping page from retrieval");
                    continue;
                }
            };
            if truncated {
                continue;
            }
            if total_tokens + page.tokens > available {
                truncated = true;
                continue;
            }
            total_tokens += page.tokens;
            pages.push(page);
        }

        Ok(RetrievalResult {
            pages,
            total_tokens,
            truncated,
        })
    }
}

/// Ordered identifiers straight from the full-text index, bypassing
/// filtering; used when the caller has no filter needs.
pub struct FullTextSearcher(pub Arc<dyn FullTextQueryer>);

#[async_trait]
impl ContentSearcher for FullTextSearcher {
    async fn search_ordered(&self, query: &str) -> Result<Vec<PageIdentifier>> {
        Ok(self
            .0
            .query(query)
            .await?
            .into_iter()
            .map(|hit| hit.identifier)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;
    use crate::ident::normalize;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedSearch(std::result::Result<Vec<&'static str>, &'static str>);

    #[async_trait]
    impl ContentSearcher for FixedSearch {
        async fn search_ordered(&self, _query: &str) -> Result<Vec<PageIdentifier>> {
            match &self.0 {
                Ok(ids) => Ok(ids.iter().map(|id| normalize(id)).collect()),
                Err(msg) => Err(CoreError::unavailable(*msg)),
            }
        }
    }

    struct FakeFetcher {
        // chars of markdown per page; missing pages fail
        sizes: HashMap<String, usize>,
        // per-page artificial latency, to shuffle completion order
        delays: HashMap<String, u64>,
    }

    impl FakeFetcher {
        fn new(sizes: &[(&str, usize)]) -> Self {
            Self {
                sizes: sizes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                delays: HashMap::new(),
            }
        }

        fn with_delays(mut self, delays: &[(&str, u64)]) -> Self {
            self.delays = delays.iter().map(|(k, v)| (k.to_string(), *v)).collect();
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, page: &PageIdentifier) -> Result<RetrievedPage> {
            if let Some(ms) = self.delays.get(page.as_str()) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            let chars = self
                .sizes
                .get(page.as_str())
                .copied()
                .ok_or_else(|| CoreError::not_found(page.as_str().to_string()))?;
            let markdown = "x".repeat(chars);
            Ok(RetrievedPage {
                tokens: estimate_tokens(&markdown),
                identifier: page.clone(),
                markdown,
                frontmatter: Value::empty_mapping(),
            })
        }
    }

    fn orchestrator(
        search: FixedSearch,
        fetcher: FakeFetcher,
        max_tokens: usize,
    ) -> RetrievalOrchestrator {
        RetrievalOrchestrator::new(
            Arc::new(search),
            Arc::new(fetcher),
            TokenBudget::new(max_tokens),
        )
    }

    #[test]
    fn budget_arithmetic() {
        let budget = TokenBudget::new(1000);
        assert_eq!(budget.available(), 300);
        assert_eq!(TokenBudget::new(100).available(), 0);
    }

    #[test]
    fn token_estimate_rounds_up_and_zeroes_empty() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[tokio::test]
    async fn budget_admits_pages_in_search_order() {
        // available = 300, three pages at 150 tokens (600 chars) each
        let orch = orchestrator(
            FixedSearch(Ok(vec!["p1", "p2", "p3"])),
            FakeFetcher::new(&[("p1", 600), ("p2", 600), ("p3", 600)]),
            1000,
        );
        let result = orch.retrieve("q", None).await.unwrap();
        let ids: Vec<&str> = result.pages.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2"]);
        assert!(result.truncated);
        assert!(result.total_tokens <= 300);
    }

    #[tokio::test]
    async fn oversized_first_page_yields_empty_truncated_result() {
        let orch = orchestrator(
            FixedSearch(Ok(vec!["huge"])),
            FakeFetcher::new(&[("huge", 4000)]),
            1000,
        );
        let result = orch.retrieve("q", None).await.unwrap();
        assert!(result.pages.is_empty());
        assert!(result.truncated);
        assert_eq!(result.total_tokens, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn search_order_is_preserved_under_shuffled_completion() {
        let orch = orchestrator(
            FixedSearch(Ok(vec!["a", "b", "c"])),
            FakeFetcher::new(&[("a", 40), ("b", 40), ("c", 40)])
                .with_delays(&[("a", 300), ("b", 200), ("c", 100)]),
            10_000,
        );
        let result = orch.retrieve("q", None).await.unwrap();
        let ids: Vec<&str> = result.pages.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn per_page_failures_drop_the_page_only() {
        let orch = orchestrator(
            FixedSearch(Ok(vec!["a", "missing", "c"])),
            FakeFetcher::new(&[("a", 40), ("c", 40)]),
            10_000,
        );
        let result = orch.retrieve("q", None).await.unwrap();
        let ids: Vec<&str> = result.pages.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn search_failure_aborts() {
        let orch = orchestrator(
            FixedSearch(Err("index down")),
            FakeFetcher::new(&[]),
            10_000,
        );
        let err = orch.retrieve("q", None).await.unwrap_err();
        assert!(matches!(err, CoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn max_results_trims_before_fetch() {
        let orch = orchestrator(
            FixedSearch(Ok(vec!["a", "b", "c"])),
            FakeFetcher::new(&[("a", 40), ("b", 40), ("c", 40)]),
            10_000,
        );
        let result = orch.retrieve("q", Some(2)).await.unwrap();
        assert_eq!(result.pages.len(), 2);
    }
}
