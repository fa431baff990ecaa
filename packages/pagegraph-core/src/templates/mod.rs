//! Template expansion engine
//!
//! First-pass rewriting of a page's markdown body. Template functions
//! reach across the page graph through the frontmatter index, so
//! expansion must survive cycles (visited set), runaway nesting (depth
//! caps rendering sentinels), and runaway time (a wall-clock deadline
//! checked at every recursion boundary, independent of the caller's
//! own deadline).

mod context;
mod helpers;

use async_trait::async_trait;
use handlebars::{no_escape, Handlebars, RenderError, RenderErrorReason};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::{CoreError, Result};
use crate::ident::PageIdentifier;
use crate::ports::{
    ExpansionSource, FrontmatterIndexQueryer, PageReaderMutator, StoreError, TemplateExecutor,
};

/// Wall-clock cap on one top-level expansion.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Overall execution-depth cap across nested helper evaluation; the
/// inventory traversal carries its own tighter cap.
const EXECUTION_DEPTH_CAP: usize = 50;

/// Bounded template preview carried in the timeout diagnostic.
const PREVIEW_CHARS: usize = 120;

/// State threaded through one expansion: cycle detection, the deadline,
/// and the identity of the page being expanded.
pub(crate) struct ExpansionShared {
    index: Arc<dyn FrontmatterIndexQueryer>,
    page: PageIdentifier,
    page_is_container: bool,
    visited: Mutex<HashSet<PageIdentifier>>,
    deadline: Instant,
    exec_depth: AtomicUsize,
    max_depth_seen: AtomicUsize,
    timed_out: AtomicBool,
}

/// Decrements the execution depth when a helper invocation unwinds.
struct DepthGuard<'a>(&'a ExpansionShared);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.exec_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ExpansionShared {
    fn check_deadline(&self) -> std::result::Result<(), RenderError> {
        if Instant::now() >= self.deadline {
            self.timed_out.store(true, Ordering::SeqCst);
            return Err(
                RenderErrorReason::Other("expansion deadline exceeded".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Track one nested helper evaluation. `None` means the overall
    /// cap is hit and the caller should render the depth sentinel
    /// instead of evaluating.
    fn enter(&self) -> Option<DepthGuard<'_>> {
        let depth = self.exec_depth.fetch_add(1, Ordering::SeqCst) + 1;
        self.note_depth(depth);
        if depth > EXECUTION_DEPTH_CAP {
            self.exec_depth.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(DepthGuard(self))
    }

    fn is_visited(&self, id: &PageIdentifier) -> bool {
        self.visited.lock().map(|v| v.contains(id)).unwrap_or(true)
    }

    fn mark_visited(&self, id: &PageIdentifier) {
        if let Ok(mut v) = self.visited.lock() {
            v.insert(id.clone());
        }
    }

    fn note_depth(&self, depth: usize) {
        self.max_depth_seen.fetch_max(depth, Ordering::Relaxed);
    }

    fn page_exists(&self, id: &PageIdentifier) -> bool {
        self.index.get_value(id, "identifier").is_some()
    }

    fn visited_snapshot(&self) -> Vec<String> {
        let mut pages: Vec<String> = self
            .visited
            .lock()
            .map(|v| v.iter().map(|p| p.as_str().to_string()).collect())
            .unwrap_or_default();
        pages.sort();
        pages
    }
}

/// Diagnostic surfaced when the deadline expires mid-expansion.
struct TimeoutDiagnostic {
    page: PageIdentifier,
    source: ExpansionSource,
    depth: usize,
    visited: Vec<String>,
    elapsed: Duration,
    preview: String,
}

impl fmt::Display for TimeoutDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "template expansion exceeded deadline: page='{}' source={} depth={} elapsed={:.2?} visited=[{}] template=\"{}\"",
            self.page,
            self.source,
            self.depth,
            self.elapsed,
            self.visited.join(", "),
            self.preview,
        )
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", truncated)
}

/// The expansion engine: implements [`TemplateExecutor`] over the
/// injected store and index.
pub struct TemplateEngine {
    store: Arc<dyn PageReaderMutator>,
    index: Arc<dyn FrontmatterIndexQueryer>,
    deadline: Duration,
}

impl TemplateEngine {
    pub fn new(
        store: Arc<dyn PageReaderMutator>,
        index: Arc<dyn FrontmatterIndexQueryer>,
    ) -> Self {
        Self {
            store,
            index,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override the expansion deadline; tests drive this down to force
    /// the timeout path.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl TemplateExecutor for TemplateEngine {
    async fn execute(
        &self,
        page: &PageIdentifier,
        text: &str,
        source: ExpansionSource,
    ) -> Result<String> {
        let started = Instant::now();

        let frontmatter = match self.store.read_frontmatter(page).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => crate::frontmatter::value::Value::empty_mapping(),
            Err(e) => return Err(e.into()),
        };

        let shared = Arc::new(ExpansionShared {
            page_is_container: helpers::container_like(self.index.as_ref(), page),
            index: self.index.clone(),
            page: page.clone(),
            visited: Mutex::new(HashSet::new()),
            deadline: started + self.deadline,
            exec_depth: AtomicUsize::new(0),
            max_depth_seen: AtomicUsize::new(0),
            timed_out: AtomicBool::new(false),
        });
        shared.mark_visited(page);

        let data = context::build_context(page, &frontmatter, &self.index);

        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        helpers::register_all(&mut registry, &shared);

        match registry.render_template(text, &data) {
            Ok(expanded) => {
                debug!(page = %page, source = %source, elapsed = ?started.elapsed(),
                       "expanded template");
                Ok(expanded)
            }
            Err(_) if shared.timed_out.load(Ordering::SeqCst) => {
                let diagnostic = TimeoutDiagnostic {
                    page: page.clone(),
                    source,
                    depth: shared.max_depth_seen.load(Ordering::Relaxed),
                    visited: shared.visited_snapshot(),
                    elapsed: started.elapsed(),
                    preview: preview(text),
                };
                Err(CoreError::Template(diagnostic.to_string()))
            }
            Err(e) => Err(CoreError::Template(format!(
                "template expansion failed for '{}': {}",
                page, e
            ))),
        }
    }
}
