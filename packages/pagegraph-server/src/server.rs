//! Server construction
//!
//! All state flows through an explicit dependency struct; there are no
//! in-process mutable globals. Missing required dependencies fail
//! construction; missing optional ones disable the corresponding
//! surface (no renderer or template executor means `read_page` serves
//! empty rendered fields, no coordinator means the job RPCs return
//! `Unavailable`).

use std::sync::Arc;

use pagegraph_core::ports::{
    FrontmatterIndexQueryer, FullTextQueryer, MarkdownRenderer, PageReaderMutator,
    TemplateExecutor,
};
use pagegraph_core::{FrontmatterMutator, InventoryManager, PageRenderer, SearchService};

use crate::jobs::JobCoordinator;
use crate::services::frontmatter::FrontmatterService;
use crate::services::inventory::InventoryService;
use crate::services::page_management::PageManagementService;
use crate::services::search::SearchRpcService;
use crate::services::system_info::{SystemInfoService, VersionInfo};
use crate::status::{RpcResult, Status};

#[derive(Default)]
pub struct Dependencies {
    pub commit: String,
    pub build_time: String,
    pub node_name: Option<String>,
    pub login_name: Option<String>,

    // Required
    pub page_store: Option<Arc<dyn PageReaderMutator>>,
    pub full_text: Option<Arc<dyn FullTextQueryer>>,
    pub fm_index: Option<Arc<dyn FrontmatterIndexQueryer>>,

    // Optional
    pub job_coordinator: Option<Arc<JobCoordinator>>,
    pub markdown_renderer: Option<Arc<dyn MarkdownRenderer>>,
    pub template_executor: Option<Arc<dyn TemplateExecutor>>,
}

/// The assembled RPC surface.
pub struct WikiServer {
    pub system_info: SystemInfoService,
    pub frontmatter: FrontmatterService,
    pub pages: PageManagementService,
    pub search: SearchRpcService,
    pub inventory: InventoryService,
}

impl std::fmt::Debug for WikiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiServer").finish_non_exhaustive()
    }
}

impl WikiServer {
    pub fn new(deps: Dependencies) -> RpcResult<Self> {
        let page_store = deps
            .page_store
            .ok_or_else(|| missing("page reader/mutator"))?;
        let full_text = deps.full_text.ok_or_else(|| missing("full-text queryer"))?;
        let fm_index = deps
            .fm_index
            .ok_or_else(|| missing("frontmatter index queryer"))?;

        let renderer = Arc::new(PageRenderer::new(
            page_store.clone(),
            deps.markdown_renderer,
            deps.template_executor,
        ));
        let search = Arc::new(SearchService::new(full_text, fm_index.clone()));

        Ok(Self {
            system_info: SystemInfoService::new(
                VersionInfo {
                    commit: deps.commit,
                    build_time: deps.build_time,
                    node_name: deps.node_name,
                    login_name: deps.login_name,
                },
                deps.job_coordinator,
            ),
            frontmatter: FrontmatterService::new(FrontmatterMutator::new(page_store.clone())),
            pages: PageManagementService::new(
                page_store.clone(),
                fm_index.clone(),
                renderer,
                FrontmatterMutator::new(page_store.clone()),
            ),
            search: SearchRpcService::new(search),
            inventory: InventoryService::new(InventoryManager::new(page_store, fm_index)),
        })
    }
}

fn missing(name: &str) -> Status {
    Status::unavailable(format!("required dependency '{}' is not wired", name))
}

/// Install the global tracing subscriber, filtered from the
/// environment. Safe to call more than once.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
