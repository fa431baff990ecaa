//! Search service: thin mapping over the core search surface.

use std::sync::Arc;

use pagegraph_core::search::{SearchRequest, SearchResponse};
use pagegraph_core::SearchService;

use crate::status::RpcResult;

pub struct SearchRpcService {
    inner: Arc<SearchService>,
}

impl SearchRpcService {
    pub fn new(inner: Arc<SearchService>) -> Self {
        Self { inner }
    }

    pub async fn search_content(&self, request: SearchRequest) -> RpcResult<SearchResponse> {
        Ok(self.inner.search(&request).await?)
    }
}
