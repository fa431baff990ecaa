//! Frontmatter service: get / merge / replace / remove-key-at-path.
//!
//! Thin mapping over the core mutator. Everything returned over the
//! wire has the root `identifier` key stripped; reserved-key
//! violations surface as `InvalidArgument`.

use serde::{Deserialize, Serialize};

use pagegraph_core::frontmatter::value::Value;
use pagegraph_core::{FrontmatterMutator, PathComponent};

use crate::status::RpcResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetFrontmatterRequest {
    pub page: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeFrontmatterRequest {
    pub page: String,
    pub frontmatter: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceFrontmatterRequest {
    pub page: String,
    pub frontmatter: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveKeyAtPathRequest {
    pub page: String,
    pub path: Vec<PathComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontmatterResponse {
    pub frontmatter: Value,
}

pub struct FrontmatterService {
    mutator: FrontmatterMutator,
}

impl FrontmatterService {
    pub fn new(mutator: FrontmatterMutator) -> Self {
        Self { mutator }
    }

    pub async fn get(&self, request: GetFrontmatterRequest) -> RpcResult<FrontmatterResponse> {
        let frontmatter = self.mutator.get(&request.page).await?;
        Ok(FrontmatterResponse { frontmatter })
    }

    pub async fn merge(&self, request: MergeFrontmatterRequest) -> RpcResult<FrontmatterResponse> {
        let frontmatter = self
            .mutator
            .merge(&request.page, request.frontmatter)
            .await?;
        Ok(FrontmatterResponse { frontmatter })
    }

    pub async fn replace(
        &self,
        request: ReplaceFrontmatterRequest,
    ) -> RpcResult<FrontmatterResponse> {
        let frontmatter = self
            .mutator
            .replace(&request.page, request.frontmatter)
            .await?;
        Ok(FrontmatterResponse { frontmatter })
    }

    pub async fn remove_key_at_path(
        &self,
        request: RemoveKeyAtPathRequest,
    ) -> RpcResult<FrontmatterResponse> {
        let frontmatter = self
            .mutator
            .remove_at_path(&request.page, &request.path)
            .await?;
        Ok(FrontmatterResponse { frontmatter })
    }
}
