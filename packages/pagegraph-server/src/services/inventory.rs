//! Inventory service
//!
//! Create, move, enumerate, and locate items. Domain failures (item
//! already exists, item not found on a best-effort operation) come
//! back as `success=false` bodies; only invariant violations and
//! infrastructure failures become a `Status`.

use serde::{Deserialize, Serialize};

use pagegraph_core::ident::PageIdentifier;
use pagegraph_core::inventory::{ContainerListing, ItemLocation};
use pagegraph_core::InventoryManager;

use crate::status::RpcResult;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateInventoryItemRequest {
    pub item_id: String,
    #[serde(default)]
    pub container: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryItemResponse {
    pub success: bool,
    pub item_id: PageIdentifier,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoveInventoryItemRequest {
    pub item_id: String,
    #[serde(default)]
    pub new_container: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveInventoryItemResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_container: Option<PageIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_container: Option<PageIdentifier>,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListContainerContentsRequest {
    pub container_id: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub max_depth: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindItemLocationRequest {
    pub item_id: String,
    #[serde(default)]
    pub include_hierarchy: bool,
}

pub struct InventoryService {
    manager: InventoryManager,
}

impl InventoryService {
    pub fn new(manager: InventoryManager) -> Self {
        Self { manager }
    }

    pub async fn create_inventory_item(
        &self,
        request: CreateInventoryItemRequest,
    ) -> RpcResult<CreateInventoryItemResponse> {
        let outcome = self
            .manager
            .create_item(
                &request.item_id,
                &request.container,
                &request.title,
                &request.description,
            )
            .await?;
        Ok(CreateInventoryItemResponse {
            error: (!outcome.success).then(|| outcome.summary.clone()),
            success: outcome.success,
            item_id: outcome.item_id,
            summary: outcome.summary,
        })
    }

    pub async fn move_inventory_item(
        &self,
        request: MoveInventoryItemRequest,
    ) -> RpcResult<MoveInventoryItemResponse> {
        let outcome = self
            .manager
            .move_item(&request.item_id, &request.new_container)
            .await?;
        Ok(MoveInventoryItemResponse {
            error: (!outcome.success).then(|| outcome.summary.clone()),
            success: outcome.success,
            previous_container: outcome.previous_container,
            new_container: outcome.new_container,
            summary: outcome.summary,
        })
    }

    pub async fn list_container_contents(
        &self,
        request: ListContainerContentsRequest,
    ) -> RpcResult<ContainerListing> {
        Ok(self
            .manager
            .list_contents(&request.container_id, request.recursive, request.max_depth)
            .await?)
    }

    pub async fn find_item_location(
        &self,
        request: FindItemLocationRequest,
    ) -> RpcResult<ItemLocation> {
        Ok(self
            .manager
            .find_location(&request.item_id, request.include_hierarchy)
            .await?)
    }
}
