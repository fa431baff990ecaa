//! Page management service: read, delete, identifier generation,
//! template-seeded creation, template listing.
//!
//! Template pages are ordinary pages whose identifier starts with
//! `tmpl`; creation requests may name a template with or without that
//! prefix.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use pagegraph_core::frontmatter::value::Value;
use pagegraph_core::ident::{normalize, title_case, PageIdentifier};
use pagegraph_core::ports::{FrontmatterIndexQueryer, PageReaderMutator, StoreError};
use pagegraph_core::{FrontmatterMutator, PageRenderer};

use crate::status::{RpcResult, Status};

const TEMPLATE_PREFIX: &str = "tmpl";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPageRequest {
    pub page_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPageResponse {
    pub content_markdown: String,
    pub front_matter_toml: String,
    pub rendered_content_markdown: String,
    pub rendered_content_html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePageResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateIdentifierRequest {
    pub text: String,
    pub ensure_unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateIdentifierResponse {
    pub identifier: PageIdentifier,
    pub is_unique: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_page: Option<PageIdentifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePageRequest {
    pub page_name: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub frontmatter: Option<Value>,
    #[serde(default)]
    pub content_markdown: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTemplatesRequest {
    #[serde(default)]
    pub exclude_identifiers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub identifier: PageIdentifier,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTemplatesResponse {
    pub templates: Vec<TemplateEntry>,
}

pub struct PageManagementService {
    store: Arc<dyn PageReaderMutator>,
    fm_index: Arc<dyn FrontmatterIndexQueryer>,
    renderer: Arc<PageRenderer>,
    mutator: FrontmatterMutator,
}

impl PageManagementService {
    pub fn new(
        store: Arc<dyn PageReaderMutator>,
        fm_index: Arc<dyn FrontmatterIndexQueryer>,
        renderer: Arc<PageRenderer>,
        mutator: FrontmatterMutator,
    ) -> Self {
        Self {
            store,
            fm_index,
            renderer,
            mutator,
        }
    }

    pub async fn read_page(&self, request: ReadPageRequest) -> RpcResult<ReadPageResponse> {
        let page = self.renderer.read_page(&request.page_name).await?;
        Ok(ReadPageResponse {
            content_markdown: page.markdown,
            front_matter_toml: page.frontmatter_toml,
            rendered_content_markdown: page.rendered_markdown,
            rendered_content_html: page.rendered_html,
        })
    }

    /// Best-effort delete: a missing page is a domain failure, not a
    /// transport error.
    pub async fn delete_page(&self, page_name: &str) -> RpcResult<DeletePageResponse> {
        let page = normalize(page_name);
        if page.is_empty() {
            return Err(Status::invalid_argument("page name cannot be empty"));
        }
        match self.store.delete_page(&page).await {
            Ok(()) => {
                debug!(page = %page, "deleted page");
                Ok(DeletePageResponse { success: true })
            }
            Err(StoreError::NotExist(_)) => Ok(DeletePageResponse { success: false }),
            Err(e) => Err(Status::internal(e.to_string())),
        }
    }

    pub async fn generate_identifier(
        &self,
        request: GenerateIdentifierRequest,
    ) -> RpcResult<GenerateIdentifierResponse> {
        let identifier = normalize(&request.text);
        if identifier.is_empty() {
            return Err(Status::invalid_argument(
                "text does not produce an identifier",
            ));
        }
        if !request.ensure_unique {
            return Ok(GenerateIdentifierResponse {
                identifier,
                is_unique: true,
                existing_page: None,
            });
        }
        match self.store.read_frontmatter(&identifier).await {
            Ok(_) => Ok(GenerateIdentifierResponse {
                existing_page: Some(identifier.clone()),
                identifier,
                is_unique: false,
            }),
            Err(StoreError::NotExist(_)) => Ok(GenerateIdentifierResponse {
                identifier,
                is_unique: true,
                existing_page: None,
            }),
            Err(e) => Err(Status::internal(e.to_string())),
        }
    }

    pub async fn create_page(&self, request: CreatePageRequest) -> RpcResult<CreatePageResponse> {
        let page = normalize(&request.page_name);
        if page.is_empty() {
            return Err(Status::invalid_argument("page name cannot be empty"));
        }

        match self.store.read_frontmatter(&page).await {
            Ok(_) => {
                return Ok(CreatePageResponse {
                    success: false,
                    error: Some(format!("page '{}' already exists", page)),
                })
            }
            Err(StoreError::NotExist(_)) => {}
            Err(e) => return Err(Status::internal(e.to_string())),
        }

        let template_body = match &request.template {
            Some(template) => match self.resolve_template(template).await? {
                Some(body) => Some(body),
                None => {
                    return Ok(CreatePageResponse {
                        success: false,
                        error: Some(format!("template '{}' does not exist", template)),
                    })
                }
            },
            None => None,
        };

        let frontmatter = request.frontmatter.unwrap_or_else(Value::empty_mapping);
        self.mutator.replace(page.as_str(), frontmatter).await?;

        let body = request
            .content_markdown
            .or(template_body)
            .unwrap_or_default();
        self.store
            .write_markdown(&page, &body)
            .await
            .map_err(|e| Status::internal(e.to_string()))?;

        debug!(page = %page, "created page");
        Ok(CreatePageResponse {
            success: true,
            error: None,
        })
    }

    /// Templates may be addressed by full identifier or by their short
    /// name (without the `tmpl` prefix).
    async fn resolve_template(&self, template: &str) -> RpcResult<Option<String>> {
        let direct = normalize(template);
        if direct.is_empty() {
            return Err(Status::invalid_argument("template name cannot be empty"));
        }
        for candidate in [
            direct.clone(),
            normalize(&format!("{}_{}", TEMPLATE_PREFIX, direct)),
        ] {
            match self.store.read_markdown(&candidate).await {
                Ok(body) => return Ok(Some(body)),
                Err(StoreError::NotExist(_)) => continue,
                Err(e) => return Err(Status::internal(e.to_string())),
            }
        }
        Ok(None)
    }

    pub fn list_templates(&self, request: ListTemplatesRequest) -> ListTemplatesResponse {
        let excluded: BTreeSet<PageIdentifier> = request
            .exclude_identifiers
            .iter()
            .map(|id| normalize(id))
            .collect();

        let templates = self
            .fm_index
            .query_prefix_match("identifier", TEMPLATE_PREFIX)
            .into_iter()
            .filter(|id| !excluded.contains(id))
            .map(|id| TemplateEntry {
                title: self
                    .fm_index
                    .get_value(&id, "title")
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| title_case(id.as_str())),
                description: self
                    .fm_index
                    .get_value(&id, "description")
                    .unwrap_or_default(),
                identifier: id,
            })
            .collect();
        ListTemplatesResponse { templates }
    }
}
