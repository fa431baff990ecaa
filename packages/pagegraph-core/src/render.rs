//! Page rendering
//!
//! Composition layer: read markdown + frontmatter, template-expand,
//! markdown-render. The renderer and template executor are optional
//! collaborators; a server without them still serves raw pages with
//! empty rendered fields.

use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::Result;
use crate::frontmatter::{codec, value::Value};
use crate::ident::{normalize, PageIdentifier};
use crate::ports::{
    ExpansionSource, MarkdownRenderer, PageReaderMutator, StoreError, TemplateExecutor,
};

/// Rendering-time aggregate; not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPage {
    pub identifier: PageIdentifier,
    /// Raw markdown body as stored.
    pub markdown: String,
    /// Frontmatter serialized to TOML, root identifier stripped.
    pub frontmatter_toml: String,
    /// Markdown after template expansion; empty when no executor is
    /// wired.
    pub rendered_markdown: String,
    /// HTML after markdown rendering; empty when no renderer is wired.
    pub rendered_html: String,
}

pub struct PageRenderer {
    store: Arc<dyn PageReaderMutator>,
    renderer: Option<Arc<dyn MarkdownRenderer>>,
    executor: Option<Arc<dyn TemplateExecutor>>,
}

impl PageRenderer {
    pub fn new(
        store: Arc<dyn PageReaderMutator>,
        renderer: Option<Arc<dyn MarkdownRenderer>>,
        executor: Option<Arc<dyn TemplateExecutor>>,
    ) -> Self {
        Self {
            store,
            renderer,
            executor,
        }
    }

    /// Read and render one page. Missing markdown is `NotFound`;
    /// missing frontmatter is tolerated.
    pub async fn read_page(&self, page_name: &str) -> Result<RenderedPage> {
        let page = normalize(page_name);
        let markdown = self.store.read_markdown(&page).await?;

        let frontmatter = match self.store.read_frontmatter(&page).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => Value::empty_mapping(),
            Err(e) => return Err(e.into()),
        };
        let stripped = frontmatter.clone().strip_root_identifier();
        let frontmatter_toml = if stripped.is_empty_mapping() {
            String::new()
        } else {
            codec::to_toml_string(&stripped)?
        };

        let (rendered_markdown, rendered_html) = match (&self.executor, &self.renderer) {
            (Some(executor), Some(renderer)) => {
                let expanded = executor
                    .execute(&page, &markdown, ExpansionSource::Server)
                    .await?;
                let html = renderer.render(&expanded);
                (expanded, html)
            }
            _ => (String::new(), String::new()),
        };

        Ok(RenderedPage {
            identifier: page,
            markdown,
            frontmatter_toml,
            rendered_markdown,
            rendered_html,
        })
    }

    /// The frontmatter-delimited page text, as it exists at rest.
    pub async fn compose_text(&self, page_name: &str) -> Result<String> {
        let page = normalize(page_name);
        let markdown = self.store.read_markdown(&page).await?;
        let frontmatter = match self.store.read_frontmatter(&page).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => Value::empty_mapping(),
            Err(e) => return Err(e.into()),
        };
        codec::compose_page(&frontmatter, &markdown)
    }
}

/// Markdown-to-HTML via pulldown-cmark, tables and strikethrough on.
#[derive(Debug, Default)]
pub struct CmarkRenderer;

impl CmarkRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        let parser = Parser::new_ext(markdown, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;
    use crate::testing::MemStore;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn read_page_without_renderer_leaves_rendered_fields_empty() {
        let store = Arc::new(MemStore::new());
        let page = normalize("garage");
        store.seed_markdown(&page, "# Garage\n");
        store.seed_frontmatter(
            &page,
            [("title".to_string(), Value::from("Garage"))]
                .into_iter()
                .collect::<Value>()
                .force_root_identifier(&page),
        );

        let renderer = PageRenderer::new(store, None, None);
        let rendered = renderer.read_page("Garage").await.unwrap();
        assert_eq!(rendered.markdown, "# Garage\n");
        assert!(rendered.frontmatter_toml.contains("title"));
        assert!(!rendered.frontmatter_toml.contains("identifier"));
        assert_eq!(rendered.rendered_markdown, "");
        assert_eq!(rendered.rendered_html, "");
    }

    #[tokio::test]
    async fn read_page_missing_markdown_is_not_found() {
        let store = Arc::new(MemStore::new());
        let renderer = PageRenderer::new(store, None, None);
        let err = renderer.read_page("ghost").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn read_page_tolerates_missing_frontmatter() {
        let store = Arc::new(MemStore::new());
        store.seed_markdown(&normalize("note"), "just text\n");
        let renderer = PageRenderer::new(store, None, None);
        let rendered = renderer.read_page("note").await.unwrap();
        assert_eq!(rendered.frontmatter_toml, "");
    }

    #[test]
    fn cmark_renders_bold_links() {
        let html = CmarkRenderer::new().render("- **[Box](/box)**\n");
        assert!(html.contains("<strong>"));
        assert!(html.contains("href=\"/box\""));
    }

    #[tokio::test]
    async fn compose_text_frames_frontmatter() {
        let store = Arc::new(MemStore::new());
        let page = normalize("garage");
        store.seed_markdown(&page, "# Garage\n");
        store.seed_frontmatter(
            &page,
            [("title".to_string(), Value::from("Garage"))]
                .into_iter()
                .collect::<Value>()
                .force_root_identifier(&page),
        );
        let renderer = PageRenderer::new(store, None, None);
        let text = renderer.compose_text("garage").await.unwrap();
        assert!(text.starts_with("+++\n"));
        assert!(text.ends_with("# Garage\n"));
    }
}
