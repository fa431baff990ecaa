//! Filesystem page store
//!
//! One `<identifier>.md` per page under a root directory, framed as
//! `+++\n<TOML frontmatter>\n+++\n<markdown>`. Writes go through a
//! temporary file and a rename, which is the page-granularity
//! atomicity the core's last-writer-wins model requires.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use pagegraph_core::frontmatter::{codec, value::Value};
use pagegraph_core::ident::PageIdentifier;
use pagegraph_core::ports::{PageReaderMutator, StoreError};

use crate::error::Result;

pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    /// Open (and create if needed) a page directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn page_path(&self, page: &PageIdentifier) -> PathBuf {
        self.root.join(format!("{}.md", page))
    }

    /// Identifiers of every stored page, sorted; the indexing job
    /// walks this.
    pub fn page_identifiers(&self) -> Result<Vec<PageIdentifier>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "md").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(pagegraph_core::ident::normalize(stem));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    async fn read_parts(&self, page: &PageIdentifier) -> std::result::Result<(Value, String), StoreError> {
        let path = self.page_path(page);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotExist(page.as_str().to_string()))
            }
            Err(e) => return Err(StoreError::other(e)),
        };
        let (fm_text, body) = codec::split_page(&text);
        let frontmatter = match fm_text {
            Some(toml_text) => codec::parse_toml(toml_text).map_err(StoreError::other)?,
            None => Value::empty_mapping(),
        };
        Ok((frontmatter, body.to_string()))
    }

    async fn write_parts(
        &self,
        page: &PageIdentifier,
        frontmatter: &Value,
        markdown: &str,
    ) -> std::result::Result<(), StoreError> {
        let text = codec::compose_page(frontmatter, markdown).map_err(StoreError::other)?;
        let path = self.page_path(page);
        let tmp = path.with_extension("md.tmp");
        tokio::fs::write(&tmp, text.as_bytes())
            .await
            .map_err(StoreError::other)?;
        tokio::fs::rename(&tmp, &path).await.map_err(StoreError::other)?;
        debug!(page = %page, path = %path.display(), "wrote page file");
        Ok(())
    }
}

#[async_trait]
impl PageReaderMutator for FsPageStore {
    async fn read_frontmatter(
        &self,
        page: &PageIdentifier,
    ) -> std::result::Result<Value, StoreError> {
        Ok(self.read_parts(page).await?.0)
    }

    async fn write_frontmatter(
        &self,
        page: &PageIdentifier,
        frontmatter: &Value,
    ) -> std::result::Result<(), StoreError> {
        let markdown = match self.read_parts(page).await {
            Ok((_, body)) => body,
            Err(StoreError::NotExist(_)) => String::new(),
            Err(e) => return Err(e),
        };
        self.write_parts(page, frontmatter, &markdown).await
    }

    async fn read_markdown(
        &self,
        page: &PageIdentifier,
    ) -> std::result::Result<String, StoreError> {
        Ok(self.read_parts(page).await?.1)
    }

    async fn write_markdown(
        &self,
        page: &PageIdentifier,
        markdown: &str,
    ) -> std::result::Result<(), StoreError> {
        let frontmatter = match self.read_parts(page).await {
            Ok((fm, _)) => fm,
            Err(StoreError::NotExist(_)) => Value::empty_mapping(),
            Err(e) => return Err(e),
        };
        self.write_parts(page, &frontmatter, markdown).await
    }

    async fn delete_page(&self, page: &PageIdentifier) -> std::result::Result<(), StoreError> {
        let path = self.page_path(page);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotExist(page.as_str().to_string()))
            }
            Err(e) => Err(StoreError::other(e)),
        }
    }
}
