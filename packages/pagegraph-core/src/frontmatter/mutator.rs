//! Frontmatter mutation: merge / replace / remove-at-path / get
//!
//! All operations normalize the page name on entry, enforce the
//! reserved root `identifier` key, and keep the stored/returned split:
//! stored frontmatter always carries the identifier, returned
//! frontmatter never does.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::value::Value;
use super::RESERVED_IDENTIFIER;
use crate::errors::{CoreError, Result};
use crate::ident::{normalize, PageIdentifier};
use crate::ports::{PageReaderMutator, StoreError};

/// One step of a structural path: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathComponent {
    Key(String),
    Index(i32),
}

/// Mutation surface over an injected page store.
pub struct FrontmatterMutator {
    store: Arc<dyn PageReaderMutator>,
}

impl FrontmatterMutator {
    pub fn new(store: Arc<dyn PageReaderMutator>) -> Self {
        Self { store }
    }

    /// Read a page's frontmatter with the root identifier stripped.
    pub async fn get(&self, page: &str) -> Result<Value> {
        let page = normalized_page(page)?;
        let fm = self.store.read_frontmatter(&page).await?;
        Ok(fm.strip_root_identifier())
    }

    /// Shallow-merge `new_frontmatter`'s top-level keys into the
    /// existing frontmatter, replacing at the top level only. An absent
    /// page merges against the empty mapping.
    pub async fn merge(&self, page: &str, new_frontmatter: Value) -> Result<Value> {
        let page = normalized_page(page)?;
        new_frontmatter.check_no_root_identifier()?;
        let incoming = match new_frontmatter {
            Value::Mapping(m) => m,
            _ => {
                return Err(CoreError::invalid_argument(
                    "frontmatter must be a mapping",
                ))
            }
        };

        let mut merged = match self.store.read_frontmatter(&page).await {
            Ok(existing) => match existing {
                Value::Mapping(m) => m,
                _ => Default::default(),
            },
            Err(StoreError::NotExist(_)) => Default::default(),
            Err(e) => return Err(e.into()),
        };
        for (k, v) in incoming {
            merged.insert(k, v);
        }

        let stored = Value::Mapping(merged).force_root_identifier(&page);
        self.store.write_frontmatter(&page, &stored).await?;
        debug!(page = %page, "merged frontmatter");
        Ok(stored.strip_root_identifier())
    }

    /// Discard the existing frontmatter and store `new_frontmatter`
    /// with the root identifier forced to the page's normalized name,
    /// silently overriding any user-supplied value.
    pub async fn replace(&self, page: &str, new_frontmatter: Value) -> Result<Value> {
        let page = normalized_page(page)?;
        let stored = new_frontmatter.force_root_identifier(&page);
        self.store.write_frontmatter(&page, &stored).await?;
        debug!(page = %page, "replaced frontmatter");
        Ok(stored.strip_root_identifier())
    }

    /// Remove the node addressed by `path`. The first component must be
    /// a key, and a single-component path naming the root identifier is
    /// rejected before traversal. A missing page hard-fails.
    pub async fn remove_at_path(&self, page: &str, path: &[PathComponent]) -> Result<Value> {
        let page = normalized_page(page)?;
        if path.is_empty() {
            return Err(CoreError::invalid_argument("path cannot be empty"));
        }
        if path.len() == 1 && matches!(&path[0], PathComponent::Key(k) if k == RESERVED_IDENTIFIER)
        {
            return Err(CoreError::invalid_argument(
                "identifier key cannot be modified",
            ));
        }

        let mut fm = self.store.read_frontmatter(&page).await?;
        remove_path(&mut fm, path)?;

        let stored = fm.force_root_identifier(&page);
        self.store.write_frontmatter(&page, &stored).await?;
        debug!(page = %page, components = path.len(), "removed frontmatter path");
        Ok(stored.strip_root_identifier())
    }
}

/// Structural traversal, exhaustive over (node type, component type).
fn remove_path(node: &mut Value, path: &[PathComponent]) -> Result<()> {
    let (head, rest) = match path.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };
    match (node, head) {
        (Value::Mapping(m), PathComponent::Key(key)) => {
            if rest.is_empty() {
                m.remove(key)
                    .map(|_| ())
                    .ok_or_else(|| CoreError::not_found(format!("key '{}' not found", key)))
            } else {
                let child = m
                    .get_mut(key)
                    .ok_or_else(|| CoreError::not_found(format!("key '{}' not found", key)))?;
                remove_path(child, rest)
            }
        }
        (Value::Sequence(items), PathComponent::Index(index)) => {
            let idx = usize::try_from(*index).map_err(|_| {
                CoreError::out_of_range(format!(
                    "index {} is out of range (length {})",
                    index,
                    items.len()
                ))
            })?;
            if idx >= items.len() {
                return Err(CoreError::out_of_range(format!(
                    "index {} is out of range (length {})",
                    index,
                    items.len()
                )));
            }
            if rest.is_empty() {
                items.remove(idx);
                Ok(())
            } else {
                remove_path(&mut items[idx], rest)
            }
        }
        (Value::Mapping(_), PathComponent::Index(_)) => {
            Err(CoreError::invalid_argument("not a key for a map"))
        }
        (Value::Sequence(_), PathComponent::Key(_)) => {
            Err(CoreError::invalid_argument("not an index for a slice"))
        }
        (_, _) => Err(CoreError::invalid_argument(
            "path is deeper than data structure",
        )),
    }
}

fn normalized_page(page: &str) -> Result<PageIdentifier> {
    let id = normalize(page);
    if id.is_empty() {
        return Err(CoreError::invalid_argument("page name cannot be empty"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemStore;
    use pretty_assertions::assert_eq;

    fn key(k: &str) -> PathComponent {
        PathComponent::Key(k.to_string())
    }

    fn index(i: i32) -> PathComponent {
        PathComponent::Index(i)
    }

    fn store_with(page: &str, fm: Value) -> (Arc<MemStore>, FrontmatterMutator) {
        let store = Arc::new(MemStore::new());
        store.seed_frontmatter(&normalize(page), fm);
        let mutator = FrontmatterMutator::new(store.clone());
        (store, mutator)
    }

    fn sample() -> Value {
        [
            ("a".to_string(), Value::from("b")),
            ("f".to_string(), Value::Sequence(vec!["g".into()])),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn merge_rejects_root_identifier() {
        let (store, mutator) = store_with("p", sample());
        let incoming: Value = [
            ("title".to_string(), Value::from("T")),
            ("identifier".to_string(), Value::from("x")),
        ]
        .into_iter()
        .collect();
        let err = mutator.merge("p", incoming).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(err.to_string().contains("identifier key cannot be modified"));
        // no write was issued
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn merge_replaces_top_level_only() {
        let (store, mutator) = store_with(
            "p",
            [(
                "inventory".to_string(),
                [("container".to_string(), Value::from("old"))]
                    .into_iter()
                    .collect(),
            )]
            .into_iter()
            .collect(),
        );
        let incoming: Value = [(
            "inventory".to_string(),
            [("items".to_string(), Value::Sequence(vec![]))]
                .into_iter()
                .collect(),
        )]
        .into_iter()
        .collect();
        let merged = mutator.merge("p", incoming).await.unwrap();
        // top-level replacement: the old container key is gone
        assert_eq!(merged.get_dotted("inventory.container"), None);
        let stored = store.frontmatter(&normalize("p")).unwrap();
        assert_eq!(
            stored.get_dotted("identifier").and_then(Value::as_str),
            Some("p")
        );
    }

    #[tokio::test]
    async fn merge_against_absent_page_starts_empty() {
        let store = Arc::new(MemStore::new());
        let mutator = FrontmatterMutator::new(store.clone());
        let merged = mutator
            .merge("new page", [("title".to_string(), Value::from("T"))].into_iter().collect())
            .await
            .unwrap();
        assert_eq!(merged.get_dotted("title").and_then(Value::as_str), Some("T"));
        assert_eq!(merged.get_dotted("identifier"), None);
        let stored = store.frontmatter(&normalize("new page")).unwrap();
        assert_eq!(
            stored.get_dotted("identifier").and_then(Value::as_str),
            Some("new_page")
        );
    }

    #[tokio::test]
    async fn replace_overrides_user_identifier() {
        let (store, mutator) = store_with("p", sample());
        let incoming: Value = [
            ("identifier".to_string(), Value::from("spoofed")),
            ("title".to_string(), Value::from("T")),
        ]
        .into_iter()
        .collect();
        let returned = mutator.replace("p", incoming).await.unwrap();
        assert_eq!(returned.get_dotted("identifier"), None);
        let stored = store.frontmatter(&normalize("p")).unwrap();
        assert_eq!(
            stored.get_dotted("identifier").and_then(Value::as_str),
            Some("p")
        );
        // replace discards, so "a" from the old frontmatter is gone
        assert_eq!(stored.get_dotted("a"), None);
    }

    #[tokio::test]
    async fn get_strips_identifier_and_reports_missing() {
        let (_, mutator) = store_with("p", sample().force_root_identifier(&normalize("p")));
        let fm = mutator.get("p").await.unwrap();
        assert_eq!(fm.get_dotted("identifier"), None);

        let missing = mutator.get("nope").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn remove_missing_key_is_not_found() {
        let (_, mutator) = store_with("p", sample());
        let err = mutator.remove_at_path("p", &[key("z")]).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(err.to_string().contains("key 'z' not found"));
    }

    #[tokio::test]
    async fn remove_out_of_range_index() {
        let (_, mutator) = store_with("p", sample());
        let err = mutator
            .remove_at_path("p", &[key("f"), index(99)])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange(_)));
        assert!(err.to_string().contains("index 99 is out of range"));
    }

    #[tokio::test]
    async fn remove_key_into_sequence_is_invalid() {
        let (_, mutator) = store_with("p", sample());
        let err = mutator
            .remove_at_path("p", &[key("f"), key("z")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not an index for a slice"));
    }

    #[tokio::test]
    async fn remove_index_into_mapping_is_invalid() {
        let (_, mutator) = store_with("p", sample());
        let err = mutator.remove_at_path("p", &[index(0)]).await.unwrap_err();
        assert!(err.to_string().contains("not a key for a map"));
    }

    #[tokio::test]
    async fn remove_past_primitive_is_invalid() {
        let (_, mutator) = store_with("p", sample());
        let err = mutator
            .remove_at_path("p", &[key("a"), key("b")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("path is deeper than data structure"));
    }

    #[tokio::test]
    async fn remove_root_identifier_is_rejected_before_traversal() {
        let (store, mutator) = store_with("p", sample());
        let err = mutator
            .remove_at_path("p", &[key("identifier")])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn remove_nested_identifier_is_allowed() {
        let (store, mutator) = store_with(
            "p",
            [(
                "part".to_string(),
                [("identifier".to_string(), Value::from("x"))]
                    .into_iter()
                    .collect(),
            )]
            .into_iter()
            .collect(),
        );
        mutator
            .remove_at_path("p", &[key("part"), key("identifier")])
            .await
            .unwrap();
        let stored = store.frontmatter(&normalize("p")).unwrap();
        assert_eq!(stored.get_dotted("part.identifier"), None);
    }

    #[tokio::test]
    async fn remove_splices_sequence_element() {
        let (store, mutator) = store_with(
            "p",
            [(
                "f".to_string(),
                Value::Sequence(vec!["g".into(), "h".into(), "i".into()]),
            )]
            .into_iter()
            .collect(),
        );
        mutator.remove_at_path("p", &[key("f"), index(1)]).await.unwrap();
        let stored = store.frontmatter(&normalize("p")).unwrap();
        assert_eq!(
            stored.get_dotted("f").unwrap().string_items(),
            vec!["g", "i"]
        );
    }

    #[tokio::test]
    async fn remove_on_absent_page_hard_fails() {
        let store = Arc::new(MemStore::new());
        let mutator = FrontmatterMutator::new(store);
        let err = mutator.remove_at_path("ghost", &[key("a")]).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
