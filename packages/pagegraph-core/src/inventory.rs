//! Inventory graph manager
//!
//! Items and containers are ordinary pages related through the
//! `inventory.*` frontmatter convention. The relation is stored twice:
//! the item's `inventory.container` back-reference (authoritative) and
//! the container's `inventory.items` projection (eagerly maintained,
//! best-effort). Enumeration unions both sources and deduplicates, so
//! a stale projection is tolerable; it is never allowed to fail a
//! mutation.

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{CoreError, Result};
use crate::frontmatter::value::Value;
use crate::ident::{normalize, title_case, PageIdentifier};
use crate::ports::{FrontmatterIndexQueryer, PageReaderMutator, StoreError};

const CONTAINER_KEY: &str = "inventory.container";
const DEFAULT_MAX_DEPTH: u32 = 10;

/// Boilerplate body written for new items; it re-expands against the
/// template engine at render time.
const ITEM_BODY_TEMPLATE: &str = "\
# {{title}}

{{description}}

{{#if inventory.container}}Stored in {{LinkTo inventory.container}}.{{/if}}

## Contents

{{ShowInventoryContentsOf identifier}}
";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOutcome {
    pub success: bool,
    pub item_id: PageIdentifier,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub success: bool,
    pub previous_container: Option<PageIdentifier>,
    pub new_container: Option<PageIdentifier>,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub id: PageIdentifier,
    pub title: String,
    pub container: PageIdentifier,
    pub is_container: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerListing {
    pub container_id: PageIdentifier,
    pub items: Vec<ItemEntry>,
    pub total_count: usize,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEntry {
    pub container: PageIdentifier,
    /// Ancestor chain, root first, ending at `container`. Present only
    /// when the hierarchy was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PageIdentifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemLocation {
    pub item_id: PageIdentifier,
    pub found: bool,
    pub locations: Vec<LocationEntry>,
    pub summary: String,
}

/// Create, move, and enumerate inventory items. The only component
/// that performs multi-page writes for one logical operation; the
/// container-list writes are explicitly non-atomic.
pub struct InventoryManager {
    store: Arc<dyn PageReaderMutator>,
    index: Arc<dyn FrontmatterIndexQueryer>,
}

impl InventoryManager {
    pub fn new(
        store: Arc<dyn PageReaderMutator>,
        index: Arc<dyn FrontmatterIndexQueryer>,
    ) -> Self {
        Self { store, index }
    }

    /// Create a new item page. An already-existing page is a domain
    /// failure (`success=false`), not an error.
    pub async fn create_item(
        &self,
        item_id: &str,
        container: &str,
        title: &str,
        description: &str,
    ) -> Result<CreateOutcome> {
        let id = required_identifier(item_id)?;

        match self.store.read_frontmatter(&id).await {
            Ok(_) => {
                return Ok(CreateOutcome {
                    success: false,
                    summary: format!("item '{}' already exists", id),
                    item_id: id,
                })
            }
            Err(StoreError::NotExist(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let container = normalize(container);
        let title = if title.trim().is_empty() {
            title_case(id.as_str())
        } else {
            title.trim().to_string()
        };

        let mut inventory = Value::empty_mapping();
        if let Some(m) = inventory.as_mapping_mut() {
            if !container.is_empty() {
                m.insert(
                    "container".to_string(),
                    Value::String(container.as_str().to_string()),
                );
            }
            m.insert("items".to_string(), Value::Sequence(Vec::new()));
        }

        let mut fm = Value::empty_mapping();
        if let Some(m) = fm.as_mapping_mut() {
            m.insert("title".to_string(), Value::String(title.clone()));
            if !description.trim().is_empty() {
                m.insert(
                    "description".to_string(),
                    Value::String(description.trim().to_string()),
                );
            }
            m.insert("inventory".to_string(), inventory);
        }
        let fm = fm.force_root_identifier(&id);

        self.store.write_frontmatter(&id, &fm).await?;
        self.store.write_markdown(&id, ITEM_BODY_TEMPLATE).await?;
        debug!(item = %id, container = %container, "created inventory item");

        let summary = if container.is_empty() {
            format!("created '{}'", title)
        } else {
            format!("created '{}' in {}", title, container)
        };
        Ok(CreateOutcome {
            success: true,
            item_id: id,
            summary,
        })
    }

    /// Move an item to a new container (or to root level when the new
    /// container is empty). The back-reference write commits first;
    /// container-list updates are best-effort and logged on failure.
    pub async fn move_item(&self, item_id: &str, new_container: &str) -> Result<MoveOutcome> {
        let id = required_identifier(item_id)?;
        let new = non_empty(normalize(new_container));

        let mut fm = match self.store.read_frontmatter(&id).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => {
                return Ok(MoveOutcome {
                    success: false,
                    previous_container: None,
                    new_container: new,
                    summary: format!("item '{}' not found", id),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let previous = fm
            .get_dotted(CONTAINER_KEY)
            .and_then(Value::as_str)
            .map(normalize)
            .and_then(non_empty);

        if previous == new {
            let place = new
                .as_ref()
                .map(|c| format!("in '{}'", c))
                .unwrap_or_else(|| "at root level".to_string());
            return Ok(MoveOutcome {
                success: true,
                previous_container: previous,
                new_container: new,
                summary: format!("'{}' is already {}", id, place),
            });
        }

        set_container(&mut fm, new.as_ref());
        let fm = fm.force_root_identifier(&id);
        self.store.write_frontmatter(&id, &fm).await?;

        // The item is now authoritatively placed; a stale list is
        // masked by union-on-read.
        if let Some(prev) = &previous {
            self.detach_from_list(prev, &id).await;
        }
        if let Some(next) = &new {
            self.attach_to_list(next, &id).await;
        }

        let summary = match (&previous, &new) {
            (Some(p), Some(n)) => format!("moved '{}' from '{}' to '{}'", id, p, n),
            (None, Some(n)) => format!("moved '{}' to '{}'", id, n),
            (Some(p), None) => format!("moved '{}' out of '{}'", id, p),
            (None, None) => format!("'{}' left at root level", id),
        };
        Ok(MoveOutcome {
            success: true,
            previous_container: previous,
            new_container: new,
            summary,
        })
    }

    /// Enumerate a container's contents, unioning the index
    /// back-references with the container's own list.
    pub async fn list_contents(
        &self,
        container_id: &str,
        recursive: bool,
        max_depth: u32,
    ) -> Result<ContainerListing> {
        let id = required_identifier(container_id)?;
        let max_depth = if max_depth == 0 { DEFAULT_MAX_DEPTH } else { max_depth };

        let items = self.walk_contents(&id, recursive, max_depth, 0).await?;
        let total_count = if recursive {
            closure_size(&items)
        } else {
            items.len()
        };
        let summary = if recursive {
            format!("{} items under '{}' (recursive)", total_count, id)
        } else {
            format!("{} items in '{}'", total_count, id)
        };
        Ok(ContainerListing {
            container_id: id,
            items,
            total_count,
            summary,
        })
    }

    /// Locate an item and, optionally, its ancestor chain.
    pub async fn find_location(
        &self,
        item_id: &str,
        include_hierarchy: bool,
    ) -> Result<ItemLocation> {
        let id = required_identifier(item_id)?;

        let fm = match self.store.read_frontmatter(&id).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => {
                return Ok(ItemLocation {
                    found: false,
                    locations: Vec::new(),
                    summary: format!("item '{}' not found", id),
                    item_id: id,
                })
            }
            Err(e) => return Err(e.into()),
        };

        let container = fm
            .get_dotted(CONTAINER_KEY)
            .and_then(Value::as_str)
            .map(normalize)
            .and_then(non_empty);

        let Some(container) = container else {
            return Ok(ItemLocation {
                found: true,
                locations: Vec::new(),
                summary: format!("'{}' is not stored in any container", id),
                item_id: id,
            });
        };

        let path = if include_hierarchy {
            self.ancestor_chain(&container).await
        } else {
            Vec::new()
        };

        let summary = format!("'{}' is in '{}'", id, container);
        Ok(ItemLocation {
            found: true,
            locations: vec![LocationEntry { container, path }],
            summary,
            item_id: id,
        })
    }

    /// Walk parent links root-first, ending at `start`. Stops on cycle
    /// or read failure.
    async fn ancestor_chain(&self, start: &PageIdentifier) -> Vec<PageIdentifier> {
        let mut chain = vec![start.clone()];
        let mut visited: BTreeSet<PageIdentifier> = chain.iter().cloned().collect();
        let mut current = start.clone();
        loop {
            let parent = match self.store.read_frontmatter(&current).await {
                Ok(fm) => fm
                    .get_dotted(CONTAINER_KEY)
                    .and_then(Value::as_str)
                    .map(normalize)
                    .and_then(non_empty),
                Err(_) => None,
            };
            let Some(parent) = parent else { break };
            if !visited.insert(parent.clone()) {
                break; // cycle
            }
            chain.insert(0, parent.clone());
            current = parent;
        }
        chain
    }

    fn walk_contents<'a>(
        &'a self,
        container: &'a PageIdentifier,
        recursive: bool,
        max_depth: u32,
        depth: u32,
    ) -> BoxFuture<'a, Result<Vec<ItemEntry>>> {
        async move {
            let children = self.child_union(container).await?;
            let mut entries = Vec::with_capacity(children.len());
            for child in children {
                let title = self
                    .index
                    .get_value(&child, "title")
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| title_case(child.as_str()));
                let is_container = self.is_container(&child);
                let nested = if recursive && is_container && depth < max_depth {
                    self.walk_contents(&child, recursive, max_depth, depth + 1)
                        .await?
                } else {
                    Vec::new()
                };
                entries.push(ItemEntry {
                    id: child,
                    title,
                    container: container.clone(),
                    is_container,
                    nested,
                });
            }
            Ok(entries)
        }
        .boxed()
    }

    /// Deduplicated child set: index back-references unioned with the
    /// container's own item list. The back-reference wins on conflict,
    /// which also retires title-keyed legacy entries once the item has
    /// its own page.
    async fn child_union(&self, container: &PageIdentifier) -> Result<BTreeSet<PageIdentifier>> {
        let mut children: BTreeSet<PageIdentifier> = self
            .index
            .query_exact_match(CONTAINER_KEY, container.as_str())
            .into_iter()
            .collect();

        match self.store.read_frontmatter(container).await {
            Ok(fm) => {
                if let Some(items) = fm.get_dotted("inventory.items") {
                    for raw in items.string_items() {
                        let child = normalize(&raw);
                        if !child.is_empty() {
                            children.insert(child);
                        }
                    }
                }
            }
            Err(StoreError::NotExist(_)) => {} // index-only container
            Err(e) => return Err(e.into()),
        }
        children.remove(container);
        Ok(children)
    }

    fn is_container(&self, id: &PageIdentifier) -> bool {
        if self
            .index
            .get_value(id, "inventory.is_container")
            .map(|v| v == "true")
            .unwrap_or(false)
        {
            return true;
        }
        !self.index.query_exact_match(CONTAINER_KEY, id.as_str()).is_empty()
    }

    async fn detach_from_list(&self, container: &PageIdentifier, item: &PageIdentifier) {
        let mut fm = match self.store.read_frontmatter(container).await {
            Ok(fm) => fm,
            Err(e) => {
                warn!(container = %container, item = %item, error = %e,
                      "could not read previous container for list reconciliation");
                return;
            }
        };

        let Some(inventory) = fm
            .as_mapping_mut()
            .and_then(|m| m.get_mut("inventory"))
            .and_then(Value::as_mapping_mut)
        else {
            return;
        };
        let Some(Value::Sequence(items)) = inventory.get_mut("items") else {
            return;
        };
        let before = items.len();
        items.retain(|v| {
            v.scalar_string()
                .map(|s| normalize(&s) != *item)
                .unwrap_or(true)
        });
        if items.len() == before {
            return;
        }

        let fm = fm.force_root_identifier(container);
        if let Err(e) = self.store.write_frontmatter(container, &fm).await {
            warn!(container = %container, item = %item, error = %e,
                  "could not write previous container's item list");
        }
    }

    async fn attach_to_list(&self, container: &PageIdentifier, item: &PageIdentifier) {
        let mut fm = match self.store.read_frontmatter(container).await {
            Ok(fm) => fm,
            Err(StoreError::NotExist(_)) => {
                // Containers are never implicitly created; the item's
                // back-reference still places it.
                warn!(container = %container, item = %item,
                      "new container page does not exist; skipping list update");
                return;
            }
            Err(e) => {
                warn!(container = %container, item = %item, error = %e,
                      "could not read new container for list reconciliation");
                return;
            }
        };

        if fm.as_mapping().is_none() {
            fm = Value::empty_mapping();
        }
        let Value::Mapping(mapping) = &mut fm else { return };
        let inventory = mapping
            .entry("inventory".to_string())
            .or_insert_with(Value::empty_mapping);
        if inventory.as_mapping().is_none() {
            *inventory = Value::empty_mapping();
        }
        let Value::Mapping(inventory) = inventory else { return };
        let items = inventory
            .entry("items".to_string())
            .or_insert_with(|| Value::Sequence(Vec::new()));
        if items.as_sequence().is_none() {
            *items = Value::Sequence(Vec::new());
        }
        if let Value::Sequence(seq) = items {
            let present = seq
                .iter()
                .filter_map(Value::scalar_string)
                .any(|s| normalize(&s) == *item);
            if present {
                return;
            }
            seq.push(Value::String(item.as_str().to_string()));
        }

        let fm = fm.force_root_identifier(container);
        if let Err(e) = self.store.write_frontmatter(container, &fm).await {
            warn!(container = %container, item = %item, error = %e,
                  "could not write new container's item list");
        }
    }
}

fn set_container(fm: &mut Value, container: Option<&PageIdentifier>) {
    if fm.as_mapping().is_none() {
        *fm = Value::empty_mapping();
    }
    let Value::Mapping(mapping) = fm else { return };
    match container {
        Some(c) => {
            let inventory = mapping
                .entry("inventory".to_string())
                .or_insert_with(Value::empty_mapping);
            if inventory.as_mapping().is_none() {
                *inventory = Value::empty_mapping();
            }
            if let Some(inv) = inventory.as_mapping_mut() {
                inv.insert(
                    "container".to_string(),
                    Value::String(c.as_str().to_string()),
                );
            }
        }
        None => {
            if let Some(inv) = mapping.get_mut("inventory").and_then(Value::as_mapping_mut) {
                inv.remove("container");
            }
        }
    }
}

fn closure_size(items: &[ItemEntry]) -> usize {
    items
        .iter()
        .map(|e| 1 + closure_size(&e.nested))
        .sum()
}

fn required_identifier(raw: &str) -> Result<PageIdentifier> {
    let id = normalize(raw);
    if id.is_empty() {
        return Err(CoreError::invalid_argument("identifier cannot be empty"));
    }
    Ok(id)
}

fn non_empty(id: PageIdentifier) -> Option<PageIdentifier> {
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemIndex, MemStore};
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: Arc<MemStore>,
        index: Arc<MemIndex>,
        manager: InventoryManager,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemStore::new());
        let index = Arc::new(MemIndex::new());
        let manager = InventoryManager::new(store.clone(), index.clone());
        Fixture {
            store,
            index,
            manager,
        }
    }

    fn container_fm(id: &str, items: &[&str]) -> Value {
        let fm: Value = [
            ("title".to_string(), Value::String(title_case(id))),
            (
                "inventory".to_string(),
                [(
                    "items".to_string(),
                    Value::Sequence(items.iter().map(|i| Value::from(*i)).collect()),
                )]
                .into_iter()
                .collect(),
            ),
        ]
        .into_iter()
        .collect();
        fm.force_root_identifier(&normalize(id))
    }

    fn item_fm(id: &str, container: &str) -> Value {
        let fm: Value = [
            ("title".to_string(), Value::String(title_case(id))),
            (
                "inventory".to_string(),
                [("container".to_string(), Value::from(container))]
                    .into_iter()
                    .collect(),
            ),
        ]
        .into_iter()
        .collect();
        fm.force_root_identifier(&normalize(id))
    }

    #[tokio::test]
    async fn create_then_duplicate_is_domain_failure() {
        let f = fixture();
        let first = f
            .manager
            .create_item("Blue Box", "garage", "", "spare fuses")
            .await
            .unwrap();
        assert!(first.success);
        assert_eq!(first.item_id.as_str(), "blue_box");

        let stored = f.store.frontmatter(&normalize("blue_box")).unwrap();
        assert_eq!(
            stored.get_dotted("identifier").and_then(Value::as_str),
            Some("blue_box")
        );
        assert_eq!(
            stored.get_dotted("title").and_then(Value::as_str),
            Some("Blue Box")
        );
        assert_eq!(
            stored.get_dotted("inventory.container").and_then(Value::as_str),
            Some("garage")
        );

        let second = f.manager.create_item("blue box", "", "", "").await.unwrap();
        assert!(!second.success);
        assert!(second.summary.contains("already exists"));
    }

    #[tokio::test]
    async fn create_rejects_empty_identifier() {
        let f = fixture();
        let err = f.manager.create_item("  ", "", "", "").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn move_reconciles_both_container_lists() {
        let f = fixture();
        let i = normalize("i");
        f.store.seed_frontmatter(&i, item_fm("i", "old_c"));
        f.store
            .seed_frontmatter(&normalize("old_c"), container_fm("old_c", &["i", "other"]));
        f.store
            .seed_frontmatter(&normalize("new_c"), container_fm("new_c", &[]));

        let outcome = f.manager.move_item("i", "new_c").await.unwrap();
        assert!(outcome.success);
        assert_eq!(
            outcome.previous_container.as_ref().map(|c| c.as_str()),
            Some("old_c")
        );

        let item = f.store.frontmatter(&i).unwrap();
        assert_eq!(
            item.get_dotted("inventory.container").and_then(Value::as_str),
            Some("new_c")
        );
        let old = f.store.frontmatter(&normalize("old_c")).unwrap();
        assert_eq!(
            old.get_dotted("inventory.items").unwrap().string_items(),
            vec!["other"]
        );
        let new = f.store.frontmatter(&normalize("new_c")).unwrap();
        assert_eq!(
            new.get_dotted("inventory.items").unwrap().string_items(),
            vec!["i"]
        );
    }

    #[tokio::test]
    async fn move_to_same_container_is_idempotent_and_writes_nothing() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("i"), item_fm("i", "c"));
        let before = f.store.write_count();

        let outcome = f.manager.move_item("i", "c").await.unwrap();
        assert!(outcome.success);
        assert!(outcome.summary.contains("already"));
        assert_eq!(f.store.write_count(), before);
    }

    #[tokio::test]
    async fn move_missing_item_is_soft_failure() {
        let f = fixture();
        let outcome = f.manager.move_item("ghost", "c").await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.summary.contains("not found"));
    }

    #[tokio::test]
    async fn move_to_root_clears_back_reference() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("i"), item_fm("i", "c"));
        f.store
            .seed_frontmatter(&normalize("c"), container_fm("c", &["i"]));

        let outcome = f.manager.move_item("i", "").await.unwrap();
        assert!(outcome.success);
        let item = f.store.frontmatter(&normalize("i")).unwrap();
        assert_eq!(item.get_dotted("inventory.container"), None);
    }

    #[tokio::test]
    async fn move_appends_once_even_when_already_listed() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("i"), item_fm("i", "old_c"));
        f.store
            .seed_frontmatter(&normalize("old_c"), container_fm("old_c", &["i"]));
        // new_c already lists the item by its human title
        f.store
            .seed_frontmatter(&normalize("new_c"), container_fm("new_c", &["I"]));

        f.manager.move_item("i", "new_c").await.unwrap();
        let new = f.store.frontmatter(&normalize("new_c")).unwrap();
        assert_eq!(
            new.get_dotted("inventory.items").unwrap().string_items(),
            vec!["I"]
        );
    }

    #[tokio::test]
    async fn listing_unions_index_and_own_list() {
        let f = fixture();
        // own list knows about "rake"; index knows "ladder" back-references
        f.store
            .seed_frontmatter(&normalize("garage"), container_fm("garage", &["rake"]));
        f.index.put("ladder", "inventory.container", "garage");
        f.index.put("ladder", "title", "Ladder");

        let listing = f.manager.list_contents("garage", false, 0).await.unwrap();
        let ids: Vec<&str> = listing.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ladder", "rake"]);
        assert_eq!(listing.total_count, 2);
    }

    #[tokio::test]
    async fn listing_deduplicates_title_keyed_legacy_entries() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("garage"), container_fm("garage", &["Blue Box"]));
        f.index.put("blue_box", "inventory.container", "garage");

        let listing = f.manager.list_contents("garage", false, 0).await.unwrap();
        let ids: Vec<&str> = listing.items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["blue_box"]);
    }

    #[tokio::test]
    async fn recursive_listing_counts_closure_and_marks_containers() {
        let f = fixture();
        f.index.put("box", "inventory.container", "garage");
        f.index.put("fuse", "inventory.container", "box");

        let listing = f.manager.list_contents("garage", true, 0).await.unwrap();
        assert_eq!(listing.total_count, 2);
        assert_eq!(listing.items.len(), 1);
        let box_entry = &listing.items[0];
        assert!(box_entry.is_container);
        assert_eq!(box_entry.nested.len(), 1);
        assert_eq!(box_entry.nested[0].id.as_str(), "fuse");
        assert!(!box_entry.nested[0].is_container);
    }

    #[tokio::test]
    async fn recursive_listing_terminates_on_cycles() {
        let f = fixture();
        f.index.put("a", "inventory.container", "b");
        f.index.put("b", "inventory.container", "a");

        let listing = f.manager.list_contents("a", true, 3).await.unwrap();
        assert!(listing.total_count >= 1);
    }

    #[tokio::test]
    async fn explicit_is_container_marker_is_honored() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("garage"), container_fm("garage", &["shelf"]));
        f.index.put("shelf", "inventory.is_container", "true");

        let listing = f.manager.list_contents("garage", false, 0).await.unwrap();
        assert!(listing.items[0].is_container);
    }

    #[tokio::test]
    async fn find_location_walks_hierarchy_root_first() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("fuse"), item_fm("fuse", "box"));
        f.store
            .seed_frontmatter(&normalize("box"), item_fm("box", "shelf"));
        f.store
            .seed_frontmatter(&normalize("shelf"), item_fm("shelf", "garage"));
        f.store
            .seed_frontmatter(&normalize("garage"), container_fm("garage", &[]));

        let loc = f.manager.find_location("fuse", true).await.unwrap();
        assert!(loc.found);
        assert_eq!(loc.locations.len(), 1);
        let path: Vec<&str> = loc.locations[0].path.iter().map(|p| p.as_str()).collect();
        assert_eq!(path, vec!["garage", "shelf", "box"]);
    }

    #[tokio::test]
    async fn find_location_stops_on_cycle() {
        let f = fixture();
        f.store
            .seed_frontmatter(&normalize("a"), item_fm("a", "b"));
        f.store
            .seed_frontmatter(&normalize("b"), item_fm("b", "c"));
        f.store
            .seed_frontmatter(&normalize("c"), item_fm("c", "b"));

        let loc = f.manager.find_location("a", true).await.unwrap();
        assert!(loc.found);
        let path: Vec<&str> = loc.locations[0].path.iter().map(|p| p.as_str()).collect();
        assert_eq!(path, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn find_location_missing_item() {
        let f = fixture();
        let loc = f.manager.find_location("ghost", false).await.unwrap();
        assert!(!loc.found);
        assert!(loc.locations.is_empty());
    }

    #[tokio::test]
    async fn find_location_rootless_item() {
        let f = fixture();
        f.store.seed_frontmatter(
            &normalize("drifter"),
            container_fm("drifter", &[]),
        );
        let loc = f.manager.find_location("drifter", true).await.unwrap();
        assert!(loc.found);
        assert!(loc.locations.is_empty());
        assert!(loc.summary.contains("not stored"));
    }
}
