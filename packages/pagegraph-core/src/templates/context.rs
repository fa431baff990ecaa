//! Expansion context
//!
//! The data a template sees: the page's raw frontmatter mapping plus a
//! synthesized `inventory` view whose `items` is the deduplicated union
//! of the page's own list and the index back-references, sorted
//! lexicographically. Normalization collapses title-keyed legacy
//! entries into their identifier-keyed successors.

use serde_json::{json, Map, Value as Json};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::frontmatter::value::Value;
use crate::ident::{normalize, title_case, PageIdentifier};
use crate::ports::FrontmatterIndexQueryer;

pub(super) fn build_context(
    page: &PageIdentifier,
    frontmatter: &Value,
    index: &Arc<dyn FrontmatterIndexQueryer>,
) -> Json {
    let mut root = match serde_json::to_value(frontmatter) {
        Ok(Json::Object(map)) => map,
        _ => Map::new(),
    };

    root.insert("identifier".to_string(), json!(page.as_str()));
    if !root.get("title").map(Json::is_string).unwrap_or(false) {
        root.insert("title".to_string(), json!(title_case(page.as_str())));
    }

    let mut inventory = match root.remove("inventory") {
        Some(Json::Object(map)) => map,
        _ => Map::new(),
    };
    inventory.insert(
        "items".to_string(),
        Json::Array(
            synthesized_items(page, frontmatter, index)
                .into_iter()
                .map(|id| json!(id.as_str()))
                .collect(),
        ),
    );
    root.insert("inventory".to_string(), Json::Object(inventory));

    Json::Object(root)
}

fn synthesized_items(
    page: &PageIdentifier,
    frontmatter: &Value,
    index: &Arc<dyn FrontmatterIndexQueryer>,
) -> Vec<PageIdentifier> {
    let mut items: BTreeSet<PageIdentifier> = index
        .query_exact_match("inventory.container", page.as_str())
        .into_iter()
        .collect();
    if let Some(own) = frontmatter.get_dotted("inventory.items") {
        for raw in own.string_items() {
            let id = normalize(&raw);
            if !id.is_empty() {
                items.insert(id);
            }
        }
    }
    items.remove(page);
    items.into_iter().collect()
}
