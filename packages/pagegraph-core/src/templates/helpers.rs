//! Template function set
//!
//! Each helper is a struct over the shared expansion state, registered
//! on a per-execution registry. Helpers consult only the frontmatter
//! index; deadline checks happen at every helper entry and at every
//! recursion boundary. Cycle and depth caps render sentinel text and
//! let the surrounding expansion keep going.

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, ScopedJson,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::ExpansionShared;
use crate::ident::{normalize, title_case, PageIdentifier};
use crate::ports::FrontmatterIndexQueryer;

/// Inventory traversal cap inside `ShowInventoryContentsOf`.
const INVENTORY_DEPTH_CAP: usize = 10;

const DEPTH_SENTINEL: &str = "[Maximum depth reached]";

pub(super) fn register_all(registry: &mut Handlebars<'_>, shared: &Arc<ExpansionShared>) {
    registry.register_helper("LinkTo", Box::new(LinkTo(shared.clone())));
    registry.register_helper(
        "ShowInventoryContentsOf",
        Box::new(ShowInventoryContentsOf(shared.clone())),
    );
    registry.register_helper("IsContainer", Box::new(IsContainer(shared.clone())));
    registry.register_helper("FindBy", Box::new(FindBy(shared.clone())));
    registry.register_helper("FindByPrefix", Box::new(FindByPrefix(shared.clone())));
    registry.register_helper(
        "FindByKeyExistence",
        Box::new(FindByKeyExistence(shared.clone())),
    );
}

fn str_param(h: &Helper<'_>, name: &'static str, idx: usize) -> Result<String, RenderError> {
    let value = h
        .param(idx)
        .ok_or(RenderErrorReason::ParamNotFoundForIndex(name, idx))?
        .value();
    match value.as_str() {
        Some(s) => Ok(s.to_string()),
        None => Ok(value.to_string().trim_matches('"').to_string()),
    }
}

pub(super) struct LinkTo(pub Arc<ExpansionShared>);

impl HelperDef for LinkTo {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.check_deadline()?;
        let Some(_guard) = self.0.enter() else {
            out.write(DEPTH_SENTINEL)?;
            return Ok(());
        };
        let target = str_param(h, "LinkTo", 0)?;
        out.write(&link_to(&self.0, &target))?;
        Ok(())
    }
}

/// Markdown link to a page. Missing targets get a provisional creation
/// URL; re-entered targets get a safe circular-reference fallback.
pub(super) fn link_to(shared: &ExpansionShared, raw: &str) -> String {
    let id = normalize(raw);
    if id.is_empty() {
        return String::new();
    }

    if shared.is_visited(&id) {
        let title = indexed_title(shared, &id);
        return format!("[{} (circular reference)](/{})", title, id);
    }

    if shared.page_exists(&id) {
        format!("[{}](/{})", indexed_title(shared, &id), id)
    } else {
        let title = title_case(id.as_str());
        let mut url = format!("/{}?tmpl=inv_item", id);
        if shared.page_is_container {
            url.push_str("&inventory.container=");
            url.push_str(shared.page.as_str());
        }
        url.push_str("&title=");
        url.push_str(&utf8_percent_encode(&title, NON_ALPHANUMERIC).to_string());
        format!("[{}]({})", title, url)
    }
}

fn indexed_title(shared: &ExpansionShared, id: &PageIdentifier) -> String {
    shared
        .index
        .get_value(id, "title")
        .and_then(|t| t.lines().next().map(str::to_string))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_case(id.as_str()))
}

pub(super) struct ShowInventoryContentsOf(pub Arc<ExpansionShared>);

impl HelperDef for ShowInventoryContentsOf {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.check_deadline()?;
        let Some(_guard) = self.0.enter() else {
            out.write(DEPTH_SENTINEL)?;
            return Ok(());
        };
        let container = normalize(&str_param(h, "ShowInventoryContentsOf", 0)?);
        if container.is_empty() {
            return Ok(());
        }
        let listing = show_contents(&self.0, &container, 0)?;
        out.write(&listing)?;
        Ok(())
    }
}

fn show_contents(
    shared: &ExpansionShared,
    container: &PageIdentifier,
    depth: usize,
) -> Result<String, RenderError> {
    shared.check_deadline()?;
    shared.note_depth(depth);
    let indent = "  ".repeat(depth);
    if depth >= INVENTORY_DEPTH_CAP {
        return Ok(format!("{}{}\n", indent, DEPTH_SENTINEL));
    }

    let mut output = String::new();
    for child in container_children(shared.index.as_ref(), container) {
        let link = link_to(shared, child.as_str());
        if !container_like(shared.index.as_ref(), &child) {
            output.push_str(&format!("{}- {}\n", indent, link));
            continue;
        }
        if shared.is_visited(&child) {
            output.push_str(&format!(
                "{}- *(circular reference to {} omitted)*\n",
                indent,
                indexed_title(shared, &child)
            ));
            continue;
        }
        shared.mark_visited(&child);
        output.push_str(&format!("{}- **{}**\n", indent, link));
        output.push_str(&show_contents(shared, &child, depth + 1)?);
    }
    Ok(output)
}

/// Deduplicated, sorted union of index back-references and the
/// container's own item list. A title-keyed legacy entry collapses into
/// the identifier-keyed entry through normalization.
pub(super) fn container_children(
    index: &dyn FrontmatterIndexQueryer,
    container: &PageIdentifier,
) -> Vec<PageIdentifier> {
    let mut children: BTreeSet<PageIdentifier> = index
        .query_exact_match("inventory.container", container.as_str())
        .into_iter()
        .collect();
    if let Some(items) = index.get_value(container, "inventory.items") {
        for raw in items.lines() {
            let child = normalize(raw);
            if !child.is_empty() {
                children.insert(child);
            }
        }
    }
    children.remove(container);
    children.into_iter().collect()
}

pub(super) fn container_like(index: &dyn FrontmatterIndexQueryer, id: &PageIdentifier) -> bool {
    if !index
        .query_exact_match("inventory.container", id.as_str())
        .is_empty()
    {
        return true;
    }
    index
        .get_value(id, "inventory.items")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

pub(super) struct IsContainer(pub Arc<ExpansionShared>);

impl HelperDef for IsContainer {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        self.0.check_deadline()?;
        let id = normalize(&str_param(h, "IsContainer", 0)?);
        let result = !id.is_empty() && container_like(self.0.index.as_ref(), &id);
        Ok(ScopedJson::Derived(serde_json::Value::Bool(result)))
    }
}

fn linked_list(shared: &ExpansionShared, mut ids: Vec<PageIdentifier>) -> String {
    ids.sort();
    ids.dedup();
    ids.iter()
        .map(|id| format!("- {}\n", link_to(shared, id.as_str())))
        .collect()
}

pub(super) struct FindBy(pub Arc<ExpansionShared>);

impl HelperDef for FindBy {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.check_deadline()?;
        let key = str_param(h, "FindBy", 0)?;
        let value = str_param(h, "FindBy", 1)?;
        let hits = self.0.index.query_exact_match(&key, &value);
        out.write(&linked_list(&self.0, hits))?;
        Ok(())
    }
}

pub(super) struct FindByPrefix(pub Arc<ExpansionShared>);

impl HelperDef for FindByPrefix {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.check_deadline()?;
        let key = str_param(h, "FindByPrefix", 0)?;
        let prefix = str_param(h, "FindByPrefix", 1)?;
        let hits = self.0.index.query_prefix_match(&key, &prefix);
        out.write(&linked_list(&self.0, hits))?;
        Ok(())
    }
}

pub(super) struct FindByKeyExistence(pub Arc<ExpansionShared>);

impl HelperDef for FindByKeyExistence {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        self.0.check_deadline()?;
        let key = str_param(h, "FindByKeyExistence", 0)?;
        let hits = self.0.index.query_key_existence(&key);
        out.write(&linked_list(&self.0, hits))?;
        Ok(())
    }
}
