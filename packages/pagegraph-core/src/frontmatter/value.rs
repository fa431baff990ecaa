//! Dynamic frontmatter tree
//!
//! Tagged-variant representation of the TOML primitive union. Mapping
//! order is insignificant (BTreeMap); sequence order is significant.
//! Path traversal over this type is exhaustive pattern matching, which
//! keeps the mutator's error table honest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::RESERVED_IDENTIFIER;
use crate::errors::{CoreError, Result};
use crate::ident::PageIdentifier;

/// One node of a frontmatter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// TOML datetime, carried as its ISO-8601 string form.
    Datetime(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Mapping(BTreeMap::new())
    }
}

impl Value {
    /// Empty mapping, the identity element for merge.
    pub fn empty_mapping() -> Self {
        Value::Mapping(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for the empty mapping; used to decide whether a page file
    /// gets a frontmatter block at all.
    pub fn is_empty_mapping(&self) -> bool {
        matches!(self, Value::Mapping(m) if m.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Datetime(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Descend along dotted-path components, read-only.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut node = self;
        for key in path {
            node = node.as_mapping()?.get(*key)?;
        }
        Some(node)
    }

    /// Descend along a dotted key like `inventory.container`.
    pub fn get_dotted(&self, dotted: &str) -> Option<&Value> {
        let parts: Vec<&str> = dotted.split('.').collect();
        self.get_path(&parts)
    }

    /// Display-string rendering of a scalar; `None` for aggregates.
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Value::String(s) | Value::Datetime(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Null => None,
            Value::Sequence(_) | Value::Mapping(_) => None,
        }
    }

    /// Tolerant extraction of a sequence's string-ish members.
    ///
    /// Container item lists in the wild hold plain strings, but older
    /// pages carry numbers or mixed shapes; scalars are rendered via
    /// their display form and aggregate elements are skipped.
    pub fn string_items(&self) -> Vec<String> {
        match self {
            Value::Sequence(items) => items.iter().filter_map(|v| v.scalar_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Reject a value whose root mapping carries the reserved key.
    /// Nested `identifier` keys are unreserved and pass through.
    pub fn check_no_root_identifier(&self) -> Result<()> {
        if let Value::Mapping(m) = self {
            if m.contains_key(RESERVED_IDENTIFIER) {
                return Err(CoreError::invalid_argument(
                    "identifier key cannot be modified",
                ));
            }
        }
        Ok(())
    }

    /// Remove the root `identifier` key, if any. Wire-bound values are
    /// always stripped.
    pub fn strip_root_identifier(mut self) -> Value {
        if let Value::Mapping(ref mut m) = self {
            m.remove(RESERVED_IDENTIFIER);
        }
        self
    }

    /// Force the root `identifier` key to the page's normalized name.
    /// Stored values always carry it. Non-mapping roots are replaced by
    /// a mapping holding just the identifier.
    pub fn force_root_identifier(self, page: &PageIdentifier) -> Value {
        let mut m = match self {
            Value::Mapping(m) => m,
            _ => BTreeMap::new(),
        };
        m.insert(
            RESERVED_IDENTIFIER.to_string(),
            Value::String(page.as_str().to_string()),
        );
        Value::Mapping(m)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Value::Mapping(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::normalize;
    use pretty_assertions::assert_eq;

    fn mapping(pairs: &[(&str, Value)]) -> Value {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn root_identifier_is_reserved() {
        let fm = mapping(&[("identifier", "x".into()), ("title", "T".into())]);
        assert!(fm.check_no_root_identifier().is_err());
    }

    #[test]
    fn nested_identifier_is_unreserved() {
        let inner = mapping(&[("identifier", "x".into())]);
        let fm = mapping(&[("part", inner)]);
        assert!(fm.check_no_root_identifier().is_ok());
    }

    #[test]
    fn force_then_strip_roundtrip() {
        let page = normalize("Some Page");
        let fm = mapping(&[("title", "T".into())]);
        let stored = fm.force_root_identifier(&page);
        assert_eq!(
            stored.get_dotted("identifier").and_then(Value::as_str),
            Some("some_page")
        );
        let returned = stored.strip_root_identifier();
        assert_eq!(returned.get_dotted("identifier"), None);
        assert_eq!(returned.get_dotted("title").and_then(Value::as_str), Some("T"));
    }

    #[test]
    fn string_items_tolerates_heterogeneous_sequences() {
        let seq = Value::Sequence(vec![
            "widget".into(),
            Value::Integer(7),
            Value::Mapping(BTreeMap::new()),
            Value::Bool(true),
        ]);
        assert_eq!(seq.string_items(), vec!["widget", "7", "true"]);
    }

    #[test]
    fn dotted_descent() {
        let fm = mapping(&[(
            "inventory",
            mapping(&[("container", "garage".into())]),
        )]);
        assert_eq!(
            fm.get_dotted("inventory.container").and_then(Value::as_str),
            Some("garage")
        );
        assert_eq!(fm.get_dotted("inventory.items"), None);
    }
}
