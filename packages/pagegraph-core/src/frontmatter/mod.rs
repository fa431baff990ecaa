//! Frontmatter: structured page metadata
//!
//! A page's metadata is a dynamic tree ([`value::Value`]) serialized as
//! TOML at rest and at the transport boundary ([`codec`]), mutated
//! through merge / replace / remove-at-path operations with reserved-key
//! enforcement ([`mutator`]).

pub mod codec;
pub mod mutator;
pub mod value;

/// The one reserved key, at the mapping root only. Its stored value
/// always equals the page's normalized identifier; it is stripped from
/// every value returned to callers.
pub const RESERVED_IDENTIFIER: &str = "identifier";
