//! Identifier munging
//!
//! Free text becomes a lowercase snake_case slug, safe as both a store
//! key and a URL path segment. Normalization is idempotent and total;
//! the empty string passes through and callers reject it as invalid.

use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Normalized page name, used as the store key and URL segment.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentifier(String);

impl PageIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PageIdentifier> for String {
    fn from(id: PageIdentifier) -> String {
        id.0
    }
}

/// Munge free text into a `PageIdentifier`.
///
/// NFC-normalizes, tokenizes on runs of whitespace and punctuation,
/// lowercases, and joins with `_`. `normalize(normalize(x)) ==
/// normalize(x)` for every `x`.
pub fn normalize(text: &str) -> PageIdentifier {
    // Lowercasing can denormalize (e.g. U+0130), so recompose after it.
    let folded: String = text.nfc().collect::<String>().to_lowercase().nfc().collect();
    let tokens: Vec<&str> = folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    PageIdentifier(tokens.join("_"))
}

/// Human-facing title from an identifier: split on `_`, uppercase the
/// first letter of each word, join with spaces.
pub fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
