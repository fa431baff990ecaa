//! TOML codec and page framing
//!
//! Pages at rest are `+++\n<TOML frontmatter>\n+++\n<markdown body>`;
//! the frontmatter block is omitted entirely when the mapping is empty.
//! TOML has no null, so null values are dropped from mappings and
//! rendered as empty strings inside sequences.

use std::collections::BTreeMap;

use super::value::Value;
use crate::errors::{CoreError, Result};

const FRAME: &str = "+++";

/// Serialize a frontmatter tree to a TOML document.
pub fn to_toml_string(value: &Value) -> Result<String> {
    let toml_value = to_toml_value(value)?;
    if !matches!(toml_value, toml::Value::Table(_)) {
        return Err(CoreError::serialization("frontmatter root must be a mapping"));
    }
    toml::to_string(&toml_value).map_err(CoreError::serialization)
}

/// Parse a TOML document into a frontmatter tree.
pub fn parse_toml(text: &str) -> Result<Value> {
    let parsed: toml::Value = toml::from_str(text).map_err(CoreError::serialization)?;
    Ok(from_toml_value(parsed))
}

fn to_toml_value(value: &Value) -> Result<toml::Value> {
    Ok(match value {
        Value::Null => toml::Value::String(String::new()),
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Integer(i) => toml::Value::Integer(*i),
        Value::Float(f) => toml::Value::Float(*f),
        Value::String(s) => toml::Value::String(s.clone()),
        Value::Datetime(s) => match s.parse::<toml::value::Datetime>() {
            Ok(dt) => toml::Value::Datetime(dt),
            Err(_) => toml::Value::String(s.clone()),
        },
        Value::Sequence(items) => {
            let converted: Result<Vec<toml::Value>> = items.iter().map(to_toml_value).collect();
            toml::Value::Array(converted?)
        }
        Value::Mapping(m) => {
            let mut table = toml::map::Map::new();
            for (k, v) in m {
                if v.is_null() {
                    continue;
                }
                table.insert(k.clone(), to_toml_value(v)?);
            }
            toml::Value::Table(table)
        }
    })
}

fn from_toml_value(value: toml::Value) -> Value {
    match value {
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::String(s) => Value::String(s),
        toml::Value::Datetime(dt) => Value::Datetime(dt.to_string()),
        toml::Value::Array(items) => {
            Value::Sequence(items.into_iter().map(from_toml_value).collect())
        }
        toml::Value::Table(table) => Value::Mapping(
            table
                .into_iter()
                .map(|(k, v)| (k, from_toml_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Compose the on-disk / rendering-time page text.
pub fn compose_page(frontmatter: &Value, markdown: &str) -> Result<String> {
    if frontmatter.is_empty_mapping() || frontmatter.is_null() {
        return Ok(markdown.to_string());
    }
    let toml_text = to_toml_string(frontmatter)?;
    Ok(format!(
        "{frame}\n{toml}{frame}\n{markdown}",
        frame = FRAME,
        toml = ensure_trailing_newline(toml_text),
        markdown = markdown,
    ))
}

/// Split page text into its frontmatter block (if any) and markdown
/// body. A page without a leading `+++` frame, or with an unterminated
/// one, is all body.
pub fn split_page(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix("+++\n").or_else(|| text.strip_prefix("+++\r\n")) else {
        return (None, text);
    };
    for (idx, _) in rest.match_indices(FRAME) {
        let at_line_start = idx == 0 || rest.as_bytes()[idx - 1] == b'\n';
        let tail = &rest[idx + FRAME.len()..];
        let after = tail.strip_prefix('\n').or_else(|| tail.strip_prefix("\r\n"));
        if at_line_start {
            if let Some(body) = after {
                return (Some(&rest[..idx]), body);
            }
            if tail.is_empty() {
                return (Some(&rest[..idx]), "");
            }
        }
    }
    (None, text)
}

fn ensure_trailing_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Value {
        [
            ("identifier".to_string(), Value::from("garage")),
            ("title".to_string(), Value::from("Garage")),
            (
                "inventory".to_string(),
                [(
                    "items".to_string(),
                    Value::Sequence(vec!["rake".into(), "ladder".into()]),
                )]
                .into_iter()
                .collect(),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn toml_roundtrip_preserves_structure() {
        let fm = sample();
        let text = to_toml_string(&fm).unwrap();
        let back = parse_toml(&text).unwrap();
        assert_eq!(back, fm);
    }

    #[test]
    fn compose_frames_nonempty_frontmatter() {
        let text = compose_page(&sample(), "# Garage\n").unwrap();
        assert!(text.starts_with("+++\n"));
        assert!(text.contains("\n+++\n# Garage\n"));
    }

    #[test]
    fn compose_skips_empty_frontmatter() {
        let text = compose_page(&Value::empty_mapping(), "body only\n").unwrap();
        assert_eq!(text, "body only\n");
    }

    #[test]
    fn split_roundtrip() {
        let composed = compose_page(&sample(), "# Garage\n").unwrap();
        let (fm, body) = split_page(&composed);
        assert_eq!(body, "# Garage\n");
        let parsed = parse_toml(fm.unwrap()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn split_without_frontmatter_is_all_body() {
        let (fm, body) = split_page("plain markdown");
        assert!(fm.is_none());
        assert_eq!(body, "plain markdown");
    }

    #[test]
    fn split_unterminated_frame_is_all_body() {
        let (fm, body) = split_page("+++\ntitle = \"t\"\nno closing frame");
        assert!(fm.is_none());
        assert_eq!(body, "+++\ntitle = \"t\"\nno closing frame");
    }

    #[test]
    fn null_values_are_omitted_from_mappings() {
        let fm: Value = [
            ("keep".to_string(), Value::from("x")),
            ("drop".to_string(), Value::Null),
        ]
        .into_iter()
        .collect();
        let text = to_toml_string(&fm).unwrap();
        assert!(text.contains("keep"));
        assert!(!text.contains("drop"));
    }
}
