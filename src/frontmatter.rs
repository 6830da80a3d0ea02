//! Markdown front matter extraction.
//!
//! Legacy content files are markdown documents with a leading YAML block
//! delimited by `---` lines. The block is parsed into a JSON-shaped mapping;
//! a document without one (or with an unparseable one) still loads, it just
//! carries an empty mapping.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::error;

/// A markdown document split into its front matter mapping and body.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownDocument {
    /// Parsed front matter; empty when the block is missing or malformed.
    pub data: Map<String, Value>,

    /// Document body with the front matter block stripped.
    pub content: String,
}

// Front matter block pattern (cached for performance)
static FRONT_MATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn front_matter_pattern() -> &'static Regex {
    FRONT_MATTER_REGEX
        .get_or_init(|| Regex::new(r"^---\s*[\r\n]+([\s\S]*?)[\r\n]+---\s*[\r\n]*").unwrap())
}

/// Split a raw markdown document into front matter and body.
///
/// The block must sit at the very start of the document. YAML that fails to
/// parse, or parses to something other than a mapping, yields an empty
/// mapping; the body is still returned with the block stripped.
pub fn parse_front_matter(raw: &str) -> MarkdownDocument {
    let Some(captures) = front_matter_pattern().captures(raw) else {
        return MarkdownDocument {
            data: Map::new(),
            content: raw.to_string(),
        };
    };

    let block = captures.get(1).map_or("", |group| group.as_str());
    let data = match serde_yaml::from_str::<Value>(block) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(parse_error) => {
            error!("Failed to parse front matter: {}", parse_error);
            Map::new()
        }
    };

    let body_start = captures.get(0).map_or(0, |whole| whole.end());
    MarkdownDocument {
        data,
        content: raw[body_start..].to_string(),
    }
}
