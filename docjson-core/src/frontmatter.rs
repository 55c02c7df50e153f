//! Front matter splitting for markdown sources.

use crate::models::{Attributes, ParsedDocument};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|$)(.*)$").unwrap()
    })
}

/// Split raw markdown into front matter attributes and body
///
/// If no front matter block is present the attributes are empty and the
/// body is the full text.
///
/// # Example
///
/// ```
/// use docjson_core::frontmatter::split_frontmatter;
///
/// let content = "---\ntitle: Installing\n---\n# Install\n";
///
/// let doc = split_frontmatter(content).unwrap();
/// assert_eq!(doc.attributes["title"], "Installing");
/// assert_eq!(doc.body, "# Install\n");
/// ```
pub fn split_frontmatter(content: &str) -> Result<ParsedDocument, FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok(ParsedDocument {
            attributes: Attributes::new(),
            body: content.to_string(),
        });
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    if yaml.trim().is_empty() {
        return Ok(ParsedDocument {
            attributes: Attributes::new(),
            body: body.to_string(),
        });
    }

    let attributes = match serde_yaml::from_str::<serde_json::Value>(yaml)? {
        serde_json::Value::Object(map) => map,
        // A block holding only comments parses as null
        serde_json::Value::Null => Attributes::new(),
        serde_json::Value::Array(_) => return Err(FrontmatterError::NotAMapping("a sequence")),
        _ => return Err(FrontmatterError::NotAMapping("a scalar")),
    };

    Ok(ParsedDocument {
        attributes,
        body: body.to_string(),
    })
}
