//! Content model structs for parsed documents and emitted artifacts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key/value attributes from front matter, in declaration order
pub type Attributes = Map<String, Value>;

/// Attribute derived from commit history: most recent authored date
pub const LAST_UPDATED_KEY: &str = "lastUpdated";

/// Attribute derived from commit history (merged with declared values)
pub const CONTRIBUTORS_KEY: &str = "contributors";

/// A markdown source split into front matter and body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedDocument {
    pub attributes: Attributes,
    pub body: String,
}

/// One entry of a document outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    /// Heading level, 1 through 6
    pub level: u8,
    /// Plain text of the heading
    pub text: String,
    /// Anchor id, unique within the document
    pub id: String,
}

/// The serialized output for one source file
#[derive(Debug, Clone, PartialEq)]
pub struct ContentArtifact {
    pub attributes: Attributes,
    pub headings: Vec<HeadingEntry>,
    pub src_path: String,
    pub content: String,
}

impl ContentArtifact {
    /// Flatten into a single JSON object.
    ///
    /// Attributes come first; `headings`, `srcPath` and `content` follow and
    /// replace attributes of the same name.
    pub fn into_json(self) -> Value {
        let mut object = self.attributes;
        object.insert(
            "headings".to_string(),
            serde_json::to_value(&self.headings).unwrap_or(Value::Array(Vec::new())),
        );
        object.insert("srcPath".to_string(), Value::String(self.src_path));
        object.insert("content".to_string(), Value::String(self.content));
        Value::Object(object)
    }

    /// Serialize to the bytes written on disk
    pub fn to_bytes(self, pretty: bool) -> serde_json::Result<Vec<u8>> {
        let value = self.into_json();
        if pretty {
            serde_json::to_vec_pretty(&value)
        } else {
            serde_json::to_vec(&value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(attributes: Attributes) -> ContentArtifact {
        ContentArtifact {
            attributes,
            headings: vec![HeadingEntry {
                level: 1,
                text: "Intro".to_string(),
                id: "intro".to_string(),
            }],
            src_path: "docs/intro.md".to_string(),
            content: "<h1 id=\"intro\">Intro</h1>\n".to_string(),
        }
    }

    #[test]
    fn test_artifact_without_attributes_has_three_keys() {
        let value = artifact(Attributes::new()).into_json();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["headings", "srcPath", "content"]);
        assert_eq!(
            value["headings"],
            json!([{ "level": 1, "text": "Intro", "id": "intro" }])
        );
    }

    #[test]
    fn test_generated_fields_win_over_attributes() {
        let mut attributes = Attributes::new();
        attributes.insert("title".to_string(), json!("Intro"));
        attributes.insert("content".to_string(), json!("authored"));

        let value = artifact(attributes).into_json();
        assert_eq!(value["title"], "Intro");
        assert_eq!(value["content"], "<h1 id=\"intro\">Intro</h1>\n");
    }

    #[test]
    fn test_compact_serialization() {
        let bytes = artifact(Attributes::new()).to_bytes(false).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\"headings\":[{\"level\":1"));
        assert!(!text.contains('\n'));
    }
}
