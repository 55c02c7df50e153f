//! Site structure index used to resolve internal links.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Failed to read structure file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse structure file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One navigation entry of the structure file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StructureEntry {
    #[serde(default)]
    pub text: Option<String>,

    /// Site-relative URL the final renderer serves this page at
    #[serde(default)]
    pub url: Option<String>,

    /// Path of the artifact or source backing this entry
    #[serde(default, rename = "filePath")]
    pub file_path: Option<String>,

    #[serde(default)]
    pub items: Vec<StructureEntry>,
}

/// Read-only lookup over the structure file, keyed by normalized path
#[derive(Debug, Clone, Default)]
pub struct SiteStructureIndex {
    by_path: HashMap<String, String>,
}

impl SiteStructureIndex {
    /// Build an index whose `filePath` keys are normalized relative to the
    /// asset directory (`prefixes` are stripped when present).
    pub fn new(entries: Vec<StructureEntry>, prefixes: &[&str]) -> Self {
        let mut by_path = HashMap::new();
        let mut stack: Vec<&StructureEntry> = entries.iter().rev().collect();

        // Depth-first in document order; the first entry for a path wins
        while let Some(entry) = stack.pop() {
            if let (Some(file_path), Some(url)) = (&entry.file_path, &entry.url) {
                let key = entry_key(file_path, prefixes);
                if !key.is_empty() {
                    by_path.entry(key).or_insert_with(|| url.clone());
                }
            }
            stack.extend(entry.items.iter().rev());
        }

        Self { by_path }
    }

    /// Parse the JSON contents of a structure file
    pub fn from_json(json: &str, source: &str, prefixes: &[&str]) -> Result<Self, StructureError> {
        let entries: Vec<StructureEntry> =
            serde_json::from_str(json).map_err(|source_err| StructureError::Parse {
                path: source.to_string(),
                source: source_err,
            })?;
        Ok(Self::new(entries, prefixes))
    }

    /// Load and parse a structure file
    pub async fn load(path: &Path, prefixes: &[&str]) -> Result<Self, StructureError> {
        let display = path.display().to_string();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StructureError::Read {
                path: display.clone(),
                source,
            })?;
        Self::from_json(&json, &display, prefixes)
    }

    /// Number of entries addressable by path
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// URL registered for a normalized path such as `guide/install`
    pub fn url_for(&self, key: &str) -> Option<&str> {
        self.by_path.get(key).map(String::as_str)
    }
}

fn entry_key(file_path: &str, prefixes: &[&str]) -> String {
    let mut path = file_path.trim_start_matches('/');
    for prefix in prefixes {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() || prefix == "." {
            continue;
        }
        if let Some(rest) = path.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix('/') {
                path = rest;
            }
        }
    }
    normalize_path(path).unwrap_or_default()
}

/// Collapse `.`/`..` segments and drop the file extension.
///
/// Returns `None` when the path climbs above its root.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if let Some(last) = parts.last_mut() {
        if let Some(stem) = Path::new(last.as_str()).file_stem() {
            *last = stem.to_string_lossy().into_owned();
        }
    }

    Some(parts.join("/"))
}
