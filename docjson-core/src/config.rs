//! Configuration parsing and management.

use crate::markdown::CodeBlockStyle;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsafe asset directory {assets}: {reason}")]
    UnsafeAssets { assets: PathBuf, reason: &'static str },
}

/// Main configuration struct matching the docjson.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source/structure/assets triples, converted in this order
    pub sites: Vec<SiteConfig>,

    /// Directory every `assets` path lives under
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Index files to skip, relative to each source root
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Pretty-print artifacts instead of writing compact JSON
    #[serde(default)]
    pub pretty: bool,

    #[serde(default)]
    pub code_blocks: CodeBlocksConfig,

    #[serde(default)]
    pub attribution: AttributionConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_output_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["README.md".to_string()]
}

fn default_true() -> bool {
    true
}

/// One source directory and where its artifacts go
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteConfig {
    /// Directory of markdown sources
    pub source: PathBuf,
    /// JSON structure file used for link resolution
    pub structure: PathBuf,
    /// Asset directory, relative to `output_root`
    pub assets: PathBuf,
}

/// What happens to a batch when one file fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the batch at the first failing file
    #[default]
    FailFast,
    /// Attempt every file, then report all failures together
    Collect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeBlocksConfig {
    #[serde(default)]
    pub style: CodeBlockStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository as `owner/name`
    #[serde(default)]
    pub repo: Option<String>,

    /// Commits before this instant are ignored
    #[serde(default = "default_since")]
    pub since: DateTime<Utc>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Prepended to each source path when querying history
    #[serde(default)]
    pub path_prefix: String,

    /// Access token; never read from the config file
    #[serde(skip)]
    pub token: Option<String>,
}

fn default_api_base() -> String {
    String::from("https://api.github.com")
}

fn default_since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 6, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_api_base(),
            repo: None,
            since: default_since(),
            timeout_secs: default_timeout_secs(),
            path_prefix: String::new(),
            token: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());
        config.validate_layout()?;

        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::MissingField("sites".to_string()));
        }
        if self.attribution.enabled && self.attribution.repo.is_none() {
            return Err(ConfigError::MissingField("attribution.repo".to_string()));
        }
        self.validate_layout()
    }

    /// Reject asset directories that overlap inputs; they are cleared
    /// before every build.
    fn validate_layout(&self) -> Result<(), ConfigError> {
        let root = lexical(&self.root_dir());
        let sites: Vec<(PathBuf, PathBuf)> = self
            .sites
            .iter()
            .map(|site| {
                (
                    lexical(&self.source_dir(site)),
                    lexical(&self.structure_file(site)),
                )
            })
            .collect();

        for site in &self.sites {
            let assets = lexical(&self.assets_dir(site));
            let unsafe_assets = |reason| ConfigError::UnsafeAssets {
                assets: assets.clone(),
                reason,
            };

            if root.starts_with(&assets) {
                return Err(unsafe_assets("contains the config directory"));
            }
            for (source, structure) in &sites {
                if source.starts_with(&assets) {
                    return Err(unsafe_assets("contains a source directory"));
                }
                if assets.starts_with(source) {
                    return Err(unsafe_assets("is inside a source directory"));
                }
                if structure.starts_with(&assets) {
                    return Err(unsafe_assets("contains a structure file"));
                }
            }
        }
        Ok(())
    }

    /// Directory the config file lives in (paths are relative to it)
    pub fn root_dir(&self) -> PathBuf {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Source directory of `site`, resolved relative to config file
    pub fn source_dir(&self, site: &SiteConfig) -> PathBuf {
        self.resolve_path(&site.source)
    }

    /// Structure file of `site`, resolved relative to config file
    pub fn structure_file(&self, site: &SiteConfig) -> PathBuf {
        self.resolve_path(&site.structure)
    }

    /// Asset directory of `site` under the output root
    pub fn assets_dir(&self, site: &SiteConfig) -> PathBuf {
        self.resolve_path(&self.output_root.join(&site.assets))
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}

/// Collapse `.` and `..` without touching the filesystem
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
