//! Content building - orchestrates discovery, parsing, rendering, and output.

use crate::{
    attribution::{AttributionEnricher, HistoryError},
    config::{Config, FailurePolicy, SiteConfig},
    frontmatter::{split_frontmatter, FrontmatterError},
    markdown::{LinkLocalizer, MarkdownRenderer},
    models::ContentArtifact,
    store::{AssetStore, FsAssetStore},
    structure::{SiteStructureIndex, StructureError},
};
use futures::future::{join_all, try_join_all};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Source directory not found: {0}")]
    MissingSource(PathBuf),

    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("Front matter error in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },

    #[error("Failed to serialize artifact for {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Attribution setup failed: {0}")]
    Attribution(#[from] HistoryError),

    #[error("{} of {total} files in {} failed to convert", .failures.len(), .source_dir.display())]
    Batch {
        source_dir: PathBuf,
        total: usize,
        failures: Vec<FileFailure>,
    },
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A file that could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// One source file scheduled for conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    /// Where the markdown is read from
    pub source_path: PathBuf,
    /// Source path as recorded in the artifact (`srcPath`)
    pub src_path: String,
    /// Artifact path relative to the asset directory
    pub artifact_rel: PathBuf,
    /// Where the artifact is written
    pub dest_path: PathBuf,
}

/// Everything needed to convert one configured site
#[derive(Debug)]
pub struct SitePlan {
    pub source_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub structure: SiteStructureIndex,
    pub jobs: Vec<FileJob>,
}

/// Result of converting one configured site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    pub source_dir: PathBuf,
    pub assets_dir: PathBuf,
    /// Artifacts written, in discovery order
    pub written: Vec<PathBuf>,
}

impl SiteReport {
    pub fn count(&self) -> usize {
        self.written.len()
    }
}

/// Main content builder
pub struct ContentBuilder {
    config: Config,
    renderer: MarkdownRenderer,
    enricher: AttributionEnricher,
    store: Arc<dyn AssetStore>,
}

impl ContentBuilder {
    pub fn new(config: Config) -> Result<Self, BuildError> {
        let enricher = AttributionEnricher::from_config(&config.attribution)?;
        Ok(Self {
            renderer: MarkdownRenderer::new(config.code_blocks.style),
            enricher,
            store: Arc::new(FsAssetStore),
            config,
        })
    }

    /// Replace the commit history enricher
    pub fn with_enricher(mut self, enricher: AttributionEnricher) -> Self {
        self.enricher = enricher;
        self
    }

    /// Replace the output store
    pub fn with_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert every configured site, one after another
    pub async fn build(&self) -> Result<Vec<SiteReport>, BuildError> {
        let mut reports = Vec::with_capacity(self.config.sites.len());
        for site in &self.config.sites {
            reports.push(self.build_site(site).await?);
        }
        Ok(reports)
    }

    /// Load the structure file and list the files a site would produce.
    /// Nothing is written.
    pub async fn plan_site(&self, site: &SiteConfig) -> Result<SitePlan, BuildError> {
        let structure_path = self.config.structure_file(site);
        let prefixes = [
            self.config.output_root.to_string_lossy().into_owned(),
            site.assets.to_string_lossy().into_owned(),
        ];
        let prefixes: Vec<&str> = prefixes.iter().map(String::as_str).collect();
        let structure = SiteStructureIndex::load(&structure_path, &prefixes).await?;
        tracing::debug!(
            "Loaded {} structure entries from {}",
            structure.len(),
            structure_path.display()
        );

        let source_dir = self.config.source_dir(site);
        if !source_dir.is_dir() {
            return Err(BuildError::MissingSource(source_dir));
        }

        let assets_dir = self.config.assets_dir(site);
        let jobs = self
            .discover_markdown_files(&source_dir)
            .into_iter()
            .map(|rel| {
                let artifact_rel = rel.with_extension("json");
                FileJob {
                    source_path: source_dir.join(&rel),
                    src_path: slash_path(&site.source.join(&rel)),
                    dest_path: assets_dir.join(&artifact_rel),
                    artifact_rel,
                }
            })
            .collect();

        Ok(SitePlan {
            source_dir,
            assets_dir,
            structure,
            jobs,
        })
    }

    /// Convert one site: clear its asset directory, then convert every
    /// source file concurrently.
    pub async fn build_site(&self, site: &SiteConfig) -> Result<SiteReport, BuildError> {
        let plan = self.plan_site(site).await?;
        tracing::info!(
            "Converting {} files from {}",
            plan.jobs.len(),
            plan.source_dir.display()
        );

        self.store
            .clear(&plan.assets_dir)
            .await
            .map_err(|e| BuildError::io(&plan.assets_dir, e))?;

        let structure = &plan.structure;
        let tasks = plan.jobs.iter().map(|job| async move {
            self.convert_file(job, structure).await.map_err(|e| {
                tracing::error!("Failed to convert {}: {}", job.source_path.display(), e);
                (job, e)
            })
        });

        let written = match self.config.failure_policy {
            FailurePolicy::FailFast => try_join_all(tasks).await.map_err(|(_, e)| e)?,
            FailurePolicy::Collect => {
                let mut written = Vec::new();
                let mut failures = Vec::new();
                for result in join_all(tasks).await {
                    match result {
                        Ok(path) => written.push(path),
                        Err((job, e)) => failures.push(FileFailure {
                            path: job.source_path.clone(),
                            message: e.to_string(),
                        }),
                    }
                }
                if !failures.is_empty() {
                    return Err(BuildError::Batch {
                        source_dir: plan.source_dir,
                        total: plan.jobs.len(),
                        failures,
                    });
                }
                written
            }
        };

        tracing::info!(
            "Successfully converted {} files into {}",
            written.len(),
            plan.assets_dir.display()
        );

        Ok(SiteReport {
            source_dir: plan.source_dir,
            assets_dir: plan.assets_dir,
            written,
        })
    }

    /// Convert a single file and write its artifact
    async fn convert_file(
        &self,
        job: &FileJob,
        structure: &SiteStructureIndex,
    ) -> Result<PathBuf, BuildError> {
        tracing::debug!("Converting {}", job.src_path);

        let markdown = tokio::fs::read_to_string(&job.source_path)
            .await
            .map_err(|e| BuildError::io(&job.source_path, e))?;

        let parsed = split_frontmatter(&markdown).map_err(|source| BuildError::Frontmatter {
            path: job.source_path.clone(),
            source,
        })?;
        let parsed = self.enricher.enrich(&job.src_path, parsed).await;

        let mut headings = Vec::new();
        let localizer = LinkLocalizer::new(structure, &job.artifact_rel);
        let content = self
            .renderer
            .render(&parsed.body, &mut headings, Some(&localizer));

        let artifact = ContentArtifact {
            attributes: parsed.attributes,
            headings,
            src_path: job.src_path.clone(),
            content,
        };
        let bytes = artifact
            .to_bytes(self.config.pretty)
            .map_err(|source| BuildError::Serialize {
                path: job.source_path.clone(),
                source,
            })?;

        if let Some(parent) = job.dest_path.parent() {
            self.store
                .ensure_dir(parent)
                .await
                .map_err(|e| BuildError::io(parent, e))?;
        }
        self.store
            .write(&job.dest_path, bytes)
            .await
            .map_err(|e| BuildError::io(&job.dest_path, e))?;

        Ok(job.dest_path.clone())
    }

    /// Discover markdown files under `source_dir`, relative to it, sorted
    fn discover_markdown_files(&self, source_dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(source_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if entry.path().extension().is_some_and(|ext| ext == "md") {
                let rel = entry
                    .path()
                    .strip_prefix(source_dir)
                    .unwrap_or(entry.path())
                    .to_path_buf();

                if self.is_excluded(&rel) {
                    tracing::debug!("Skipping excluded file {}", rel.display());
                    continue;
                }

                files.push(rel);
            }
        }

        files
    }

    fn is_excluded(&self, rel: &Path) -> bool {
        let rel = slash_path(rel);
        self.config
            .exclude
            .iter()
            .any(|pattern| pattern.trim_start_matches("./") == rel)
    }
}

/// Render a path with forward slashes regardless of platform
fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
