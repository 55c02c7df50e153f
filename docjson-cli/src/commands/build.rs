//! Build command implementation.

use anyhow::{bail, Context, Result};
use docjson_core::{BuildError, Config, ContentBuilder, FailurePolicy};
use std::path::Path;

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
pub struct BuildOptions {
    pub github_token: Option<String>,
    pub no_attribution: bool,
    pub failure_policy: Option<FailurePolicy>,
}

/// Load the config, apply overrides, and convert every site
pub async fn build_sites(config_path: &Path, opts: BuildOptions) -> Result<()> {
    tracing::info!("Loading config from {:?}", config_path);
    let mut config = Config::from_file(config_path).context("Failed to load configuration")?;
    apply_overrides(&mut config, opts);

    let builder = ContentBuilder::new(config).context("Failed to set up content builder")?;

    let reports = match builder.build().await {
        Ok(reports) => reports,
        Err(BuildError::Batch {
            source_dir,
            total,
            failures,
        }) => {
            for failure in &failures {
                tracing::error!("{}", failure);
            }
            bail!(
                "{} of {} files in {} failed to convert",
                failures.len(),
                total,
                source_dir.display()
            );
        }
        Err(err) => return Err(err).context("Build failed"),
    };

    let total: usize = reports.iter().map(|r| r.count()).sum();
    for report in &reports {
        tracing::info!(
            "✓ {} -> {} ({} files)",
            report.source_dir.display(),
            report.assets_dir.display(),
            report.count()
        );
    }
    tracing::info!("✓ Wrote {} artifacts across {} sites", total, reports.len());

    Ok(())
}

fn apply_overrides(config: &mut Config, opts: BuildOptions) {
    if let Some(token) = opts.github_token.filter(|t| !t.is_empty()) {
        config.attribution.token = Some(token);
    }

    if opts.no_attribution {
        tracing::info!("Commit history disabled; skipping attribution");
        config.attribution.enabled = false;
    }

    if let Some(policy) = opts.failure_policy {
        config.failure_policy = policy;
    }
}
