//! Check command: dry run that lists planned artifacts.

use anyhow::{Context, Result};
use docjson_core::{Config, ContentBuilder};
use std::path::Path;

/// Plan every site and print `srcPath -> artifact` pairs to stdout
pub async fn check_sites(config_path: &Path) -> Result<()> {
    let mut config = Config::from_file(config_path).context("Failed to load configuration")?;
    // Planning never consults commit history
    config.attribution.enabled = false;

    let builder = ContentBuilder::new(config).context("Failed to set up content builder")?;

    let mut total = 0;
    for site in &builder.config().sites {
        let plan = builder
            .plan_site(site)
            .await
            .with_context(|| format!("Failed to plan site {}", site.source.display()))?;

        println!(
            "{} ({} files, {} structure entries)",
            site.source.display(),
            plan.jobs.len(),
            plan.structure.len()
        );
        for job in &plan.jobs {
            println!("  {} -> {}", job.src_path, job.dest_path.display());
        }
        total += plan.jobs.len();
    }

    tracing::info!("{} files would be converted", total);
    Ok(())
}
