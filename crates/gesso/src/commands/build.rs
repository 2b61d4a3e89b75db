//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use gesso_static::{SiteConfig, StaticBuilder};

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let mut config = SiteConfig::load(config_path)?;
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let builder = StaticBuilder::new(config)?;
    let result = builder.build().await?;

    tracing::info!(
        "Built {} pages and {} assets in {}ms -> {}",
        result.pages,
        result.assets,
        result.duration_ms,
        result.output_dir.display()
    );

    Ok(())
}
