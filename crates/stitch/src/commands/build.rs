//! Site build command.

use std::path::Path;

use anyhow::Result;
use stitch_site::SiteBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, replace_all: bool) -> Result<()> {
    tracing::info!("Building site...");

    let config = load_config(config_path)?.build_config(replace_all);
    let result = SiteBuilder::new(config).build()?;

    tracing::info!(
        "Built {} pages with {} components in {}ms",
        result.pages,
        result.components,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
