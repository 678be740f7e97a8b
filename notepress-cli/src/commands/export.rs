//! Export command implementation.

use crate::{ExportArgs, PathArgs};
use anyhow::{Context, Result};
use notepress_core::{Config, Exporter};
use std::path::Path;

/// Load the config file (or defaults) and apply command-line path overrides
pub fn load_config(config_path: &Path, paths: &PathArgs) -> Result<Config> {
    tracing::debug!("Loading config from {:?}", config_path);
    let mut config =
        Config::load_or_default(config_path).context("Failed to load configuration")?;

    if let Some(source) = &paths.source {
        config.set_source_dir(source.clone());
    }
    if let Some(output) = &paths.output {
        config.set_output_dir(output.clone());
    }
    Ok(config)
}

/// Export published notes into the output directory
pub fn export_site(config_path: &Path, args: &ExportArgs) -> Result<()> {
    let mut config = load_config(config_path, &args.paths)?;
    if args.no_clean {
        config.clean_output = false;
    }

    let output_dir = config.output_dir();
    let report = Exporter::new(config)
        .run()
        .context("Failed to export site content")?;

    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.rel_path.display(), skipped.reason);
    }
    println!(
        "✓ Published {} of {} notes to {:?}",
        report.published, report.scanned, output_dir
    );
    Ok(())
}
