//! Init command implementation.

use anyhow::{Context, Result};
use notepress_core::Config;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../notepress.yml.example");

/// Write a starter notepress.yml into `path`
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let config_path = root.join("notepress.yml");
    if config_path.exists() {
        println!("notepress.yml already exists at {:?}", config_path);
        return Ok(());
    }

    // The template must stay loadable
    Config::from_yaml(DEFAULT_CONFIG).context("Built-in config template is invalid")?;

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;

    println!("✓ notepress initialized in {:?}", root);
    println!("  - Edit notepress.yml to point at your notes");
    println!("  - Tag notes with `publish` and run `notepress`");
    Ok(())
}
