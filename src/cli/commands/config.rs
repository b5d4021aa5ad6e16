//! Init and Config commands.

use std::path::Path;

use anyhow::Context;
use console::style;

use crate::config::{LOCAL_CONFIG_FILE, Settings};

/// Print the effective configuration as TOML.
pub fn run_config(settings: &Settings) -> anyhow::Result<()> {
    println!("{}", style("Current Configuration:").cyan().bold());
    println!("{}", "=".repeat(50));
    println!("{}", settings.to_toml()?);
    Ok(())
}

/// Write default settings to `.adoc-live.toml` in `dir`.
pub fn run_init(dir: &Path, force: bool) -> anyhow::Result<()> {
    let path = dir.join(LOCAL_CONFIG_FILE);
    anyhow::ensure!(
        force || !path.exists(),
        "configuration file already exists at {} (use --force to overwrite)",
        path.display()
    );

    Settings::default()
        .save(&path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(())
}
