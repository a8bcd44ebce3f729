//! Settings file locations

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("pgqa"))
}

/// `<config_dir>/pgqa/settings.toml`
pub fn default_settings_path() -> Result<PathBuf> {
    config_dir().map(|p| p.join("settings.toml"))
}
