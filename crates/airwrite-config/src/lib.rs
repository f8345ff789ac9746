mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<platform config dir>/airwrite/`. Not created until something is saved.
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("airwrite"))
}

/// `<platform config dir>/airwrite/config.toml`
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the user config, or defaults if there is none yet.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path()?)
}

/// Save the user config, creating its directory on first use.
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(&config_path()?, config)
}

/// Load and validate the config at `path`. A missing file yields defaults;
/// a file that fails to parse or validate is an error.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        info!(?path, "No config found, using defaults");
        return Ok(AppConfig::default());
    }
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| format!("Invalid config {path:?}"))?;
    config
        .validate()
        .with_context(|| format!("Invalid config {path:?}"))?;
    info!(?path, "Loaded config");
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {dir:?}"))?;
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {path:?}"))?;
    info!(?path, "Saved config");
    Ok(())
}
