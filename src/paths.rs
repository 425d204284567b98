use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR: &str = "reelshelf";

pub fn data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("unable to resolve data directory")?;
    Ok(base.join(APP_DIR))
}

pub fn database_file_path() -> Result<PathBuf> {
    if let Ok(custom) = std::env::var("REELSHELF_DB")
        && !custom.trim().is_empty()
    {
        return Ok(PathBuf::from(custom));
    }
    Ok(data_dir()?.join("reelshelf.db"))
}

pub fn log_file_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("reelshelf.log"))
}

pub fn config_file_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("unable to resolve config directory")?;
    Ok(base.join(APP_DIR).join("config.toml"))
}
