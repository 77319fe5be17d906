//! Where the config file lives, and writing the documented default.

use std::path::{Path, PathBuf};
use tessera_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

/// Overrides the config directory, mostly for tests and sandboxes.
pub const CONFIG_DIR_ENV: &str = "TESSERA_CONFIG_DIR";

/// `$TESSERA_CONFIG_DIR/config.toml`, else `<config_dir>/tessera/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir).join("config.toml"));
    }
    dirs::config_dir()
        .map(|base| base.join("tessera").join("config.toml"))
        .ok_or_else(|| ConfigError::ParseError("no config directory on this platform".into()))
}

/// Write the commented default config to `path`, creating parent
/// directories. The file is written next to its target and renamed into
/// place so a reader never sees a partial file.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|e| io_error("create", dir, e))?;
    }

    let staging = path.with_extension("toml.tmp");
    std::fs::write(&staging, default_config_toml()).map_err(|e| io_error("write", &staging, e))?;
    std::fs::rename(&staging, path).map_err(|e| io_error("install", path, e))?;

    info!(path = %path.display(), "wrote default config");
    Ok(())
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::ParseError(format!("cannot {action} {}: {e}", path.display()))
}
