//! Reading `TesseraConfig` from disk.

use crate::schema::TesseraConfig;
use crate::validation;
use std::path::Path;
use tessera_common::ConfigError;
use tracing::{info, warn};

use super::paths::{create_default_config, default_config_path};

/// Parse config text. Absent sections and keys take their defaults.
pub fn parse(text: &str) -> Result<TesseraConfig, ConfigError> {
    toml::from_str(text).map_err(|e| ConfigError::ParseError(format!("invalid TOML: {e}")))
}

/// Load config from a specific file.
///
/// Out-of-range values are reported with `warn!` and kept, so a typo in
/// one key never discards the rest of the file.
pub fn load_from_path(path: &Path) -> Result<TesseraConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "cannot read {}: {e}",
                path.display()
            )))
        }
    };

    let config = parse(&text)?;
    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "config has out-of-range values");
    }
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load from the default location. A missing file is created from the
/// documented template and defaults are returned.
pub fn load_default() -> Result<TesseraConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            create_default_config(&path)?;
            Ok(TesseraConfig::default())
        }
        other => other,
    }
}

/// Explicit path if given, else the default location. Never fails: any
/// error is logged and built-in defaults are used.
pub fn load_or_default(override_path: Option<&Path>) -> TesseraConfig {
    let loaded = match override_path {
        Some(path) => load_from_path(path),
        None => load_default(),
    };
    loaded.unwrap_or_else(|e| {
        warn!(error = %e, "falling back to default config");
        TesseraConfig::default()
    })
}
