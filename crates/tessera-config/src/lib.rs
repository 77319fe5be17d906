//! Tessera configuration.
//!
//! One TOML file with `[bridge]`, `[launcher]` and `[logging]` sections.
//! Every section is `#[serde(default)]`, so any subset of keys is a valid
//! file.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BridgeConfig, LauncherConfig, LogLevel, LoggingConfig, TesseraConfig, TransportKind,
};

/// Pretty JSON view of the effective config, for `--print-config`.
pub fn config_to_json(config: &TesseraConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
