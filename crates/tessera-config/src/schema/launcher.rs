//! Launcher window and home-grid configuration.

use serde::{Deserialize, Serialize};

/// The launcher window and the icon grid laid out on the home frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// When true the window ignores resize requests.
    pub fixed_size: bool,
    /// Grid columns while the window is taller than wide (valid range: 1-12).
    pub portrait_columns: u32,
    /// Grid columns while the window is wider than tall (valid range: 1-12).
    pub landscape_columns: u32,
    /// Icon rows per grid page (valid range: 1-20).
    pub rows_per_page: u32,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            title: "Tessera".into(),
            width: 540,
            height: 960,
            fixed_size: false,
            portrait_columns: 4,
            landscape_columns: 6,
            rows_per_page: 5,
        }
    }
}
