//! Configuration schema types for Tessera.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod bridge;
mod launcher;
mod logging;

pub use bridge::*;
pub use launcher::*;
pub use logging::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    pub bridge: BridgeConfig,
    pub launcher: LauncherConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
