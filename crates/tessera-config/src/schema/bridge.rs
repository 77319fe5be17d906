//! Bridge transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which stream the renderer listens on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Loopback TCP port.
    #[default]
    Tcp,
    /// Unix domain socket (Unix only).
    Uds,
}

/// Connection, keepalive and payload limits for the renderer bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub transport: TransportKind,
    /// Renderer executable. `None` means look next to the current binary.
    pub renderer_path: Option<String>,
    /// How long to wait for the handshake line (valid range: 100-120000).
    pub handshake_timeout_ms: u64,
    /// Interval between client keepalive pings (valid range: 1-300).
    pub keepalive_interval_secs: u64,
    /// Silence after which the channel is considered wedged (valid range: 2-600).
    pub keepalive_timeout_secs: u64,
    /// Upper bound for one message, inline image bytes included.
    pub max_message_bytes: usize,
    /// Transport-level timeout for a single call (valid range: 1-600).
    pub call_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Tcp,
            renderer_path: None,
            handshake_timeout_ms: 10_000,
            keepalive_interval_secs: 10,
            keepalive_timeout_secs: 30,
            max_message_bytes: 100 * 1024 * 1024,
            call_timeout_secs: 30,
        }
    }
}

impl BridgeConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.transport, TransportKind::Tcp);
        assert!(config.renderer_path.is_none());
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.keepalive_interval(), Duration::from_secs(10));
        assert_eq!(config.keepalive_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_message_bytes, 100 * 1024 * 1024);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn transport_kind_serialization() {
        let json = serde_json::to_string(&TransportKind::Uds).unwrap();
        assert_eq!(json, "\"uds\"");
        let parsed: TransportKind = serde_json::from_str("\"tcp\"").unwrap();
        assert_eq!(parsed, TransportKind::Tcp);
    }

    #[test]
    fn bridge_partial_toml() {
        let config: BridgeConfig = toml::from_str(
            r#"
renderer_path = "/opt/tessera/tessera-renderer"
handshake_timeout_ms = 2500
"#,
        )
        .unwrap();
        assert_eq!(
            config.renderer_path.as_deref(),
            Some("/opt/tessera/tessera-renderer")
        );
        assert_eq!(config.handshake_timeout(), Duration::from_millis(2500));
        // Defaults preserved
        assert_eq!(config.keepalive_interval_secs, 10);
    }
}
