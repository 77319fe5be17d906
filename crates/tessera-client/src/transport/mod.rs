//! Call/event transports.

#[cfg(feature = "local")]
mod local;
mod ws;

#[cfg(feature = "local")]
pub use local::LocalTransport;
pub use ws::WsTransport;

use std::time::Duration;

use async_trait::async_trait;
use tessera_config::BridgeConfig;
use tessera_protocol::{BridgeEvent, Operation, Reply};
use tokio::sync::broadcast;

use crate::ClientError;

/// One request/response channel to a renderer plus its event stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one operation and wait for its reply. Renderer-side failures
    /// come back as [`ClientError::Rpc`].
    async fn call(&self, op: Operation) -> Result<Reply, ClientError>;

    /// Subscribe to pushed events.
    fn events(&self) -> broadcast::Receiver<BridgeEvent>;

    fn is_connected(&self) -> bool;

    async fn close(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    pub call_timeout: Duration,
    pub keepalive_interval: Duration,
    pub keepalive_timeout: Duration,
    pub max_message_bytes: usize,
}

impl TransportOptions {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            call_timeout: config.call_timeout(),
            keepalive_interval: config.keepalive_interval(),
            keepalive_timeout: config.keepalive_timeout(),
            max_message_bytes: config.max_message_bytes,
        }
    }
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::from_config(&BridgeConfig::default())
    }
}
