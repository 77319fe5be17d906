//! One logic-process connection: the renderer process (when we spawned
//! it), its transport, and the negotiated endpoint and token.

use std::sync::Arc;

use tessera_config::{BridgeConfig, TransportKind};
use tessera_protocol::{Endpoint, Handshake, TransportProtocol};
use tracing::info;

use crate::process::RendererProcess;
use crate::proxy::BridgeClient;
use crate::transport::{Transport, TransportOptions, WsTransport};
use crate::ClientError;

/// Default renderer binary, looked up on `PATH`.
const DEFAULT_RENDERER: &str = "tessera-renderer";

/// What the handshake negotiated. The token is stored once and shared by
/// every call on this session.
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub endpoint: Endpoint,
    pub token: Arc<str>,
    pub protocol: TransportProtocol,
    pub bridge_version: String,
}

impl ConnectionSession {
    pub fn from_handshake(handshake: &Handshake) -> Result<Self, ClientError> {
        handshake.validate()?;
        Ok(Self {
            endpoint: handshake.endpoint()?,
            token: Arc::from(handshake.token.as_str()),
            protocol: handshake.protocol,
            bridge_version: handshake.bridge_version.clone(),
        })
    }
}

pub struct Session {
    info: ConnectionSession,
    process: Option<RendererProcess>,
    transport: Arc<WsTransport>,
}

impl Session {
    /// Spawn the configured renderer and connect to it.
    pub async fn connect(config: &BridgeConfig) -> Result<Self, ClientError> {
        let program = config
            .renderer_path
            .clone()
            .unwrap_or_else(|| DEFAULT_RENDERER.to_string());
        let args = match config.transport {
            TransportKind::Tcp => vec!["--transport".to_string(), "tcp".to_string()],
            TransportKind::Uds => vec!["--transport".to_string(), "uds".to_string()],
        };
        Self::spawn(&program, &args, config).await
    }

    pub async fn spawn(
        program: &str,
        args: &[String],
        config: &BridgeConfig,
    ) -> Result<Self, ClientError> {
        let process = RendererProcess::spawn(program, args, config.handshake_timeout()).await?;
        let info = match ConnectionSession::from_handshake(process.handshake()) {
            Ok(info) => info,
            Err(e) => {
                process.shutdown().await;
                return Err(e);
            }
        };
        let options = TransportOptions::from_config(config);
        match WsTransport::connect(&info.endpoint, &info.token, options).await {
            Ok(transport) => {
                info!(endpoint = ?info.endpoint, pid = ?process.id(), "session established");
                Ok(Self {
                    info,
                    process: Some(process),
                    transport: Arc::new(transport),
                })
            }
            Err(e) => {
                process.shutdown().await;
                Err(e)
            }
        }
    }

    /// Connect to a renderer that is already running, given its handshake.
    pub async fn attach(handshake: &Handshake, config: &BridgeConfig) -> Result<Self, ClientError> {
        let info = ConnectionSession::from_handshake(handshake)?;
        let transport =
            WsTransport::connect(&info.endpoint, &info.token, TransportOptions::from_config(config))
                .await?;
        Ok(Self {
            info,
            process: None,
            transport: Arc::new(transport),
        })
    }

    pub fn info(&self) -> &ConnectionSession {
        &self.info
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn client(&self) -> BridgeClient {
        BridgeClient::new(self.transport())
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Close the channel, then stop the renderer if this session spawned it.
    pub async fn shutdown(self) {
        self.transport.close().await;
        if let Some(process) = self.process {
            process.shutdown().await;
        }
    }
}
