//! The one-line JSON handshake a renderer prints to stdout at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::PROTOCOL_VERSION;

/// Which channel the renderer is listening on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportProtocol {
    /// WebSocket over a loopback TCP port.
    #[serde(rename = "ws-tcp")]
    WsTcp,
    /// WebSocket over a Unix domain socket.
    #[serde(rename = "ws-uds")]
    WsUds,
}

/// `{"protocol","port"?,"socketPath"?,"token","protocolVersion","bridgeVersion"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub protocol: TransportProtocol,
    #[serde(default, alias = "grpcPort", skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<String>,
    pub token: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
    #[serde(default)]
    pub bridge_version: String,
}

fn default_protocol_version() -> u32 {
    PROTOCOL_VERSION
}

/// Where a client should connect, derived from a validated handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(u16),
    Uds(PathBuf),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("malformed handshake: {0}")]
    Malformed(String),

    #[error("handshake for {0} is missing its endpoint")]
    MissingEndpoint(&'static str),

    #[error("handshake carries an empty token")]
    EmptyToken,

    #[error("protocol version mismatch: expected {expected}, renderer speaks {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl Handshake {
    pub fn tcp(port: u16, token: impl Into<String>) -> Self {
        Self {
            protocol: TransportProtocol::WsTcp,
            port: Some(port),
            socket_path: None,
            token: token.into(),
            protocol_version: PROTOCOL_VERSION,
            bridge_version: crate::BRIDGE_VERSION.to_string(),
        }
    }

    pub fn uds(socket_path: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            protocol: TransportProtocol::WsUds,
            port: None,
            socket_path: Some(socket_path.into()),
            token: token.into(),
            protocol_version: PROTOCOL_VERSION,
            bridge_version: crate::BRIDGE_VERSION.to_string(),
        }
    }

    /// Serialize as a single line, without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse and validate one handshake line.
    pub fn parse_line(line: &str) -> Result<Self, HandshakeError> {
        let hs: Handshake = serde_json::from_str(line.trim())
            .map_err(|e| HandshakeError::Malformed(e.to_string()))?;
        hs.validate()?;
        Ok(hs)
    }

    pub fn validate(&self) -> Result<(), HandshakeError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(HandshakeError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                found: self.protocol_version,
            });
        }
        if self.token.is_empty() {
            return Err(HandshakeError::EmptyToken);
        }
        self.endpoint().map(|_| ())
    }

    pub fn endpoint(&self) -> Result<Endpoint, HandshakeError> {
        match self.protocol {
            TransportProtocol::WsTcp => self
                .port
                .map(Endpoint::Tcp)
                .ok_or(HandshakeError::MissingEndpoint("ws-tcp")),
            TransportProtocol::WsUds => self
                .socket_path
                .as_ref()
                .map(|p| Endpoint::Uds(PathBuf::from(p)))
                .ok_or(HandshakeError::MissingEndpoint("ws-uds")),
        }
    }
}
