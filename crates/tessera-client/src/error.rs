use std::time::Duration;

use tessera_protocol::{ErrorCode, HandshakeError, RpcError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("renderer handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("invalid handshake: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("failed to spawn renderer: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("unexpected reply to {op}: {reply}")]
    UnexpectedReply { op: &'static str, reply: String },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    /// Startup failures: the renderer could not be reached at all.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::HandshakeTimeout(_) | Self::Handshake(_) | Self::Spawn(_)
        )
    }

    /// The structured error code when the renderer rejected the call.
    pub fn rpc_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Rpc(e) => Some(e.code),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_classified() {
        assert!(ClientError::HandshakeTimeout(Duration::from_secs(1)).is_connection_error());
        assert!(ClientError::Handshake(HandshakeError::EmptyToken).is_connection_error());
        assert!(!ClientError::Closed.is_connection_error());
    }

    #[test]
    fn rpc_code_exposed() {
        let err = ClientError::from(RpcError::not_found("Widget not found: x"));
        assert_eq!(err.rpc_code(), Some(ErrorCode::NotFound));
        assert_eq!(err.to_string(), "not_found: Widget not found: x");
    }

    #[test]
    fn error_display() {
        let err = ClientError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "call timed out after 30s");
    }
}
