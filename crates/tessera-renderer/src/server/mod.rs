//! WebSocket server: accepts logic-process connections on a loopback TCP
//! port or a Unix domain socket and hands each to [`connection`].

mod connection;

pub use connection::handle_connection;

use std::path::PathBuf;
use std::sync::Arc;

use tessera_protocol::Handshake;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::dispatcher::Dispatcher;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Upper bound for one message or frame (inline image bytes).
    pub max_message_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_message_bytes: 100 * 1024 * 1024,
        }
    }
}

impl ServerOptions {
    pub fn ws_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.max_message_bytes);
        config.max_frame_size = Some(self.max_message_bytes);
        config
    }
}

pub enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Uds(tokio::net::UnixListener, PathBuf),
}

impl Listener {
    /// Bind an ephemeral loopback port.
    pub async fn bind_tcp() -> std::io::Result<Self> {
        Ok(Self::Tcp(TcpListener::bind("127.0.0.1:0").await?))
    }

    /// Bind a Unix socket, replacing a stale socket file.
    #[cfg(unix)]
    pub fn bind_uds(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        let listener = tokio::net::UnixListener::bind(&path)?;
        Ok(Self::Uds(listener, path))
    }

    /// The handshake line announcing this endpoint.
    pub fn handshake(&self, token: &str) -> std::io::Result<Handshake> {
        match self {
            Self::Tcp(l) => Ok(Handshake::tcp(l.local_addr()?.port(), token)),
            #[cfg(unix)]
            Self::Uds(_, path) => Ok(Handshake::uds(path.to_string_lossy(), token)),
        }
    }

    pub fn socket_path(&self) -> Option<PathBuf> {
        match self {
            Self::Tcp(_) => None,
            #[cfg(unix)]
            Self::Uds(_, path) => Some(path.clone()),
        }
    }
}

/// Accept connections until the task is dropped.
pub async fn serve(listener: Listener, dispatcher: Arc<Dispatcher>, options: ServerOptions) {
    match listener {
        Listener::Tcp(l) => loop {
            match l.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(peer = %addr, error = %e, "could not disable Nagle");
                    }
                    spawn_session(stream, addr.to_string(), Arc::clone(&dispatcher), options);
                }
                Err(e) => tracing::warn!(error = %e, "TCP accept error"),
            }
        },
        #[cfg(unix)]
        Listener::Uds(l, path) => loop {
            match l.accept().await {
                Ok((stream, _)) => {
                    let peer = path.display().to_string();
                    spawn_session(stream, peer, Arc::clone(&dispatcher), options);
                }
                Err(e) => tracing::warn!(error = %e, "UDS accept error"),
            }
        },
    }
}

fn spawn_session<S>(stream: S, peer: String, dispatcher: Arc<Dispatcher>, options: ServerOptions)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match accept_async_with_config(stream, Some(options.ws_config())).await {
            Ok(ws) => handle_connection(ws, peer, dispatcher).await,
            Err(e) => tracing::warn!(peer = %peer, error = %e, "WS handshake failed"),
        }
    });
}
