//! WebSocket transport with keepalive.
//!
//! One background task owns the socket. Calls are correlated by request
//! id; every frame the renderer sends counts as liveness, and the task
//! pings on an interval. When nothing arrives within the keepalive
//! timeout the channel is torn down and every pending call fails with
//! [`ClientError::Closed`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tessera_common::EventBus;
use tessera_protocol::{
    BridgeEvent, Endpoint, Operation, Reply, RequestEnvelope, Response, ServerFrame,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};

use super::{Transport, TransportOptions};
use crate::ClientError;

type Pending = Mutex<HashMap<u64, oneshot::Sender<Response>>>;

struct Shared {
    pending: Pending,
    events: EventBus<BridgeEvent>,
    connected: AtomicBool,
    closing: Notify,
}

impl Shared {
    fn pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Response>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn route(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(ServerFrame::Response(response)) => {
                match self.pending().remove(&response.id) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => debug!(request_id = response.id, "response for unknown request"),
                }
            }
            Ok(ServerFrame::Event(event)) => {
                self.events.publish(event);
            }
            Err(e) => warn!(error = %e, "unrecognized frame from renderer"),
        }
    }

    /// Drop every waiting sender; their receivers resolve to `Closed`.
    fn fail_pending(&self) {
        let dropped = {
            let mut pending = self.pending();
            let n = pending.len();
            pending.clear();
            n
        };
        if dropped > 0 {
            warn!(dropped, "pending calls failed on disconnect");
        }
    }
}

pub struct WsTransport {
    shared: Arc<Shared>,
    out_tx: mpsc::Sender<String>,
    token: Arc<str>,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl WsTransport {
    /// Connect to a renderer endpoint announced in a handshake.
    pub async fn connect(
        endpoint: &Endpoint,
        token: &str,
        options: TransportOptions,
    ) -> Result<Self, ClientError> {
        let config = ws_config(&options);
        match endpoint {
            Endpoint::Tcp(port) => {
                let url = format!("ws://127.0.0.1:{port}/");
                let (ws, _) =
                    tokio_tungstenite::connect_async_with_config(url, Some(config), true).await?;
                info!(port, "connected to renderer over TCP");
                Ok(Self::from_stream(ws, token, options))
            }
            #[cfg(unix)]
            Endpoint::Uds(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(|e| ClientError::Connection(format!("{}: {e}", path.display())))?;
                let (ws, _) =
                    tokio_tungstenite::client_async_with_config("ws://localhost/", stream, Some(config))
                        .await?;
                info!(path = %path.display(), "connected to renderer over UDS");
                Ok(Self::from_stream(ws, token, options))
            }
            #[cfg(not(unix))]
            Endpoint::Uds(path) => Err(ClientError::Connection(format!(
                "unix sockets unavailable: {}",
                path.display()
            ))),
        }
    }

    /// Wrap an established WebSocket and start its connection task.
    pub fn from_stream<S>(ws: WebSocketStream<S>, token: &str, options: TransportOptions) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let shared = Arc::new(Shared {
            pending: Mutex::new(HashMap::new()),
            events: EventBus::new(256),
            connected: AtomicBool::new(true),
            closing: Notify::new(),
        });
        let (out_tx, out_rx) = mpsc::channel(256);
        tokio::spawn(run_connection(ws, Arc::clone(&shared), out_rx, options));
        Self {
            shared,
            out_tx,
            token: Arc::from(token),
            next_id: AtomicU64::new(0),
            call_timeout: options.call_timeout,
        }
    }
}

fn ws_config(options: &TransportOptions) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(options.max_message_bytes);
    config.max_frame_size = Some(options.max_message_bytes);
    config
}

#[async_trait]
impl Transport for WsTransport {
    async fn call(&self, op: Operation) -> Result<Reply, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let json = serde_json::to_string(&RequestEnvelope {
            id,
            authorization: &self.token,
            op: &op,
        })?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending().insert(id, tx);
        if self.out_tx.send(json).await.is_err() {
            self.shared.pending().remove(&id);
            return Err(ClientError::Closed);
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(response)) => Ok(response.into_result()?),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                self.shared.pending().remove(&id);
                warn!(request_id = id, op = op.name(), "call timed out");
                Err(ClientError::Timeout(self.call_timeout))
            }
        }
    }

    fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.shared.events.subscribe()
    }

    fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.shared.closing.notify_one();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.shared.closing.notify_one();
    }
}

async fn run_connection<S>(
    ws: WebSocketStream<S>,
    shared: Arc<Shared>,
    mut out_rx: mpsc::Receiver<String>,
    options: TransportOptions,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();
    let mut ticker = tokio::time::interval(options.keepalive_interval);
    ticker.tick().await;
    let mut last_seen = Instant::now();

    let reason = loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        shared.route(text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_seen = Instant::now();
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break "closed by renderer",
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        warn!(error = %e, "renderer connection error");
                        break "socket error";
                    }
                }
            }

            out = out_rx.recv() => {
                match out {
                    Some(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break "send failed";
                        }
                    }
                    None => break "transport dropped",
                }
            }

            _ = ticker.tick() => {
                if last_seen.elapsed() > options.keepalive_timeout {
                    warn!(
                        timeout_secs = options.keepalive_timeout.as_secs(),
                        "renderer missed keepalive, tearing down"
                    );
                    break "keepalive timeout";
                }
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break "ping failed";
                }
            }

            _ = shared.closing.notified() => {
                let _ = sink.send(Message::Close(None)).await;
                break "closed locally";
            }
        }
    };

    shared.connected.store(false, Ordering::SeqCst);
    shared.fail_pending();
    info!(reason, "renderer connection ended");
}
