//! Per-connection handler: decode requests, execute them off the async
//! runtime, and interleave responses with pushed events.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tessera_protocol::{Request, Response, RpcError, ServerFrame};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::dispatcher::Dispatcher;

/// Serve one logic-process connection until it closes.
pub async fn handle_connection<S>(ws: WebSocketStream<S>, peer: String, dispatcher: Arc<Dispatcher>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(256);
    let mut events = dispatcher.subscribe_events();

    tracing::info!(peer = %peer, "logic process connected");

    loop {
        tokio::select! {
            Some(frame) = out_rx.recv() => {
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let json = ServerFrame::Event(event).to_json();
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(peer = %peer, skipped = n, "event push lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match decode_request(text.as_str()) {
                            Ok(request) => spawn_request(request, &dispatcher, &out_tx),
                            Err(response) => {
                                let _ = out_tx.send(ServerFrame::Response(response).to_json()).await;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        tracing::warn!(peer = %peer, "binary frame ignored");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %peer, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(peer = %peer, "logic process disconnected");
}

/// Parse a request frame. On failure, answer with `invalid_request` under
/// whatever id can still be recovered.
fn decode_request(text: &str) -> Result<Request, Response> {
    serde_json::from_str::<Request>(text).map_err(|e| {
        let id = serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_u64()))
            .unwrap_or(0);
        tracing::warn!(request_id = id, error = %e, "malformed request");
        Response::err(id, RpcError::invalid_request(format!("malformed request: {e}")))
    })
}

/// Run the request on the blocking pool; the dispatcher blocks on the UI
/// thread and must not stall the connection loop.
fn spawn_request(request: Request, dispatcher: &Arc<Dispatcher>, out_tx: &mpsc::Sender<String>) {
    let dispatcher = Arc::clone(dispatcher);
    let out_tx = out_tx.clone();
    let id = request.id;
    tokio::spawn(async move {
        let response = tokio::task::spawn_blocking(move || dispatcher.handle(request))
            .await
            .unwrap_or_else(|e| Response::err(id, RpcError::internal(format!("dispatch task failed: {e}"))));
        let _ = out_tx.send(ServerFrame::Response(response).to_json()).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::ErrorCode;

    #[test]
    fn malformed_request_keeps_its_id() {
        let err = decode_request(r#"{"id":12,"authorization":"t","op":{"op":"nope"}}"#).unwrap_err();
        assert_eq!(err.id, 12);
        assert_eq!(err.error.unwrap().code, ErrorCode::InvalidRequest);
    }

    #[test]
    fn unparseable_request_uses_id_zero() {
        let err = decode_request("not json").unwrap_err();
        assert_eq!(err.id, 0);
    }

    #[test]
    fn valid_request_decodes() {
        let req = decode_request(r#"{"id":3,"authorization":"t","op":{"op":"clear_all"}}"#).unwrap();
        assert_eq!(req.id, 3);
    }
}
