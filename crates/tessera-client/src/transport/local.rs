//! In-process transport: requests go straight to a renderer
//! [`Dispatcher`] on the blocking pool, with no socket in between. The
//! dispatcher still authorizes every request and still runs native work on
//! its own UI thread.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tessera_protocol::{BridgeEvent, Operation, Reply, Request, RpcError};
use tessera_renderer::Dispatcher;
use tokio::sync::broadcast;

use super::Transport;
use crate::ClientError;

pub struct LocalTransport {
    dispatcher: Arc<Dispatcher>,
    token: Arc<str>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<Dispatcher>, token: &str) -> Self {
        Self {
            dispatcher,
            token: Arc::from(token),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Fresh headless renderer with a random token.
    pub fn headless() -> std::io::Result<Self> {
        let token = tessera_common::new_token();
        let dispatcher = Arc::new(Dispatcher::headless(token.clone())?);
        Ok(Self::new(dispatcher, &token))
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn call(&self, op: Operation) -> Result<Reply, ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let request = Request {
            id,
            authorization: self.token.to_string(),
            op,
        };
        let dispatcher = Arc::clone(&self.dispatcher);
        let response = tokio::task::spawn_blocking(move || dispatcher.handle(request))
            .await
            .map_err(|e| RpcError::internal(format!("dispatch task failed: {e}")))?;
        Ok(response.into_result()?)
    }

    fn events(&self) -> broadcast::Receiver<BridgeEvent> {
        self.dispatcher.subscribe_events()
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_protocol::ErrorCode;

    #[tokio::test]
    async fn local_calls_reach_the_dispatcher() {
        let transport = LocalTransport::headless().unwrap();
        transport
            .call(Operation::CreateVBox {
                widget_id: "vbox_1".into(),
            })
            .await
            .unwrap();
        assert_eq!(transport.dispatcher().registry().live_widget_count(), 1);
    }

    #[tokio::test]
    async fn local_transport_still_authorizes() {
        let dispatcher = Arc::new(Dispatcher::headless("secret").unwrap());
        let transport = LocalTransport::new(dispatcher, "guess");
        let err = transport.call(Operation::ClearAll).await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(ErrorCode::Unauthorized));
    }

    #[tokio::test]
    async fn closed_transport_refuses_calls() {
        let transport = LocalTransport::headless().unwrap();
        transport.close().await;
        assert!(matches!(
            transport.call(Operation::ClearAll).await,
            Err(ClientError::Closed)
        ));
    }
}
