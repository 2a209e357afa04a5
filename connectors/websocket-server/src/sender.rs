use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use cabinet_proto as proto;
use futures_util::{stream::SplitSink, SinkExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("encoding error: {0}")]
    Encode(#[from] bincode::Error),
    #[error("connection closed")]
    ConnectionClosed,
}

/// Queues frames for one websocket client. A single task owns the socket's sending half,
/// so stream and request tasks can send concurrently.
#[derive(Clone)]
pub struct ClientSender {
    tx: mpsc::Sender<WsMessage>,
    inner: Arc<Inner>,
}

struct Inner {
    who: String,
    handle: tokio::task::JoinHandle<()>,
}

impl ClientSender {
    pub fn new(who: String, mut sender: SplitSink<WebSocket, WsMessage>) -> Self {
        let (tx, mut rx) = mpsc::channel(32);
        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sender.send(msg).await.is_err() {
                    debug!("Websocket send failed, client gone");
                    break;
                }
            }
        });
        Self { tx, inner: Arc::new(Inner { who, handle }) }
    }

    pub async fn send(&self, message: proto::Message) -> Result<(), SendError> {
        let data = message.encode()?;
        self.tx.send(WsMessage::Binary(data.into())).await.map_err(|_| SendError::ConnectionClosed)
    }

    pub fn who(&self) -> &str { &self.inner.who }
}

impl Drop for Inner {
    fn drop(&mut self) {
        info!("Dropping ClientSender for {}", self.who);
        self.handle.abort();
    }
}
