use async_trait::async_trait;
use cabinet_core::connector::{ActionSink, StreamError};
use cabinet_proto::{self as proto, StreamFrame, StreamId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of one transaction stream multiplexed over the client's socket.
///
/// Dropping it before `close_send` tells the server to abandon the stream.
pub struct WebsocketActionSink {
    id: StreamId,
    outgoing: mpsc::UnboundedSender<proto::Message>,
    finished: bool,
}

impl WebsocketActionSink {
    pub(crate) fn new(id: StreamId, outgoing: mpsc::UnboundedSender<proto::Message>) -> Self { Self { id, outgoing, finished: false } }

    fn queue(&self, frame: StreamFrame) -> Result<(), StreamError> {
        self.outgoing.send(proto::Message::Stream { id: self.id.clone(), frame }).map_err(|_| {
            warn!("Failed to queue frame for stream {} - connection task gone", self.id);
            StreamError::Closed
        })
    }
}

#[async_trait]
impl ActionSink for WebsocketActionSink {
    async fn send(&mut self, action: proto::TransactionAction) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Closed);
        }
        self.queue(StreamFrame::Action(action))
    }

    async fn close_send(&mut self) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Closed);
        }
        self.finished = true;
        self.queue(StreamFrame::CloseSend)
    }
}

impl Drop for WebsocketActionSink {
    fn drop(&mut self) {
        if !self.finished {
            debug!("Abandoning stream {}", self.id);
            let _ = self.queue(StreamFrame::Abort);
        }
    }
}
