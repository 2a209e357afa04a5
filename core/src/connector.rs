use async_trait::async_trait;
use cabinet_proto as proto;
use futures::stream::BoxStream;

/// Client side of the store RPC surface.
///
/// A connector is passed explicitly to every [`crate::Transaction`] and [`crate::Cabinet`];
/// nothing in this crate holds a global handle.
#[async_trait]
pub trait CabinetConnector: Send + Sync {
    /// Open a duplex transaction stream
    async fn open_transaction(&self) -> Result<TransactionStream, ConnectError>;

    /// Perform a unary call
    async fn request(&self, body: proto::RequestBody) -> Result<proto::ResponseBody, ConnectError>;
}

/// The two halves of one transaction stream.
///
/// `responses` yields `None` on a normal end-of-stream and `Some(Err(..))` when the
/// stream terminates abnormally.
pub struct TransactionStream {
    pub sink: Box<dyn ActionSink>,
    pub responses: ResponseStream,
}

pub type ResponseStream = BoxStream<'static, Result<proto::TransactionActionResponse, StreamError>>;

/// Sending half of a transaction stream. Dropping it without calling `close_send`
/// abandons the stream.
#[async_trait]
pub trait ActionSink: Send {
    async fn send(&mut self, action: proto::TransactionAction) -> Result<(), StreamError>;

    /// Signal end-of-input
    async fn close_send(&mut self) -> Result<(), StreamError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectError {
    #[error("not connected")]
    NotConnected,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
    #[error("stream closed")]
    Closed,
    #[error("{0}")]
    Status(#[from] proto::Status),
    #[error("transport error: {0}")]
    Transport(String),
}

impl StreamError {
    pub fn status(&self) -> Option<&proto::Status> {
        match self {
            StreamError::Status(status) => Some(status),
            _ => None,
        }
    }
}
