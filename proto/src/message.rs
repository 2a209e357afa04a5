use serde::{Deserialize, Serialize};

use crate::{
    error::Status,
    id::{RequestId, StreamId},
    request::{RequestBody, ResponseBody},
    transaction::{TransactionAction, TransactionActionResponse},
};

/// Envelope for everything exchanged over a shared connection
#[derive(Debug, Serialize, Deserialize)]
pub enum Message {
    Request { id: RequestId, body: RequestBody },
    Response { id: RequestId, body: ResponseBody },
    Stream { id: StreamId, frame: StreamFrame },
}

/// One frame of a multiplexed transaction stream
#[derive(Debug, Serialize, Deserialize)]
pub enum StreamFrame {
    // client -> server
    Open,
    Action(TransactionAction),
    CloseSend,
    Abort,
    // server -> client
    Response(TransactionActionResponse),
    /// The stream is finished; `Some` if it terminated abnormally
    End(Option<Status>),
}

impl Message {
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> { bincode::serialize(self) }

    pub fn decode(data: &[u8]) -> Result<Self, bincode::Error> { bincode::deserialize(data) }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Request { id, body } => write!(f, "Request {id}: {body}"),
            Message::Response { id, body } => write!(f, "Response {id}: {body}"),
            Message::Stream { id, frame } => write!(f, "Stream {id}: {frame}"),
        }
    }
}

impl std::fmt::Display for StreamFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFrame::Open => write!(f, "Open"),
            StreamFrame::Action(action) => write!(f, "Action {action}"),
            StreamFrame::CloseSend => write!(f, "CloseSend"),
            StreamFrame::Abort => write!(f, "Abort"),
            StreamFrame::Response(response) => write!(f, "Response {response}"),
            StreamFrame::End(None) => write!(f, "End"),
            StreamFrame::End(Some(status)) => write!(f, "End {status}"),
        }
    }
}
