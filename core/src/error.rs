//! Errors surfaced to callers of the coordinator and the typed client.

use cabinet_proto::{self as proto, ActionId};
use thiserror::Error;

use crate::connector::{ConnectError, StreamError};

/// The single outcome error of a failed commit.
///
/// When several failures occur during one commit only one is reported, chosen in this order:
/// `Empty`, `DuplicateAction`, `Connection`, `Send`, `Close`, then the first failure seen by
/// the response reader.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("no queued actions")]
    Empty,

    #[error("duplicate action id {0}")]
    DuplicateAction(ActionId),

    #[error("connection error: {0}")]
    Connection(#[source] ConnectError),

    #[error("sending error on {action_id}: {source}")]
    Send { action_id: ActionId, source: StreamError },

    #[error("close send error: {0}")]
    Close(#[source] StreamError),

    #[error("response error: {0}")]
    Response(#[source] StreamError),

    /// The store answered a create that was never sent as one
    #[error("create response for unknown action {0}")]
    UnexpectedCreate(ActionId),

    /// The stream ended normally without answering every create
    #[error("unresolved placeholders: {}", .0.join(", "))]
    Unresolved(Vec<String>),

    #[error("transaction cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl TransactionError {
    /// Stable numeric class of the error, as used in logs and by older tooling
    pub fn code(&self) -> u8 {
        match self {
            TransactionError::Connection(_) => 0,
            TransactionError::Close(_) => 1,
            TransactionError::Send { .. } => 2,
            TransactionError::Response(_)
            | TransactionError::UnexpectedCreate(_)
            | TransactionError::Unresolved(_)
            | TransactionError::Cancelled
            | TransactionError::Internal(_) => 3,
            TransactionError::DuplicateAction(_) => 10,
            TransactionError::Empty => 11,
        }
    }

    /// The store status behind this error, if the store reported one
    pub fn status(&self) -> Option<&proto::Status> {
        match self {
            TransactionError::Send { source, .. } | TransactionError::Close(source) | TransactionError::Response(source) => source.status(),
            _ => None,
        }
    }
}

/// Error type for unary store calls
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectError),

    #[error("store error: {0}")]
    Status(#[from] proto::Status),

    /// A create was repeated with a UUID that is already allocated
    #[error("sequence already exists: {} #{}", .0.seq_type, .0.seqid.unwrap_or_default())]
    AlreadyExists(proto::Sequential),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl RequestError {
    pub fn code(&self) -> Option<proto::StatusCode> {
        match self {
            RequestError::Status(status) => Some(status.code),
            RequestError::AlreadyExists(_) => Some(proto::StatusCode::AlreadyExists),
            _ => None,
        }
    }
}
