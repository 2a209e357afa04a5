use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum StatusCode {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    /// A read-check in the transaction evaluated false; nothing was applied
    ReadCheckFailed,
    /// The stream was abandoned before end-of-input
    Aborted,
    Internal,
}

/// A failure reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self { Self { code, message: message.into() } }

    pub fn invalid_argument(message: impl Into<String>) -> Self { Self::new(StatusCode::InvalidArgument, message) }

    pub fn not_found(message: impl Into<String>) -> Self { Self::new(StatusCode::NotFound, message) }

    pub fn already_exists(message: impl Into<String>) -> Self { Self::new(StatusCode::AlreadyExists, message) }
}
