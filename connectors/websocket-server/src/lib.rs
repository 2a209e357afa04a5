//! # Cabinet WebSocket Server
//!
//! Hosts any [`cabinet_core::CabinetStore`] behind a single `/ws` endpoint. Each client holds one
//! socket over which unary requests and any number of transaction streams are multiplexed as
//! bincode-encoded [`cabinet_proto::Message`] frames.

mod sender;
mod server;
mod state;
mod user_agent;

pub use server::*;
pub use user_agent::OptionalUserAgent;
