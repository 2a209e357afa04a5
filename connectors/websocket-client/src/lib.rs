//! # Cabinet WebSocket Client
//!
//! A native [`cabinet_core::CabinetConnector`] that talks to a `cabinet-websocket-server`.
//! Unary requests and transaction streams share one socket.
//!
//! ## Automatic reconnection
//!
//!  Reconnects to the server if the connection is lost using exponential backoff. Anything in
//!  flight at that moment fails with a transport error.
//!
//! ## Graceful shutdown
//!
//!   To shutdown the client, call the `shutdown` method. This will wait for the connection to be closed and then return.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! # use cabinet_core::Cabinet;
//! # use cabinet_proto::{Action, Node};
//! # use cabinet_websocket_client::WebsocketClient;
//! # use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Arc::new(WebsocketClient::new("ws://localhost:8888").await?);
//!     client.wait_connected().await?;
//!
//!     let cabinet = Cabinet::new(client.clone());
//!     let mut trx = cabinet.begin();
//!     trx.push(Action::NodeCreate(Node::new(1, "tmp:user")));
//!     let committed = trx.commit().await?;
//!     println!("created {}", &committed.ids()["tmp:user"]);
//!
//!     client.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod client;
mod sender;

pub use client::{ConnectionError, ConnectionState, WebsocketClient};
pub use sender::WebsocketActionSink;
