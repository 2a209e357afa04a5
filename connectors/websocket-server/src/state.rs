use std::{collections::HashMap, sync::Arc};

use cabinet_core::{
    storage::{serve_transaction, CabinetStore, Inbound},
    util::receiver_stream,
};
use cabinet_proto::{self as proto, StreamFrame, StreamId};
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, warn};

use crate::sender::ClientSender;

/// Per-socket bookkeeping: the transaction streams this client has open.
///
/// Dropping the connection aborts every task it spawned.
pub struct Connection {
    sender: ClientSender,
    store: Arc<dyn CabinetStore>,
    streams: HashMap<StreamId, mpsc::Sender<Inbound>>,
    tasks: JoinSet<()>,
}

impl Connection {
    pub fn new(sender: ClientSender, store: Arc<dyn CabinetStore>) -> Self {
        Self { sender, store, streams: HashMap::new(), tasks: JoinSet::new() }
    }

    pub fn open_streams(&self) -> usize { self.streams.len() }

    pub async fn handle(&mut self, message: proto::Message) {
        while self.tasks.try_join_next().is_some() {}

        match message {
            proto::Message::Request { id, body } => {
                let store = self.store.clone();
                let sender = self.sender.clone();
                self.tasks.spawn(async move {
                    let body = store.handle_request(body).await;
                    if let Err(e) = sender.send(proto::Message::Response { id, body }).await {
                        warn!("Failed to answer request from {}: {e}", sender.who());
                    }
                });
            }
            proto::Message::Stream { id, frame } => self.handle_frame(id, frame).await,
            proto::Message::Response { id, .. } => warn!("Ignoring response {id} from client {}", self.sender.who()),
        }
    }

    async fn handle_frame(&mut self, id: StreamId, frame: StreamFrame) {
        match frame {
            StreamFrame::Open => self.open(id),
            StreamFrame::Action(action) => match self.streams.get(&id) {
                Some(tx) => {
                    if tx.send(Inbound::Action(action)).await.is_err() {
                        warn!("Stream {id} is no longer accepting actions");
                        self.streams.remove(&id);
                    }
                }
                None => warn!("Action for unknown stream {id}"),
            },
            StreamFrame::CloseSend => match self.streams.remove(&id) {
                Some(tx) => {
                    let _ = tx.send(Inbound::CloseSend).await;
                }
                None => warn!("CloseSend for unknown stream {id}"),
            },
            // dropping the input makes the served transaction end as aborted
            StreamFrame::Abort => {
                debug!("Client aborted stream {id}");
                self.streams.remove(&id);
            }
            other @ (StreamFrame::Response(_) | StreamFrame::End(_)) => warn!("Ignoring server frame {other} from client on {id}"),
        }
    }

    fn open(&mut self, id: StreamId) {
        if self.streams.contains_key(&id) {
            warn!("Stream {id} is already open");
            return;
        }
        let (tx, rx) = mpsc::channel(100);
        self.streams.insert(id.clone(), tx);

        let store = self.store.clone();
        let sender = self.sender.clone();
        self.tasks.spawn(async move {
            let end = match serve_transaction(store.as_ref(), receiver_stream(rx)).await {
                Ok(responses) => {
                    for response in responses {
                        let frame = StreamFrame::Response(response);
                        if sender.send(proto::Message::Stream { id: id.clone(), frame }).await.is_err() {
                            return;
                        }
                    }
                    None
                }
                Err(status) => Some(status),
            };
            let _ = sender.send(proto::Message::Stream { id, frame: StreamFrame::End(end) }).await;
        });
    }
}
