use std::sync::Arc;

use async_trait::async_trait;
use cabinet_core::{
    connector::{ActionSink, CabinetConnector, ConnectError, StreamError, TransactionStream},
    storage::{serve_transaction, CabinetStore, Inbound},
    util::receiver_stream,
    CancellationToken,
};
use cabinet_proto as proto;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sending half of an in-process transaction stream
pub struct LocalProcessSink {
    sender: mpsc::Sender<Inbound>,
}

#[async_trait]
impl ActionSink for LocalProcessSink {
    async fn send(&mut self, action: proto::TransactionAction) -> Result<(), StreamError> {
        self.sender.send(Inbound::Action(action)).await.map_err(|_| StreamError::Closed)
    }

    async fn close_send(&mut self) -> Result<(), StreamError> { self.sender.send(Inbound::CloseSend).await.map_err(|_| StreamError::Closed) }
}

/// Connector which serves every call from a store living in the same process.
///
/// Each transaction runs on its own task, fed through a bounded channel. Dropping the
/// connector stops any transaction still being served.
pub struct LocalProcessConnector<S>
where S: CabinetStore + 'static
{
    store: Arc<S>,
    shutdown: CancellationToken,
}

impl<S> LocalProcessConnector<S>
where S: CabinetStore + 'static
{
    pub fn new(store: Arc<S>) -> Self { Self { store, shutdown: CancellationToken::new() } }

    pub fn store(&self) -> &Arc<S> { &self.store }
}

#[async_trait]
impl<S> CabinetConnector for LocalProcessConnector<S>
where S: CabinetStore + 'static
{
    async fn open_transaction(&self) -> Result<TransactionStream, ConnectError> {
        if self.shutdown.is_cancelled() {
            return Err(ConnectError::ConnectionClosed);
        }
        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        let (response_tx, response_rx) = mpsc::channel(100);

        let store = self.store.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let served = tokio::select! {
                _ = shutdown.cancelled() => Err(proto::Status::new(proto::StatusCode::Aborted, "connector shut down")),
                served = serve_transaction(store.as_ref(), receiver_stream(inbound_rx)) => served,
            };
            match served {
                Ok(responses) => {
                    debug!("LocalProcessConnector streaming {} responses", responses.len());
                    for response in responses {
                        if response_tx.send(Ok(response)).await.is_err() {
                            warn!("LocalProcessConnector: client went away mid-stream");
                            return;
                        }
                    }
                }
                Err(status) => {
                    let _ = response_tx.send(Err(StreamError::Status(status))).await;
                }
            }
        });

        Ok(TransactionStream { sink: Box::new(LocalProcessSink { sender: inbound_tx }), responses: receiver_stream(response_rx) })
    }

    async fn request(&self, body: proto::RequestBody) -> Result<proto::ResponseBody, ConnectError> {
        if self.shutdown.is_cancelled() {
            return Err(ConnectError::ConnectionClosed);
        }
        Ok(self.store.handle_request(body).await)
    }
}

impl<S> Drop for LocalProcessConnector<S>
where S: CabinetStore + 'static
{
    fn drop(&mut self) { self.shutdown.cancel(); }
}
