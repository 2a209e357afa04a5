use async_trait::async_trait;
use cabinet_proto::{self as proto, Status, StatusCode};
use futures::{Stream, StreamExt};
use tracing::debug;

/// Server side of the store RPC surface, implemented by storage crates and hosted by connectors.
#[async_trait]
pub trait CabinetStore: Send + Sync {
    /// Apply a batch atomically: either every action takes effect and one response per
    /// action is returned, or nothing is applied and the failure is returned.
    async fn commit(&self, actions: Vec<proto::TransactionAction>) -> Result<Vec<proto::TransactionActionResponse>, Status>;

    /// Handle a unary call. Failures are reported as [`proto::ResponseBody::Error`].
    async fn handle_request(&self, body: proto::RequestBody) -> proto::ResponseBody;
}

/// What a connector feeds into a transaction being served
#[derive(Debug)]
pub enum Inbound {
    Action(proto::TransactionAction),
    CloseSend,
}

/// Collect actions until end-of-input, then commit them as one batch.
///
/// If the input ends without `CloseSend` the client abandoned the stream and nothing is committed.
pub async fn serve_transaction<S, I>(store: &S, mut inbound: I) -> Result<Vec<proto::TransactionActionResponse>, Status>
where
    S: CabinetStore + ?Sized,
    I: Stream<Item = Inbound> + Unpin,
{
    let mut actions = Vec::new();
    loop {
        match inbound.next().await {
            Some(Inbound::Action(action)) => {
                debug!("serve_transaction received {action}");
                actions.push(action);
            }
            Some(Inbound::CloseSend) => break,
            None => return Err(Status::new(StatusCode::Aborted, "stream abandoned before end-of-input")),
        }
    }

    debug!("serve_transaction committing {} actions", actions.len());
    store.commit(actions).await
}
