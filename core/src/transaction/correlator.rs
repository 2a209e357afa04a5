use std::collections::BTreeMap;

use cabinet_proto::{ActionId, ActionResponse, TransactionActionResponse};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::resolver::{IdMap, IdResolver, PendingCreates};
use crate::{connector::ResponseStream, error::TransactionError};

/// Matches responses to the actions that produced them.
///
/// Runs as its own task for the life of one commit and owns everything the responses touch,
/// so the sending side shares nothing with it except the `failed` signal.
pub(crate) struct Correlator {
    resolver: IdResolver,
    responses: BTreeMap<ActionId, ActionResponse>,
    error: Option<TransactionError>,
    failed: CancellationToken,
}

/// Everything the reader learned, handed back when the response stream is finished
pub(crate) struct Correlation {
    pub error: Option<TransactionError>,
    pub unresolved: Vec<String>,
    pub ids: IdMap,
    pub responses: BTreeMap<ActionId, ActionResponse>,
}

impl Correlator {
    pub fn new(pending: PendingCreates, failed: CancellationToken) -> Self {
        Self { resolver: IdResolver::new(pending), responses: BTreeMap::new(), error: None, failed }
    }

    /// Consume the response stream until it ends, fails, or `cancel` fires
    pub async fn run(mut self, mut stream: ResponseStream, cancel: CancellationToken) -> Correlation {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.fail(TransactionError::Cancelled);
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(response)) => self.dispatch(response),
                Some(Err(e)) => {
                    warn!("Transaction response stream failed: {e}");
                    self.fail(TransactionError::Response(e));
                    break;
                }
                None => break,
            }
        }

        Correlation { error: self.error, unresolved: self.resolver.unresolved(), ids: self.resolver.finish(), responses: self.responses }
    }

    fn dispatch(&mut self, response: TransactionActionResponse) {
        let TransactionActionResponse { action_id, response } = response;
        debug!("Correlator received {} for {action_id}", response.kind());

        match &response {
            ActionResponse::NodeCreate(node) => {
                if let Err(e) = self.resolver.record(action_id, &node.id) {
                    warn!("Correlator: {e}");
                    self.fail(e);
                }
            }
            ActionResponse::ReadCheck(check) if !check.result => {
                debug!("Read check {action_id} did not hold");
            }
            // Kinds without follow-up work, including ones this client does not know about
            _ => {}
        }

        if self.responses.insert(action_id, response).is_some() {
            warn!("Correlator replaced an earlier response for {action_id}");
        }
    }

    fn fail(&mut self, error: TransactionError) {
        match self.error {
            None => self.error = Some(error),
            Some(_) => debug!("Correlator discarding later error: {error}"),
        }
        self.failed.cancel();
    }
}
