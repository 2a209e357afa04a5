//! Client-side transaction coordinator.
//!
//! A [`Transaction`] accumulates actions locally and ships them to the store over one duplex
//! stream when committed. Sending and receiving run concurrently: the writer streams actions
//! in append order while a reader task matches responses to action ids as they arrive, in
//! whatever order the store sends them. Placeholder ids given to node creates are resolved to
//! the store's permanent ids from the create responses.

mod batch;
mod correlator;
mod resolver;

use std::{collections::BTreeMap, sync::Arc};

use cabinet_proto::{Action, ActionId, ActionResponse, TransactionAction};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use resolver::IdMap;

use self::{batch::ActionBatch, correlator::Correlator};
use crate::{
    action_debug, action_info, action_warn,
    connector::{ActionSink, CabinetConnector, TransactionStream},
    error::TransactionError,
};

/// A batch of actions committed atomically by the store.
///
/// Committing consumes the transaction, so a batch is sent at most once.
pub struct Transaction {
    connector: Arc<dyn CabinetConnector>,
    batch: ActionBatch,
    cancel: CancellationToken,
}

/// The result of a successful commit
#[derive(Debug, Clone, Default)]
pub struct Committed {
    ids: IdMap,
    responses: BTreeMap<ActionId, ActionResponse>,
}

impl Committed {
    pub fn ids(&self) -> &IdMap { &self.ids }

    /// The permanent id of the node created under `placeholder`
    pub fn resolve(&self, placeholder: &str) -> Option<&str> { self.ids.resolve(placeholder) }

    pub fn response(&self, action_id: impl Into<ActionId>) -> Option<&ActionResponse> { self.responses.get(&action_id.into()) }

    /// Every response, ordered by action id
    pub fn responses(&self) -> &BTreeMap<ActionId, ActionResponse> { &self.responses }

    pub fn into_ids(self) -> IdMap { self.ids }
}

impl Transaction {
    pub fn new(connector: Arc<dyn CabinetConnector>) -> Self {
        Self { connector, batch: ActionBatch::new(), cancel: CancellationToken::new() }
    }

    /// Abort the commit (and stop both of its halves) when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Append an action under its own id.
    ///
    /// An id already used in this transaction is rejected: the action is not appended and the
    /// commit will fail with [`TransactionError::DuplicateAction`] without touching the network.
    pub fn add(&mut self, action: TransactionAction) -> &mut Self {
        self.batch.append(action);
        self
    }

    /// Append an action under the next free id and return that id
    pub fn push(&mut self, action: Action) -> ActionId { self.batch.append_auto(action) }

    /// The id [`Transaction::push`] would assign next
    pub fn next_action_id(&self) -> ActionId { self.batch.next_action_id() }

    pub fn len(&self) -> usize { self.batch.len() }

    pub fn is_empty(&self) -> bool { self.batch.is_empty() }

    /// Send every action to the store and wait for the outcome.
    ///
    /// Returns once the store has ended the response stream (or the commit failed), with every
    /// placeholder of the batch resolved on success.
    pub async fn commit(self) -> Result<Committed, TransactionError> {
        let Transaction { connector, batch, cancel } = self;
        let actions = batch.into_actions()?;
        let pending = batch::pending_creates(&actions);
        action_info!("Transaction", "commit", "{} actions ({} creates)", actions.len(), pending.len());

        let TransactionStream { sink, responses } = connector.open_transaction().await.map_err(|e| {
            action_warn!("Transaction", "open failed", "{}", e);
            TransactionError::Connection(e)
        })?;

        let failed = CancellationToken::new();
        let reader = tokio::spawn(Correlator::new(pending, failed.clone()).run(responses, cancel.clone()));

        // a failed writer drops the sink, which abandons the stream; the reader drains until it ends
        let written = write_actions(sink, actions, &cancel, &failed).await;
        let read = reader.await;

        // sending failures take precedence over anything the reader saw
        if let Err(error) = written {
            action_warn!("Transaction", "failed", "{}", error);
            return Err(error);
        }
        let correlation = read.map_err(|e| TransactionError::Internal(format!("response reader failed: {e}")))?;

        if let Some(error) = correlation.error {
            action_warn!("Transaction", "failed", "{}", error);
            return Err(error);
        }
        if !correlation.unresolved.is_empty() {
            action_warn!("Transaction", "unresolved", "{} placeholders", correlation.unresolved.len());
            return Err(TransactionError::Unresolved(correlation.unresolved));
        }

        action_info!("Transaction", "committed", "{} responses", correlation.responses.len());
        Ok(Committed { ids: correlation.ids, responses: correlation.responses })
    }
}

/// Stream the actions in order, then signal end-of-input.
///
/// Stops early, abandoning the stream, once the reader has failed. The reader's error is the
/// one reported in that case.
async fn write_actions(
    mut sink: Box<dyn ActionSink>,
    actions: Vec<TransactionAction>,
    cancel: &CancellationToken,
    failed: &CancellationToken,
) -> Result<(), TransactionError> {
    for action in actions {
        if failed.is_cancelled() {
            debug!("Transaction writer stopping after reader failure");
            return Ok(());
        }
        let action_id = action.action_id;
        action_debug!("Transaction", "send", "{}", action);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransactionError::Cancelled),
            sent = sink.send(action) => sent.map_err(|source| TransactionError::Send { action_id, source })?,
        }
    }

    if failed.is_cancelled() {
        debug!("Transaction writer abandoning stream after reader failure");
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransactionError::Cancelled),
        closed = sink.close_send() => closed.map_err(TransactionError::Close),
    }
}
