use serde::{Deserialize, Serialize};

use crate::{
    check::{ReadCheckRequest, ReadCheckResponse},
    data::{Counter, Edge, Index, Meta, MutationResponse, Node, Sequential},
    id::ActionId,
};

/// One mutation or check intent within a transaction batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionAction {
    pub action_id: ActionId,
    pub action: Action,
}

impl TransactionAction {
    pub fn new(action_id: impl Into<ActionId>, action: Action) -> Self { Self { action_id: action_id.into(), action } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
pub enum Action {
    NodeCreate(Node),
    NodeUpdate(Node),
    NodeDelete(Node),
    EdgeUpdate(Edge),
    EdgeDelete(Edge),
    EdgeClear(Edge),
    IndexCreate(Index),
    IndexUpdate(Index),
    IndexDelete(Index),
    MetaUpdate(Meta),
    MetaDelete(Meta),
    MetaClear(Meta),
    CounterRegister(Counter),
    CounterIncrement(Counter),
    CounterDelete(Counter),
    SequentialCreate(Sequential),
    SequentialUpdate(Sequential),
    SequentialDelete(Sequential),
    ReadCheck(ReadCheckRequest),
}

impl Action {
    pub fn kind(&self) -> &'static str { self.into() }

    /// The placeholder id of a node being created, if this action creates one
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Action::NodeCreate(node) if !node.id.is_empty() => Some(node.id.as_str()),
            _ => None,
        }
    }
}

/// The store's answer to one action, tagged with the action's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionActionResponse {
    pub action_id: ActionId,
    pub response: ActionResponse,
}

impl TransactionActionResponse {
    pub fn new(action_id: impl Into<ActionId>, response: ActionResponse) -> Self { Self { action_id: action_id.into(), response } }
}

/// Mirrors [`Action`]. New kinds may be added by newer stores, so consumers must
/// tolerate variants they do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
#[non_exhaustive]
pub enum ActionResponse {
    /// Carries the node with its permanent id
    NodeCreate(Node),
    NodeUpdate(MutationResponse),
    NodeDelete(MutationResponse),
    EdgeUpdate(MutationResponse),
    EdgeDelete(MutationResponse),
    EdgeClear(MutationResponse),
    IndexCreate(MutationResponse),
    IndexUpdate(MutationResponse),
    IndexDelete(MutationResponse),
    MetaUpdate(MutationResponse),
    MetaDelete(MutationResponse),
    MetaClear(MutationResponse),
    CounterRegister(MutationResponse),
    CounterIncrement(Counter),
    CounterDelete(MutationResponse),
    SequentialCreate(Sequential),
    SequentialUpdate(MutationResponse),
    SequentialDelete(MutationResponse),
    ReadCheck(ReadCheckResponse),
}

impl ActionResponse {
    pub fn kind(&self) -> &'static str { self.into() }
}

impl std::fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{} {}", self.action_id, self.action.kind()) }
}

impl std::fmt::Display for TransactionActionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{} {}", self.action_id, self.response.kind()) }
}
