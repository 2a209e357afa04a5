use std::collections::HashSet;

use cabinet_proto::{Action, ActionId, TransactionAction};
use tracing::warn;

use super::resolver::PendingCreates;
use crate::error::TransactionError;

/// Ordered actions of one transaction, plus any validation failures found while appending.
#[derive(Debug)]
pub(crate) struct ActionBatch {
    actions: Vec<TransactionAction>,
    ids: HashSet<ActionId>,
    queued_errors: Vec<TransactionError>,
    next_id: ActionId,
}

impl ActionBatch {
    pub fn new() -> Self { Self { actions: Vec::new(), ids: HashSet::new(), queued_errors: Vec::new(), next_id: ActionId(1) } }

    /// Append an action with a caller-chosen id. A duplicate id is not appended; the
    /// failure is queued and reported at commit.
    pub fn append(&mut self, action: TransactionAction) {
        if !self.ids.insert(action.action_id) {
            warn!("Rejecting duplicate action id {}", action.action_id);
            self.queued_errors.push(TransactionError::DuplicateAction(action.action_id));
            return;
        }
        self.actions.push(action);
    }

    /// Append an action under the lowest unused id at or above the last one assigned
    pub fn append_auto(&mut self, action: Action) -> ActionId {
        let action_id = self.next_action_id();
        self.next_id = action_id.next();
        self.append(TransactionAction { action_id, action });
        action_id
    }

    pub fn next_action_id(&self) -> ActionId {
        let mut candidate = self.next_id;
        while self.ids.contains(&candidate) {
            candidate = candidate.next();
        }
        candidate
    }

    pub fn len(&self) -> usize { self.actions.len() }

    pub fn is_empty(&self) -> bool { self.actions.is_empty() }

    /// Consume the batch, yielding its actions in append order if it is committable
    pub fn into_actions(self) -> Result<Vec<TransactionAction>, TransactionError> {
        if self.actions.is_empty() {
            return Err(TransactionError::Empty);
        }
        if let Some(error) = self.queued_errors.into_iter().next() {
            return Err(error);
        }
        Ok(self.actions)
    }
}

/// `action id -> placeholder` for every node create in the batch. Creates without a
/// placeholder are tracked too, with nothing to publish.
pub(crate) fn pending_creates(actions: &[TransactionAction]) -> PendingCreates {
    actions
        .iter()
        .filter(|a| matches!(a.action, Action::NodeCreate(_)))
        .map(|a| (a.action_id, a.action.placeholder().map(str::to_owned)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinet_proto::{Node, ReadCheckRequest};

    fn create(placeholder: &str) -> Action { Action::NodeCreate(Node::new(1, placeholder)) }

    #[test]
    fn auto_ids_start_at_one_and_skip_taken() {
        let mut batch = ActionBatch::new();
        assert_eq!(batch.append_auto(create("tmp:1")), ActionId(1));
        batch.append(TransactionAction::new(2, create("tmp:2")));
        batch.append(TransactionAction::new(3, create("tmp:3")));
        assert_eq!(batch.next_action_id(), ActionId(4));
        assert_eq!(batch.append_auto(create("tmp:4")), ActionId(4));
        assert_eq!(batch.len(), 4);
        assert!(batch.into_actions().is_ok());
    }

    #[test]
    fn duplicate_is_queued_not_appended() {
        let mut batch = ActionBatch::new();
        batch.append(TransactionAction::new(1, create("tmp:1")));
        batch.append(TransactionAction::new(1, Action::ReadCheck(ReadCheckRequest::exists("n/1/x"))));
        assert_eq!(batch.len(), 1);
        assert!(matches!(batch.into_actions(), Err(TransactionError::DuplicateAction(ActionId(1)))));
    }

    #[test]
    fn empty_wins_over_everything() {
        assert!(matches!(ActionBatch::new().into_actions(), Err(TransactionError::Empty)));
    }

    #[test]
    fn pending_creates_tracks_every_node_create() {
        let actions = vec![
            TransactionAction::new(1, create("tmp:1")),
            TransactionAction::new(2, create("")),
            TransactionAction::new(3, Action::NodeUpdate(Node::new(1, "tmp:1"))),
        ];
        let pending = pending_creates(&actions);
        assert_eq!(pending.len(), 2);
        assert_eq!(pending.get(&ActionId(1)), Some(&Some("tmp:1".to_string())));
        assert_eq!(pending.get(&ActionId(2)), Some(&None));
        assert!(!pending.contains_key(&ActionId(3)));
    }
}
