use std::collections::HashMap;

use cabinet_proto::ActionId;

use crate::error::TransactionError;

/// Placeholder id -> permanent id, for every node created by a committed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap(HashMap<String, String>);

impl IdMap {
    pub fn resolve(&self, placeholder: &str) -> Option<&str> { self.0.get(placeholder).map(String::as_str) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> { self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    pub fn into_inner(self) -> HashMap<String, String> { self.0 }
}

impl std::ops::Index<&str> for IdMap {
    type Output = str;

    fn index(&self, placeholder: &str) -> &str {
        match self.resolve(placeholder) {
            Some(id) => id,
            None => panic!("placeholder {placeholder:?} is not resolved"),
        }
    }
}

/// `action id -> placeholder` for the node creates of one batch that are still unanswered
pub(crate) type PendingCreates = HashMap<ActionId, Option<String>>;

/// Turns create responses into placeholder mappings. Owned by the response reader for the
/// duration of a commit.
#[derive(Debug)]
pub(crate) struct IdResolver {
    pending: PendingCreates,
    ids: IdMap,
}

impl IdResolver {
    pub fn new(pending: PendingCreates) -> Self { Self { pending, ids: IdMap::default() } }

    /// Accept the answer to a node create of this batch. Each create is answered once.
    pub fn record(&mut self, action_id: ActionId, permanent_id: &str) -> Result<(), TransactionError> {
        match self.pending.remove(&action_id) {
            Some(Some(placeholder)) => {
                self.ids.0.insert(placeholder, permanent_id.to_owned());
                Ok(())
            }
            Some(None) => Ok(()),
            None => Err(TransactionError::UnexpectedCreate(action_id)),
        }
    }

    /// Placeholders whose create was never answered
    pub fn unresolved(&self) -> Vec<String> {
        let mut unresolved: Vec<String> = self.pending.values().flatten().cloned().collect();
        unresolved.sort();
        unresolved
    }

    pub fn finish(self) -> IdMap { self.ids }
}
